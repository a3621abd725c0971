//! # HTTP Admin/Observation API
//!
//! Builds the axum router exposing one in-process [`Ledger`] for
//! administration and observation. All handlers share state through
//! axum's `State` extractor; the ledger sits behind a `parking_lot`
//! read-write lock and every operation holds it only for the synchronous
//! call, which makes the lock the serial arbiter the core expects.
//!
//! ## Endpoints
//!
//! | Method | Path                                   | Capability | Description                    |
//! |--------|----------------------------------------|------------|--------------------------------|
//! | GET    | `/health`                              | —          | Liveness probe                 |
//! | GET    | `/status`                              | —          | Registry status summary        |
//! | GET    | `/supply`                              | —          | Current total supply           |
//! | GET    | `/supply/at/:snapshot`                 | —          | Supply at a past snapshot      |
//! | GET    | `/holders/:address`                    | —          | Holder balances and attributes |
//! | GET    | `/holders/:address/balance-at/:snapshot` | —        | Balance at a past snapshot     |
//! | POST   | `/identity/register`                   | Agent      | Register a verified holder     |
//! | POST   | `/identity/remove`                     | Agent      | Permanently remove a holder    |
//! | POST   | `/ledger/mint`                         | Agent      | Create units                   |
//! | POST   | `/ledger/burn`                         | Agent      | Destroy units                  |
//! | POST   | `/ledger/transfer`                     | Holder     | Move units                     |
//! | POST   | `/ledger/freeze`                       | Agent      | Freeze part of a balance       |
//! | POST   | `/ledger/unfreeze`                     | Agent      | Release a frozen amount        |
//! | POST   | `/ledger/pause`                        | Agent      | Raise the global pause flag    |
//! | POST   | `/ledger/unpause`                      | Agent      | Clear the global pause flag    |
//! | POST   | `/snapshots`                           | Agent      | Take a snapshot                |
//! | POST   | `/dividends`                           | Agent      | Deposit a dividend             |
//! | POST   | `/dividends/:id/claim`                 | Holder     | Claim a pro-rata share         |
//!
//! Mutating endpoints read the caller's capability class from the
//! `x-veris-capability` header. The header is trusted: authentication is
//! an external collaborator's concern, the node only maps operations to
//! the capability the core declares for them.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use veris_ledger::authz::{required_capability, Capability, Operation};
use veris_ledger::dividend::{DividendId, RecordingSink};
use veris_ledger::identity::IdentityError;
use veris_ledger::snapshot::SnapshotId;
use veris_ledger::{Ledger, LedgerError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Deployment label (e.g., "sandbox", "production").
    pub network: String,
    /// When the node started, for uptime reporting.
    pub started_at: DateTime<Utc>,
    /// The single ledger this node hosts.
    pub ledger: Arc<RwLock<Ledger>>,
    /// Where claimed dividends land. An in-memory treasury; a production
    /// deployment would swap in a payment-rail sink.
    pub treasury: Arc<RwLock<RecordingSink>>,
    /// Prometheus handles for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/supply", get(supply_handler))
        .route("/supply/at/:snapshot", get(supply_at_handler))
        .route("/holders/:address", get(holder_handler))
        .route(
            "/holders/:address/balance-at/:snapshot",
            get(balance_at_handler),
        )
        .route("/identity/register", post(register_identity_handler))
        .route("/identity/remove", post(remove_identity_handler))
        .route("/ledger/mint", post(mint_handler))
        .route("/ledger/burn", post(burn_handler))
        .route("/ledger/transfer", post(transfer_handler))
        .route("/ledger/freeze", post(freeze_handler))
        .route("/ledger/unfreeze", post(unfreeze_handler))
        .route("/ledger/pause", post(pause_handler))
        .route("/ledger/unpause", post(unpause_handler))
        .route("/snapshots", post(snapshot_handler))
        .route("/dividends", post(deposit_dividend_handler))
        .route("/dividends/:id/claim", post(claim_dividend_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An HTTP-mapped failure. Conversions from the core's typed errors pick
/// the status; the typed message rides along verbatim.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::IdentityNotVerified(_)
            | LedgerError::AddressFrozen(_)
            | LedgerError::ComplianceRejected { .. }
            | LedgerError::Unauthorized(_) => StatusCode::FORBIDDEN,

            LedgerError::InvalidSnapshotId { .. }
            | LedgerError::InvalidDividendId(_)
            | LedgerError::UnknownAsset(_) => StatusCode::NOT_FOUND,

            LedgerError::Paused
            | LedgerError::AlreadyRegistered(_)
            | LedgerError::AlreadyBound
            | LedgerError::AlreadyClaimed { .. } => StatusCode::CONFLICT,

            LedgerError::InsufficientUnfrozenBalance { .. }
            | LedgerError::InsufficientFrozenBalance { .. }
            | LedgerError::InsufficientAssetCapacity { .. }
            | LedgerError::ExceedsMaxSupply { .. }
            | LedgerError::BelowMinimumAcceptable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let status = match &err {
            IdentityError::AlreadyRegistered(_) | IdentityError::PermanentlyRemoved(_) => {
                StatusCode::CONFLICT
            }
            IdentityError::NotRegistered(_) => StatusCode::NOT_FOUND,
        };
        ApiError::new(status, err.to_string())
    }
}

/// Checks the `x-veris-capability` header against the capability class the
/// core declares for `op`.
fn authorize(headers: &HeaderMap, op: Operation) -> Result<(), ApiError> {
    let required = required_capability(op);
    let presented = headers
        .get("x-veris-capability")
        .and_then(|v| v.to_str().ok())
        .and_then(Capability::parse);

    match presented {
        Some(capability) if capability.satisfies(required) => Ok(()),
        _ => Err(LedgerError::Unauthorized(required.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Deployment label.
    pub network: String,
    /// Whether the ledger is globally paused.
    pub paused: bool,
    /// Current total supply.
    pub total_supply: u64,
    /// Holders with a non-zero balance.
    pub active_holders: u64,
    /// Highest snapshot id issued (0 if none).
    pub current_snapshot: u64,
    /// Seconds since the node started.
    pub uptime_secs: i64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /holders/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HolderResponse {
    pub address: String,
    pub balance: u64,
    pub frozen: u64,
    pub available: u64,
    pub verified: bool,
    pub jurisdiction: Option<u16>,
    pub address_frozen: bool,
}

/// Body for `POST /identity/register`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub holder: String,
    pub jurisdiction: u16,
}

/// Body for `POST /identity/remove`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub holder: String,
}

/// Body for `POST /ledger/mint`, `/ledger/burn`, `/ledger/freeze`,
/// `/ledger/unfreeze`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AmountRequest {
    pub holder: String,
    pub amount: u64,
}

/// Body for `POST /ledger/transfer`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: u64,
}

/// Body for `POST /dividends`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: u64,
}

/// Body for `POST /dividends/:id/claim`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub holder: String,
    /// Claims below this share are refused. Defaults to 0.
    #[serde(default)]
    pub min_acceptable: u64,
}

/// Response for `POST /snapshots`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: u64,
}

/// Response for `POST /dividends`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub dividend_id: u64,
    pub snapshot_id: u64,
    pub amount: u64,
}

/// Response for `POST /dividends/:id/claim`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub dividend_id: u64,
    pub holder: String,
    pub paid: u64,
}

// ---------------------------------------------------------------------------
// Handlers — observation
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe for orchestrators. Intentionally does
/// not inspect ledger state; that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — registry status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.read();
    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        paused: ledger.is_paused(),
        total_supply: ledger.total_supply(),
        active_holders: ledger.active_holder_count() as u64,
        current_snapshot: ledger.current_snapshot(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /supply` — current total supply.
async fn supply_handler(State(state): State<AppState>) -> impl IntoResponse {
    let supply = state.ledger.read().total_supply();
    Json(serde_json::json!({ "total_supply": supply }))
}

/// `GET /supply/at/:snapshot` — total supply at a past snapshot.
async fn supply_at_handler(
    State(state): State<AppState>,
    Path(snapshot): Path<SnapshotId>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = state.ledger.read().total_supply_at(snapshot)?;
    Ok(Json(serde_json::json!({
        "snapshot_id": snapshot,
        "total_supply": supply,
    })))
}

/// `GET /holders/:address` — balances and identity attributes. Unknown
/// addresses report zeroed balances and `verified: false` rather than 404,
/// matching the ledger's implicit-zero balance semantics.
async fn holder_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let ledger = state.ledger.read();
    let resp = HolderResponse {
        balance: ledger.balance_of(&address),
        frozen: ledger.frozen_of(&address),
        available: ledger.available_of(&address),
        verified: ledger.identity().is_verified(&address),
        jurisdiction: ledger.identity().jurisdiction_of(&address),
        address_frozen: ledger.is_address_frozen(&address),
        address,
    };
    Json(resp)
}

/// `GET /holders/:address/balance-at/:snapshot` — historical balance.
async fn balance_at_handler(
    State(state): State<AppState>,
    Path((address, snapshot)): Path<(String, SnapshotId)>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.ledger.read().balance_of_at(&address, snapshot)?;
    Ok(Json(serde_json::json!({
        "address": address,
        "snapshot_id": snapshot,
        "balance": balance,
    })))
}

// ---------------------------------------------------------------------------
// Handlers — identity administration
// ---------------------------------------------------------------------------

/// `POST /identity/register` — register a verified holder.
async fn register_identity_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::RegisterIdentity)?;
    state
        .ledger
        .write()
        .identity_mut()
        .register(&req.holder, req.jurisdiction)?;
    state.metrics.operations_total.inc();
    Ok(StatusCode::CREATED)
}

/// `POST /identity/remove` — permanently remove a holder.
async fn remove_identity_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RemoveRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::RemoveIdentity)?;
    state.ledger.write().identity_mut().remove(&req.holder)?;
    state.metrics.operations_total.inc();
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Handlers — ledger operations
// ---------------------------------------------------------------------------

/// Runs one mutating ledger operation under the write lock, recording
/// latency and outcome metrics.
fn run_ledger_op<T>(
    state: &AppState,
    op: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
) -> Result<T, ApiError> {
    let timer = state.metrics.operation_latency_seconds.start_timer();
    let mut ledger = state.ledger.write();
    let result = op(&mut ledger);
    timer.observe_duration();

    match result {
        Ok(value) => {
            state.metrics.operations_total.inc();
            state.metrics.total_supply.set(ledger.total_supply() as i64);
            state
                .metrics
                .active_holders
                .set(ledger.active_holder_count() as i64);
            Ok(value)
        }
        Err(err) => {
            state.metrics.operations_rejected_total.inc();
            Err(err.into())
        }
    }
}

/// `POST /ledger/mint` — create units at a holder.
async fn mint_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Mint)?;
    run_ledger_op(&state, |l| l.mint(&req.holder, req.amount))?;
    Ok(StatusCode::OK)
}

/// `POST /ledger/burn` — destroy units at a holder.
async fn burn_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Burn)?;
    run_ledger_op(&state, |l| l.burn(&req.holder, req.amount))?;
    Ok(StatusCode::OK)
}

/// `POST /ledger/transfer` — move units between holders.
async fn transfer_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Transfer)?;
    run_ledger_op(&state, |l| l.transfer(&req.from, &req.to, req.amount))?;
    Ok(StatusCode::OK)
}

/// `POST /ledger/freeze` — freeze part of a holder's balance.
async fn freeze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Freeze)?;
    run_ledger_op(&state, |l| l.freeze(&req.holder, req.amount))?;
    Ok(StatusCode::OK)
}

/// `POST /ledger/unfreeze` — release a frozen amount.
async fn unfreeze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Unfreeze)?;
    run_ledger_op(&state, |l| l.unfreeze(&req.holder, req.amount))?;
    Ok(StatusCode::OK)
}

/// `POST /ledger/pause` — raise the global pause flag.
async fn pause_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Pause)?;
    state.ledger.write().pause();
    state.metrics.operations_total.inc();
    Ok(StatusCode::OK)
}

/// `POST /ledger/unpause` — clear the global pause flag.
async fn unpause_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Operation::Unpause)?;
    state.ledger.write().unpause();
    state.metrics.operations_total.inc();
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Handlers — snapshots & dividends
// ---------------------------------------------------------------------------

/// `POST /snapshots` — take a snapshot, returning its id.
async fn snapshot_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&headers, Operation::Snapshot)?;
    let snapshot_id = state.ledger.write().snapshot();
    state.metrics.snapshots_total.inc();
    Ok(Json(SnapshotResponse { snapshot_id }))
}

/// `POST /dividends` — deposit a dividend pinned to a fresh snapshot.
async fn deposit_dividend_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&headers, Operation::DepositDividend)?;
    let mut ledger = state.ledger.write();
    let dividend_id = ledger.deposit_dividend(req.amount);
    let snapshot_id = ledger.current_snapshot();
    drop(ledger);

    state.metrics.dividends_deposited_total.inc();
    state.metrics.snapshots_total.inc();
    Ok(Json(DepositResponse {
        dividend_id,
        snapshot_id,
        amount: req.amount,
    }))
}

/// `POST /dividends/:id/claim` — claim a holder's pro-rata share into the
/// node's treasury sink.
async fn claim_dividend_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(dividend_id): Path<DividendId>,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&headers, Operation::ClaimDividend)?;

    let mut treasury = state.treasury.write();
    let paid = state.ledger.write().claim_dividend(
        &req.holder,
        dividend_id,
        req.min_acceptable,
        &mut *treasury,
    )?;
    state.metrics.operations_total.inc();

    Ok(Json(ClaimResponse {
        dividend_id,
        holder: req.holder,
        paid,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
