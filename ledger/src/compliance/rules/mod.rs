//! The rule modules shipped with the engine.
//!
//! Each is an independently configurable policy implementing
//! [`RuleModule`](super::RuleModule). Issuers compose them in whatever
//! order their regulatory posture demands; evaluation order is
//! registration order.

mod country;
mod max_balance;
mod transfer_limit;

pub use country::CountryRestrictionRule;
pub use max_balance::MaxBalanceRule;
pub use transfer_limit::TransferLimitRule;
