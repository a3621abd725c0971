//! # Capability Classes
//!
//! Every administrative and holder-facing operation is expected to be
//! gated by an external capability check: roles, tokens, signatures,
//! whatever the hosting system uses. The core does not check anything
//! itself; it only declares, per operation, which capability class a
//! caller must hold. [`required_capability`] is that declaration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The capability classes recognized by the ledger surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// The registry owner: configures the compliance posture.
    Owner,
    /// An operational agent of the issuer: identity administration,
    /// supply and freeze operations, snapshots, dividend deposits.
    Agent,
    /// An ordinary holder: moves their own units and claims dividends.
    Holder,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Owner => write!(f, "Owner"),
            Capability::Agent => write!(f, "Agent"),
            Capability::Holder => write!(f, "Holder"),
        }
    }
}

impl Capability {
    /// Whether a caller holding `self` satisfies a requirement of `required`.
    ///
    /// Capabilities are ordered: Owner ⊇ Agent ⊇ Holder. An owner can do
    /// anything an agent can; an agent can do anything a holder can.
    pub fn satisfies(&self, required: Capability) -> bool {
        self.rank() >= required.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            Capability::Holder => 0,
            Capability::Agent => 1,
            Capability::Owner => 2,
        }
    }

    /// Parses a capability name, case-insensitively.
    pub fn parse(s: &str) -> Option<Capability> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Some(Capability::Owner),
            "agent" => Some(Capability::Agent),
            "holder" => Some(Capability::Holder),
            _ => None,
        }
    }
}

/// Every externally invocable operation of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    // Identity administration.
    RegisterIdentity,
    RemoveIdentity,
    RefreshVerification,
    UpdateJurisdiction,
    // Compliance administration.
    InstallCompliance,
    AddModule,
    RemoveModule,
    ConfigureModule,
    // Ledger administration.
    Mint,
    Burn,
    Freeze,
    Unfreeze,
    SetAddressFrozen,
    Recover,
    Pause,
    Unpause,
    Snapshot,
    RegisterAsset,
    BurnAssetTokens,
    DepositDividend,
    // Holder-initiated.
    Transfer,
    TransferWithAsset,
    ClaimDividend,
    ClaimAllPending,
}

/// The capability class a caller must hold for `op`.
pub fn required_capability(op: Operation) -> Capability {
    use Operation::*;
    match op {
        InstallCompliance | AddModule | RemoveModule | ConfigureModule => Capability::Owner,

        RegisterIdentity | RemoveIdentity | RefreshVerification | UpdateJurisdiction | Mint
        | Burn | Freeze | Unfreeze | SetAddressFrozen | Recover | Pause | Unpause | Snapshot
        | RegisterAsset | BurnAssetTokens | DepositDividend => Capability::Agent,

        Transfer | TransferWithAsset | ClaimDividend | ClaimAllPending => Capability::Holder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_administration_needs_owner() {
        assert_eq!(required_capability(Operation::AddModule), Capability::Owner);
        assert_eq!(
            required_capability(Operation::ConfigureModule),
            Capability::Owner
        );
    }

    #[test]
    fn supply_operations_need_agent() {
        assert_eq!(required_capability(Operation::Mint), Capability::Agent);
        assert_eq!(required_capability(Operation::Recover), Capability::Agent);
        assert_eq!(
            required_capability(Operation::DepositDividend),
            Capability::Agent
        );
    }

    #[test]
    fn value_movement_needs_only_holder() {
        assert_eq!(required_capability(Operation::Transfer), Capability::Holder);
        assert_eq!(
            required_capability(Operation::ClaimDividend),
            Capability::Holder
        );
    }

    #[test]
    fn capability_ordering() {
        assert!(Capability::Owner.satisfies(Capability::Holder));
        assert!(Capability::Agent.satisfies(Capability::Holder));
        assert!(!Capability::Holder.satisfies(Capability::Agent));
        assert!(!Capability::Agent.satisfies(Capability::Owner));
        assert!(Capability::Agent.satisfies(Capability::Agent));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Capability::parse("AGENT"), Some(Capability::Agent));
        assert_eq!(Capability::parse("owner"), Some(Capability::Owner));
        assert_eq!(Capability::parse("visitor"), None);
    }
}
