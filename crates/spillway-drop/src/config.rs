//! Engine configuration.
//!
//! Provides [`DropConfig`] with the root acceptance policy. The default
//! preserves the reference behavior: claims verify against whichever
//! root the caller supplies.

use serde::{Deserialize, Serialize};

/// Which roots a claim may verify against.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootPolicy {
    /// Accept any root the supplied proof verifies against, including
    /// superseded ones. Claims prepared against an old root stay
    /// redeemable across a migration; payouts remain bounded by the
    /// vault balance and the monotonic ledger.
    AnyProvenRoot,
    /// Require the supplied root to equal the controller's current root.
    /// For operators who fund the vault per epoch and want stale claims
    /// rejected outright.
    CurrentOnly,
}

/// Configuration for a distribution controller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropConfig {
    /// Root acceptance policy applied to claims.
    pub root_policy: RootPolicy,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            root_policy: RootPolicy::AnyProvenRoot,
        }
    }
}
