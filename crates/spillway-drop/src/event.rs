//! Typed notifications emitted by the controller.
//!
//! Events append to an internal buffer on successful state transitions
//! only; a rejected operation emits nothing. Hosts drain the buffer with
//! [`DropController::take_events`] after each serialized operation and
//! forward the entries to their own indexing or notification machinery.
//!
//! [`DropController::take_events`]: crate::controller::DropController::take_events

use serde::{Deserialize, Serialize};

use spillway_core::types::{Address, Hash256};

/// A successful state transition observed by the host.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropEvent {
    /// The committed root was replaced; a new epoch began.
    RootUpdated {
        /// Root before the update; `None` for the first installation.
        previous: Option<Hash256>,
        /// Newly committed root.
        root: Hash256,
        /// Epoch that the new root opens.
        epoch: u64,
    },
    /// A claim was verified and paid.
    Claimed {
        /// Recipient the payout landed on.
        recipient: Address,
        /// Amount actually transferred by this claim.
        delta: u64,
        /// Cumulative figure the recipient now stands at.
        cumulative: u64,
        /// Epoch during which the claim was paid.
        epoch: u64,
    },
    /// The owner withdrew held assets outside the claim flow.
    Withdrawn {
        /// Asset withdrawn (not necessarily the distributed one).
        asset: Address,
        /// Destination of the withdrawal (the owner).
        to: Address,
        /// Amount withdrawn.
        amount: u64,
    },
}
