//! Cumulative claim accounting.
//!
//! The ledger maps each recipient to the cumulative amount already paid
//! out. An absent entry reads as zero. Entries only ever move upward
//! through the public surface; [`ClaimLedger::revert`] exists solely so
//! the controller can unwind a recorded claim whose payout transfer
//! failed, keeping claims all-or-nothing.

use std::collections::HashMap;

use spillway_core::types::Address;

use crate::error::LedgerError;

/// Outcome of recording a claim against the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimRecord {
    /// Cumulative figure before this claim (0 for a first claim).
    pub previous: u64,
    /// Amount this claim pays out: `new cumulative - previous`.
    pub delta: u64,
}

/// Per-recipient cumulative payout ledger.
#[derive(Clone, Debug, Default)]
pub struct ClaimLedger {
    claimed: HashMap<Address, u64>,
    total_disbursed: u128,
}

impl ClaimLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative amount already paid to a recipient (0 if never paid).
    pub fn claimed(&self, recipient: &Address) -> u64 {
        self.claimed.get(recipient).copied().unwrap_or(0)
    }

    /// Record a claim, advancing the recipient's cumulative figure.
    ///
    /// Fails with [`LedgerError::NothingToClaim`] unless `cumulative`
    /// strictly exceeds the current figure, so the returned delta is
    /// always positive. The delta is counted into [`total_disbursed`]
    /// immediately; a caller whose payout fails afterwards must call
    /// [`revert`] with the returned record.
    ///
    /// [`total_disbursed`]: Self::total_disbursed
    /// [`revert`]: Self::revert
    pub fn record_claim(
        &mut self,
        recipient: Address,
        cumulative: u64,
    ) -> Result<ClaimRecord, LedgerError> {
        let previous = self.claimed(&recipient);
        if cumulative <= previous {
            return Err(LedgerError::NothingToClaim {
                recipient,
                claimed: previous,
                requested: cumulative,
            });
        }

        let delta = cumulative - previous;
        self.claimed.insert(recipient, cumulative);
        self.total_disbursed += u128::from(delta);

        Ok(ClaimRecord { previous, delta })
    }

    /// Restore the state prior to a recorded claim.
    ///
    /// Removes the entry entirely when the previous figure was zero, so a
    /// reverted first claim leaves the ledger exactly as it was.
    pub(crate) fn revert(&mut self, recipient: &Address, record: &ClaimRecord) {
        if record.previous == 0 {
            self.claimed.remove(recipient);
        } else {
            self.claimed.insert(*recipient, record.previous);
        }
        self.total_disbursed -= u128::from(record.delta);
    }

    /// Sum of every delta paid out, across all recipients and epochs.
    pub fn total_disbursed(&self) -> u128 {
        self.total_disbursed
    }

    /// Number of recipients with a nonzero cumulative figure.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Whether no recipient has ever been paid.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Iterate over `(recipient, cumulative)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.claimed.iter().map(|(addr, &amount)| (*addr, amount))
    }
}
