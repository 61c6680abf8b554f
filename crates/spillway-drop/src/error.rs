//! Error types for the distribution engine.
use thiserror::Error;

use spillway_core::types::{Address, Hash256};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("nothing to claim for {recipient}: requested {requested} <= claimed {claimed}")] NothingToClaim { recipient: Address, claimed: u64, requested: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("supply overflow")] Overflow,
}

/// Failure taxonomy of the distribution controller.
///
/// Hosts and relaying clients branch on these variants, so component
/// errors are flattened into this enum rather than nested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    #[error("invalid proof for {recipient}")] InvalidProof { recipient: Address },
    #[error("nothing to claim for {recipient}: requested {requested} <= claimed {claimed}")] NothingToClaim { recipient: Address, claimed: u64, requested: u64 },
    #[error("unauthorized caller: {caller}")] Unauthorized { caller: Address },
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("root mismatch: current {current}, supplied {supplied}")] RootMismatch { current: Hash256, supplied: Hash256 },
    #[error("no merkle root set")] RootNotSet,
    #[error("arithmetic overflow")] Overflow,
}

impl From<LedgerError> for DropError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NothingToClaim {
                recipient,
                claimed,
                requested,
            } => DropError::NothingToClaim {
                recipient,
                claimed,
                requested,
            },
        }
    }
}

impl From<TokenError> for DropError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance { have, need } => {
                DropError::InsufficientBalance { have, need }
            }
            TokenError::Overflow => DropError::Overflow,
        }
    }
}
