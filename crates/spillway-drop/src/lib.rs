//! # spillway-drop — cumulative Merkle-drop distribution engine.
//!
//! Distributes a fungible asset to recipients committed under a Merkle
//! root. Claims present `(recipient, cumulative amount, root, proof)`;
//! the controller verifies membership, pays out the delta between the
//! proven cumulative entitlement and what was already received, and
//! records the new figure. Replacing the root starts a new epoch without
//! resetting the ledger, so one instance serves many rounds.
//!
//! # Modules
//!
//! - [`error`] — `DropError` taxonomy plus component errors
//! - [`ledger`] — cumulative per-recipient claim accounting
//! - [`token`] — `TokenStore` custody seam and in-memory implementation
//! - [`config`] — root acceptance policy
//! - [`event`] — typed notifications drained by the host
//! - [`controller`] — the `DropController` state machine

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod ledger;
pub mod token;

// Re-exports for convenient access
pub use config::{DropConfig, RootPolicy};
pub use controller::{ClaimReceipt, DropController, RootUpdate, Withdrawal};
pub use error::{DropError, LedgerError, TokenError};
pub use event::DropEvent;
pub use ledger::{ClaimLedger, ClaimRecord};
pub use token::{MemoryTokenStore, TokenStore};
