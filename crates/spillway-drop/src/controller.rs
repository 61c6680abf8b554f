//! The distribution controller: root management, claims, withdrawals.
//!
//! [`DropController`] composes the commitment verifier, the claim ledger,
//! and the host's token store. It starts `Uninitialized` (no root); the
//! first [`set_merkle_root`] makes it active and every replacement after
//! that opens a new epoch while the ledger carries over untouched.
//!
//! Each operation is a single all-or-nothing unit under the host's
//! serialization: the one multi-step mutation (claim = ledger write +
//! transfer) reverts the ledger write when the transfer fails, so a
//! failed operation leaves no observable change.
//!
//! [`set_merkle_root`]: DropController::set_merkle_root

use std::marker::PhantomData;

use tracing::{debug, info};

use spillway_core::commitment::{leaf_hash, verify_proof, DropHasher, Sha256Hasher};
use spillway_core::types::{Address, Hash256};

use crate::config::{DropConfig, RootPolicy};
use crate::error::DropError;
use crate::event::DropEvent;
use crate::ledger::ClaimLedger;
use crate::token::TokenStore;

/// Result of a successful root replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootUpdate {
    /// Root before the update; `None` for the first installation.
    pub previous: Option<Hash256>,
    /// Newly committed root.
    pub root: Hash256,
    /// Epoch the new root opens.
    pub epoch: u64,
}

/// Result of a successful claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Recipient the payout landed on.
    pub recipient: Address,
    /// Amount transferred by this claim.
    pub delta: u64,
    /// Cumulative figure the recipient now stands at.
    pub cumulative: u64,
    /// Epoch during which the claim was paid.
    pub epoch: u64,
}

/// Result of a successful admin withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    /// Asset withdrawn.
    pub asset: Address,
    /// Destination (the owner).
    pub to: Address,
    /// Amount withdrawn.
    pub amount: u64,
}

/// Cumulative Merkle-drop distribution controller.
///
/// Generic over the host's [`TokenStore`] and the commitment hash
/// function; the default hasher is SHA-256.
#[derive(Debug)]
pub struct DropController<S, H = Sha256Hasher> {
    config: DropConfig,
    owner: Address,
    vault: Address,
    asset: Address,
    root: Option<Hash256>,
    epoch: u64,
    ledger: ClaimLedger,
    store: S,
    events: Vec<DropEvent>,
    _hasher: PhantomData<H>,
}

impl<S: TokenStore, H: DropHasher> DropController<S, H> {
    /// Create an uninitialized controller.
    ///
    /// - `owner` — administrative principal for guarded operations,
    /// - `vault` — address whose balances back payouts and withdrawals,
    /// - `asset` — the distributed token's identity.
    ///
    /// The caller identity passed to guarded operations is assumed to be
    /// authenticated by the host; the controller only compares it.
    pub fn new(owner: Address, vault: Address, asset: Address, store: S, config: DropConfig) -> Self {
        Self {
            config,
            owner,
            vault,
            asset,
            root: None,
            epoch: 0,
            ledger: ClaimLedger::new(),
            store,
            events: Vec::new(),
            _hasher: PhantomData,
        }
    }

    /// Replace the committed root, opening a new epoch.
    ///
    /// Owner only. The new root is accepted unconditionally: no shape
    /// validation, the zero digest and the current root included.
    /// Accounting stays correct across replacements only because the
    /// off-line builder re-encodes each recipient's new *total*
    /// cumulative entitlement; the ledger is deliberately untouched here.
    pub fn set_merkle_root(
        &mut self,
        caller: Address,
        new_root: Hash256,
    ) -> Result<RootUpdate, DropError> {
        self.ensure_owner(caller)?;

        let previous = self.root.replace(new_root);
        self.epoch += 1;
        self.events.push(DropEvent::RootUpdated {
            previous,
            root: new_root,
            epoch: self.epoch,
        });
        info!(root = %new_root, epoch = self.epoch, "merkle root updated");

        Ok(RootUpdate {
            previous,
            root: new_root,
            epoch: self.epoch,
        })
    }

    /// Verify a claim and pay out the unclaimed delta.
    ///
    /// Permissionless: there is no caller argument, and the payout always
    /// lands on `recipient`, so relaying someone else's claim is
    /// harmless. `cumulative_amount` is caller-supplied and trusted only
    /// after the proof binds it, together with `recipient`, to `root`.
    ///
    /// Which roots are acceptable is a [`RootPolicy`] decision; under the
    /// default policy the supplied root is taken as-is and the stored
    /// root is not consulted.
    ///
    /// Fails with:
    /// - [`DropError::InvalidProof`] — proof does not verify,
    /// - [`DropError::RootNotSet`] / [`DropError::RootMismatch`] — root
    ///   rejected under [`RootPolicy::CurrentOnly`],
    /// - [`DropError::NothingToClaim`] — the proven cumulative does not
    ///   exceed what was already paid,
    /// - [`DropError::InsufficientBalance`] — the vault cannot cover the
    ///   delta; the ledger write is reverted and no state changes.
    pub fn claim(
        &mut self,
        recipient: Address,
        cumulative_amount: u64,
        root: Hash256,
        proof: &[Hash256],
    ) -> Result<ClaimReceipt, DropError> {
        let leaf = leaf_hash::<H>(&recipient, cumulative_amount);
        if !verify_proof::<H>(&leaf, proof, &root) {
            debug!(recipient = %recipient, "rejected claim: invalid proof");
            return Err(DropError::InvalidProof { recipient });
        }

        if self.config.root_policy == RootPolicy::CurrentOnly {
            match self.root {
                None => {
                    debug!(recipient = %recipient, "rejected claim: no root set");
                    return Err(DropError::RootNotSet);
                }
                Some(current) if current != root => {
                    debug!(recipient = %recipient, supplied = %root, "rejected claim: root mismatch");
                    return Err(DropError::RootMismatch {
                        current,
                        supplied: root,
                    });
                }
                Some(_) => {}
            }
        }

        let record = match self.ledger.record_claim(recipient, cumulative_amount) {
            Ok(record) => record,
            Err(err) => {
                debug!(recipient = %recipient, cumulative = cumulative_amount, "rejected claim: nothing to claim");
                return Err(err.into());
            }
        };

        if let Err(err) = self
            .store
            .transfer(&self.asset, &self.vault, &recipient, record.delta)
        {
            // All-or-nothing: unwind the ledger write from this claim.
            self.ledger.revert(&recipient, &record);
            debug!(recipient = %recipient, delta = record.delta, "claim payout failed, ledger reverted");
            return Err(err.into());
        }

        self.events.push(DropEvent::Claimed {
            recipient,
            delta: record.delta,
            cumulative: cumulative_amount,
            epoch: self.epoch,
        });
        info!(recipient = %recipient, delta = record.delta, cumulative = cumulative_amount, "claim paid");

        Ok(ClaimReceipt {
            recipient,
            delta: record.delta,
            cumulative: cumulative_amount,
            epoch: self.epoch,
        })
    }

    /// Withdraw held assets to the owner, outside the claim flow.
    ///
    /// Owner only. Works for any asset the vault holds, not just the
    /// distributed one, so mistakenly sent tokens and leftover funding
    /// are recoverable. Deliberately independent of the ledger: it can
    /// drain amounts recipients have not yet claimed, and it leaves
    /// every cumulative figure untouched.
    pub fn admin_withdraw(
        &mut self,
        caller: Address,
        asset: Address,
        amount: u64,
    ) -> Result<Withdrawal, DropError> {
        self.ensure_owner(caller)?;

        self.store
            .transfer(&asset, &self.vault, &self.owner, amount)?;

        self.events.push(DropEvent::Withdrawn {
            asset,
            to: self.owner,
            amount,
        });
        info!(asset = %asset, amount, "admin withdrawal");

        Ok(Withdrawal {
            asset,
            to: self.owner,
            amount,
        })
    }

    /// Drain the pending event buffer.
    pub fn take_events(&mut self) -> Vec<DropEvent> {
        std::mem::take(&mut self.events)
    }

    /// Peek at pending events without draining them.
    pub fn pending_events(&self) -> &[DropEvent] {
        &self.events
    }

    /// The committed root, or `None` while uninitialized.
    pub fn current_root(&self) -> Option<Hash256> {
        self.root
    }

    /// Current epoch: 0 while uninitialized, then one per installed root.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The administrative principal.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The address whose balances back payouts.
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// The distributed asset.
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// The active configuration.
    pub fn config(&self) -> &DropConfig {
        &self.config
    }

    /// Cumulative amount already paid to a recipient.
    pub fn claimed(&self, recipient: &Address) -> u64 {
        self.ledger.claimed(recipient)
    }

    /// Sum of every delta paid out across all epochs.
    pub fn total_disbursed(&self) -> u128 {
        self.ledger.total_disbursed()
    }

    /// Read access to the claim ledger.
    pub fn ledger(&self) -> &ClaimLedger {
        &self.ledger
    }

    /// Read access to the token store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the token store, e.g. for funding the vault.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), DropError> {
        if caller != self.owner {
            debug!(caller = %caller, "rejected: unauthorized caller");
            return Err(DropError::Unauthorized { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillway_core::tree::{Allocation, AllocationTree};

    use crate::error::TokenError;
    use crate::token::MemoryTokenStore;

    const OWNER: Address = Address([0x0A; 20]);
    const VAULT: Address = Address([0xFE; 20]);
    const ASSET: Address = Address([0xEE; 20]);

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    fn h(byte: u8) -> Hash256 {
        Hash256([byte; 32])
    }

    /// Allocation table with recipients addr(1), addr(2), ... in order.
    fn table(amounts: &[u64]) -> Vec<Allocation> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| Allocation {
                recipient: addr(i as u8 + 1),
                amount,
            })
            .collect()
    }

    /// Controller with a funded vault and an installed root.
    fn active_controller(
        amounts: &[u64],
        funding: u64,
    ) -> (DropController<MemoryTokenStore>, AllocationTree) {
        let tree = AllocationTree::from_allocations(table(amounts)).unwrap();
        let mut store = MemoryTokenStore::new();
        store.mint(&ASSET, &VAULT, funding).unwrap();

        let mut controller =
            DropController::new(OWNER, VAULT, ASSET, store, DropConfig::default());
        controller.set_merkle_root(OWNER, tree.root()).unwrap();
        (controller, tree)
    }

    /// Claim one recipient's row straight off the tree.
    fn claim_row(
        controller: &mut DropController<MemoryTokenStore>,
        tree: &AllocationTree,
        recipient: Address,
    ) -> Result<ClaimReceipt, DropError> {
        let amount = tree.amount_of(&recipient).unwrap();
        let proof = tree.proof_of(&recipient).unwrap();
        controller.claim(recipient, amount, tree.root(), &proof)
    }

    // --- construction ---

    #[test]
    fn new_controller_is_uninitialized() {
        let controller: DropController<MemoryTokenStore> = DropController::new(
            OWNER,
            VAULT,
            ASSET,
            MemoryTokenStore::new(),
            DropConfig::default(),
        );
        assert_eq!(controller.current_root(), None);
        assert_eq!(controller.epoch(), 0);
        assert_eq!(controller.owner(), OWNER);
        assert_eq!(controller.vault(), VAULT);
        assert_eq!(controller.asset(), ASSET);
        assert!(controller.ledger().is_empty());
        assert!(controller.pending_events().is_empty());
    }

    // --- set_merkle_root ---

    #[test]
    fn set_root_activates_and_bumps_epoch() {
        let mut controller: DropController<MemoryTokenStore> = DropController::new(
            OWNER,
            VAULT,
            ASSET,
            MemoryTokenStore::new(),
            DropConfig::default(),
        );

        let update = controller.set_merkle_root(OWNER, h(0x01)).unwrap();
        assert_eq!(update.previous, None);
        assert_eq!(update.root, h(0x01));
        assert_eq!(update.epoch, 1);
        assert_eq!(controller.current_root(), Some(h(0x01)));

        let update = controller.set_merkle_root(OWNER, h(0x02)).unwrap();
        assert_eq!(update.previous, Some(h(0x01)));
        assert_eq!(update.epoch, 2);
    }

    #[test]
    fn set_root_rejects_non_owner() {
        let (mut controller, _) = active_controller(&[10], 10);
        let before = controller.current_root();

        let err = controller.set_merkle_root(addr(0x99), h(0x42)).unwrap_err();
        assert_eq!(err, DropError::Unauthorized { caller: addr(0x99) });
        assert_eq!(controller.current_root(), before);
        assert_eq!(controller.epoch(), 1);
    }

    #[test]
    fn set_root_accepts_zero_and_repeat_roots() {
        let (mut controller, _) = active_controller(&[10], 10);
        controller.set_merkle_root(OWNER, Hash256::ZERO).unwrap();
        assert_eq!(controller.current_root(), Some(Hash256::ZERO));

        controller.set_merkle_root(OWNER, Hash256::ZERO).unwrap();
        assert_eq!(controller.epoch(), 3);
    }

    #[test]
    fn set_root_leaves_ledger_untouched() {
        let (mut controller, tree) = active_controller(&[10, 20], 100);
        claim_row(&mut controller, &tree, addr(1)).unwrap();
        claim_row(&mut controller, &tree, addr(2)).unwrap();

        controller.set_merkle_root(OWNER, h(0x55)).unwrap();
        assert_eq!(controller.claimed(&addr(1)), 10);
        assert_eq!(controller.claimed(&addr(2)), 20);
        assert_eq!(controller.total_disbursed(), 30);
    }

    // --- claim: verification ---

    #[test]
    fn claim_pays_the_allocated_amount() {
        let (mut controller, tree) = active_controller(&[10, 20, 30], 100);

        let receipt = claim_row(&mut controller, &tree, addr(2)).unwrap();
        assert_eq!(receipt.recipient, addr(2));
        assert_eq!(receipt.delta, 20);
        assert_eq!(receipt.cumulative, 20);
        assert_eq!(receipt.epoch, 1);

        assert_eq!(controller.store().balance_of(&ASSET, &addr(2)), 20);
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 80);
        assert_eq!(controller.claimed(&addr(2)), 20);
    }

    #[test]
    fn claim_rejects_wrong_amount() {
        let (mut controller, tree) = active_controller(&[10, 20], 100);
        let proof = tree.proof_of(&addr(1)).unwrap();

        // Proof is for amount 10; claiming 11 must not verify.
        let err = controller.claim(addr(1), 11, tree.root(), &proof).unwrap_err();
        assert_eq!(err, DropError::InvalidProof { recipient: addr(1) });
        assert_eq!(controller.claimed(&addr(1)), 0);
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 100);
    }

    #[test]
    fn claim_rejects_wrong_recipient_with_stolen_proof() {
        let (mut controller, tree) = active_controller(&[10, 20], 100);
        let proof = tree.proof_of(&addr(1)).unwrap();

        let err = controller.claim(addr(9), 10, tree.root(), &proof).unwrap_err();
        assert_eq!(err, DropError::InvalidProof { recipient: addr(9) });
    }

    #[test]
    fn claim_rejects_tampered_proof() {
        let (mut controller, tree) = active_controller(&[10, 20, 30, 40], 100);
        let mut proof = tree.proof_of(&addr(3)).unwrap();
        proof[0] = h(0xBA);

        let err = controller.claim(addr(3), 30, tree.root(), &proof).unwrap_err();
        assert_eq!(err, DropError::InvalidProof { recipient: addr(3) });
    }

    #[test]
    fn invalid_proof_takes_precedence_over_exhausted_ledger() {
        let (mut controller, tree) = active_controller(&[10], 100);
        claim_row(&mut controller, &tree, addr(1)).unwrap();

        // Re-claiming with a broken proof reports the proof failure, not
        // the ledger state.
        let err = controller
            .claim(addr(1), 10, tree.root(), &[h(0x01)])
            .unwrap_err();
        assert_eq!(err, DropError::InvalidProof { recipient: addr(1) });
    }

    #[test]
    fn single_row_table_claims_with_empty_proof() {
        let (mut controller, tree) = active_controller(&[77], 77);
        assert_eq!(tree.proof_of(&addr(1)).unwrap(), Vec::new());

        let receipt = claim_row(&mut controller, &tree, addr(1)).unwrap();
        assert_eq!(receipt.delta, 77);
    }

    // --- claim: accounting ---

    #[test]
    fn repeat_claim_is_rejected_and_moves_nothing() {
        let (mut controller, tree) = active_controller(&[10, 20], 100);
        claim_row(&mut controller, &tree, addr(1)).unwrap();
        let vault_after = controller.store().balance_of(&ASSET, &VAULT);

        let err = claim_row(&mut controller, &tree, addr(1)).unwrap_err();
        assert_eq!(
            err,
            DropError::NothingToClaim {
                recipient: addr(1),
                claimed: 10,
                requested: 10,
            }
        );
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), vault_after);
        assert_eq!(controller.store().balance_of(&ASSET, &addr(1)), 10);
    }

    #[test]
    fn raised_cumulative_pays_only_the_delta() {
        let (mut controller, tree) = active_controller(&[100], 1_000);
        claim_row(&mut controller, &tree, addr(1)).unwrap();

        let raised = AllocationTree::from_allocations(table(&[150])).unwrap();
        controller.set_merkle_root(OWNER, raised.root()).unwrap();

        let receipt = claim_row(&mut controller, &raised, addr(1)).unwrap();
        assert_eq!(receipt.delta, 50);
        assert_eq!(receipt.cumulative, 150);
        assert_eq!(controller.store().balance_of(&ASSET, &addr(1)), 150);
    }

    #[test]
    fn lower_cumulative_after_payout_is_nothing_to_claim() {
        let (mut controller, _) = active_controller(&[10], 100);

        // Pay the recipient 100 via a second table, then present the
        // original 10-row again: the ledger already stands higher.
        let raised = AllocationTree::from_allocations(table(&[100])).unwrap();
        controller.set_merkle_root(OWNER, raised.root()).unwrap();
        claim_row(&mut controller, &raised, addr(1)).unwrap();

        let original: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let proof = original.proof_of(&addr(1)).unwrap();
        let err = controller
            .claim(addr(1), 10, original.root(), &proof)
            .unwrap_err();
        assert_eq!(
            err,
            DropError::NothingToClaim {
                recipient: addr(1),
                claimed: 100,
                requested: 10,
            }
        );
    }

    // --- claim: atomicity ---

    #[test]
    fn underfunded_claim_reverts_the_ledger() {
        let (mut controller, tree) = active_controller(&[10, 50], 40);

        let err = claim_row(&mut controller, &tree, addr(2)).unwrap_err();
        assert_eq!(err, DropError::InsufficientBalance { have: 40, need: 50 });

        // No trace: ledger, totals, balances, and events all unchanged.
        assert_eq!(controller.claimed(&addr(2)), 0);
        assert_eq!(controller.total_disbursed(), 0);
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 40);
        assert_eq!(controller.store().balance_of(&ASSET, &addr(2)), 0);
        let events = controller.take_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, DropEvent::Claimed { .. })));
    }

    #[test]
    fn claim_succeeds_after_vault_refunded() {
        let (mut controller, tree) = active_controller(&[10, 50], 40);
        claim_row(&mut controller, &tree, addr(2)).unwrap_err();

        controller.store_mut().mint(&ASSET, &VAULT, 10).unwrap();
        let receipt = claim_row(&mut controller, &tree, addr(2)).unwrap();
        assert_eq!(receipt.delta, 50);
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 0);
    }

    /// Store whose transfers always fail, whatever the balances say.
    struct RefusingStore;

    impl TokenStore for RefusingStore {
        fn balance_of(&self, _asset: &Address, _holder: &Address) -> u64 {
            0
        }

        fn transfer(
            &mut self,
            _asset: &Address,
            _from: &Address,
            _to: &Address,
            amount: u64,
        ) -> Result<(), TokenError> {
            Err(TokenError::InsufficientBalance { have: 0, need: amount })
        }

        fn mint(&mut self, _asset: &Address, _to: &Address, _amount: u64) -> Result<(), TokenError> {
            Ok(())
        }
    }

    #[test]
    fn any_store_rejection_reverts_the_ledger() {
        let tree: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let mut controller: DropController<RefusingStore> =
            DropController::new(OWNER, VAULT, ASSET, RefusingStore, DropConfig::default());
        controller.set_merkle_root(OWNER, tree.root()).unwrap();

        let proof = tree.proof_of(&addr(1)).unwrap();
        let err = controller.claim(addr(1), 10, tree.root(), &proof).unwrap_err();
        assert_eq!(err, DropError::InsufficientBalance { have: 0, need: 10 });
        assert!(controller.ledger().is_empty());
        assert_eq!(controller.total_disbursed(), 0);
    }

    #[test]
    fn partial_revert_keeps_prior_figure() {
        let (mut controller, _) = active_controller(&[0], 100);

        let first = AllocationTree::from_allocations(table(&[60])).unwrap();
        controller.set_merkle_root(OWNER, first.root()).unwrap();
        claim_row(&mut controller, &first, addr(1)).unwrap();

        // Raised table asks for 60 more than the vault now holds.
        let raised = AllocationTree::from_allocations(table(&[160])).unwrap();
        controller.set_merkle_root(OWNER, raised.root()).unwrap();
        let err = claim_row(&mut controller, &raised, addr(1)).unwrap_err();
        assert_eq!(err, DropError::InsufficientBalance { have: 40, need: 100 });

        // The earlier cumulative figure survives the revert.
        assert_eq!(controller.claimed(&addr(1)), 60);
        assert_eq!(controller.total_disbursed(), 60);
    }

    // --- claim: root policy ---

    #[test]
    fn default_policy_ignores_the_stored_root() {
        let (mut controller, tree) = active_controller(&[10, 20], 100);

        // Replace the root; the old tree's proofs still resolve.
        controller.set_merkle_root(OWNER, h(0x99)).unwrap();
        let receipt = claim_row(&mut controller, &tree, addr(1)).unwrap();
        assert_eq!(receipt.delta, 10);
    }

    #[test]
    fn default_policy_claims_before_any_root() {
        let tree: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let mut store = MemoryTokenStore::new();
        store.mint(&ASSET, &VAULT, 10).unwrap();
        let mut controller: DropController<MemoryTokenStore> =
            DropController::new(OWNER, VAULT, ASSET, store, DropConfig::default());

        // Uninitialized controller, yet the supplied root verifies.
        let proof = tree.proof_of(&addr(1)).unwrap();
        let receipt = controller.claim(addr(1), 10, tree.root(), &proof).unwrap();
        assert_eq!(receipt.delta, 10);
        assert_eq!(receipt.epoch, 0);
    }

    #[test]
    fn strict_policy_rejects_stale_root() {
        let tree: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let mut store = MemoryTokenStore::new();
        store.mint(&ASSET, &VAULT, 10).unwrap();
        let config = DropConfig {
            root_policy: RootPolicy::CurrentOnly,
        };
        let mut controller: DropController<MemoryTokenStore> =
            DropController::new(OWNER, VAULT, ASSET, store, config);

        controller.set_merkle_root(OWNER, tree.root()).unwrap();
        controller.set_merkle_root(OWNER, h(0x77)).unwrap();

        let proof = tree.proof_of(&addr(1)).unwrap();
        let err = controller.claim(addr(1), 10, tree.root(), &proof).unwrap_err();
        assert_eq!(
            err,
            DropError::RootMismatch {
                current: h(0x77),
                supplied: tree.root(),
            }
        );
        assert_eq!(controller.claimed(&addr(1)), 0);
    }

    #[test]
    fn strict_policy_rejects_claims_before_any_root() {
        let tree: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let config = DropConfig {
            root_policy: RootPolicy::CurrentOnly,
        };
        let mut controller: DropController<MemoryTokenStore> =
            DropController::new(OWNER, VAULT, ASSET, MemoryTokenStore::new(), config);

        let proof = tree.proof_of(&addr(1)).unwrap();
        let err = controller.claim(addr(1), 10, tree.root(), &proof).unwrap_err();
        assert_eq!(err, DropError::RootNotSet);
    }

    #[test]
    fn strict_policy_accepts_the_current_root() {
        let tree: AllocationTree = AllocationTree::from_allocations(table(&[10])).unwrap();
        let mut store = MemoryTokenStore::new();
        store.mint(&ASSET, &VAULT, 10).unwrap();
        let config = DropConfig {
            root_policy: RootPolicy::CurrentOnly,
        };
        let mut controller: DropController<MemoryTokenStore> =
            DropController::new(OWNER, VAULT, ASSET, store, config);
        controller.set_merkle_root(OWNER, tree.root()).unwrap();

        let proof = tree.proof_of(&addr(1)).unwrap();
        let receipt = controller.claim(addr(1), 10, tree.root(), &proof).unwrap();
        assert_eq!(receipt.delta, 10);
    }

    #[test]
    fn strict_policy_checks_proof_before_root() {
        let config = DropConfig {
            root_policy: RootPolicy::CurrentOnly,
        };
        let mut controller: DropController<MemoryTokenStore> =
            DropController::new(OWNER, VAULT, ASSET, MemoryTokenStore::new(), config);

        // Garbage proof against a garbage root: the proof failure wins.
        let err = controller
            .claim(addr(1), 10, h(0x01), &[h(0x02)])
            .unwrap_err();
        assert_eq!(err, DropError::InvalidProof { recipient: addr(1) });
    }

    // --- admin_withdraw ---

    #[test]
    fn withdraw_moves_funds_to_owner() {
        let (mut controller, _) = active_controller(&[10], 100);

        let withdrawal = controller.admin_withdraw(OWNER, ASSET, 60).unwrap();
        assert_eq!(
            withdrawal,
            Withdrawal {
                asset: ASSET,
                to: OWNER,
                amount: 60,
            }
        );
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 40);
        assert_eq!(controller.store().balance_of(&ASSET, &OWNER), 60);
    }

    #[test]
    fn withdraw_rejects_non_owner() {
        let (mut controller, _) = active_controller(&[10], 100);

        let err = controller.admin_withdraw(addr(0x99), ASSET, 1).unwrap_err();
        assert_eq!(err, DropError::Unauthorized { caller: addr(0x99) });
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 100);
    }

    #[test]
    fn withdraw_beyond_balance_fails_cleanly() {
        let (mut controller, _) = active_controller(&[10], 100);

        let err = controller.admin_withdraw(OWNER, ASSET, 101).unwrap_err();
        assert_eq!(err, DropError::InsufficientBalance { have: 100, need: 101 });
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 100);
        assert_eq!(controller.store().balance_of(&ASSET, &OWNER), 0);
    }

    #[test]
    fn withdraw_ignores_the_ledger() {
        let (mut controller, tree) = active_controller(&[30, 40], 100);
        claim_row(&mut controller, &tree, addr(1)).unwrap();

        // Unclaimed entitlement (40 for addr(2)) does not reserve funds.
        controller.admin_withdraw(OWNER, ASSET, 70).unwrap();
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 0);
        assert_eq!(controller.claimed(&addr(1)), 30);
        assert_eq!(controller.claimed(&addr(2)), 0);

        // The stranded claim now fails on funds, not on the ledger.
        let err = claim_row(&mut controller, &tree, addr(2)).unwrap_err();
        assert_eq!(err, DropError::InsufficientBalance { have: 0, need: 40 });
    }

    #[test]
    fn withdraw_recovers_foreign_assets() {
        let other = Address([0xDD; 20]);
        let (mut controller, _) = active_controller(&[10], 100);
        controller.store_mut().mint(&other, &VAULT, 5).unwrap();

        let withdrawal = controller.admin_withdraw(OWNER, other, 5).unwrap();
        assert_eq!(withdrawal.asset, other);
        assert_eq!(controller.store().balance_of(&other, &OWNER), 5);
        // The distributed asset is untouched.
        assert_eq!(controller.store().balance_of(&ASSET, &VAULT), 100);
    }

    #[test]
    fn withdraw_zero_succeeds() {
        let (mut controller, _) = active_controller(&[10], 100);
        let withdrawal = controller.admin_withdraw(OWNER, ASSET, 0).unwrap();
        assert_eq!(withdrawal.amount, 0);
    }

    // --- events ---

    #[test]
    fn events_record_the_full_lifecycle() {
        let (mut controller, tree) = active_controller(&[10], 100);
        claim_row(&mut controller, &tree, addr(1)).unwrap();
        controller.admin_withdraw(OWNER, ASSET, 90).unwrap();

        let events = controller.take_events();
        assert_eq!(
            events,
            vec![
                DropEvent::RootUpdated {
                    previous: None,
                    root: tree.root(),
                    epoch: 1,
                },
                DropEvent::Claimed {
                    recipient: addr(1),
                    delta: 10,
                    cumulative: 10,
                    epoch: 1,
                },
                DropEvent::Withdrawn {
                    asset: ASSET,
                    to: OWNER,
                    amount: 90,
                },
            ]
        );

        // Drained: nothing pending afterwards.
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn failed_operations_emit_no_events() {
        let (mut controller, tree) = active_controller(&[10], 100);
        controller.take_events();

        controller.set_merkle_root(addr(0x99), h(0x01)).unwrap_err();
        controller
            .claim(addr(1), 11, tree.root(), &tree.proof_of(&addr(1)).unwrap())
            .unwrap_err();
        controller.admin_withdraw(OWNER, ASSET, 500).unwrap_err();

        assert!(controller.pending_events().is_empty());
    }
}
