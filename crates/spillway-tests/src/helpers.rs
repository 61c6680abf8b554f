//! Shared test helpers for E2E and integration tests.

use spillway_core::tree::{Allocation, AllocationTree};
use spillway_core::types::Address;
use spillway_drop::{
    ClaimReceipt, DropConfig, DropController, DropError, MemoryTokenStore, TokenStore,
};

/// Administrative principal for all integration fixtures.
pub const OWNER: Address = Address([0x0A; 20]);

/// Vault address whose balances back payouts and withdrawals.
pub const VAULT: Address = Address([0xFE; 20]);

/// The distributed asset.
pub const ASSET: Address = Address([0xEE; 20]);

/// Simple address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Allocation table with recipients `addr(1)`, `addr(2)`, .. in input order.
pub fn table(amounts: &[u64]) -> Vec<Allocation> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| Allocation {
            recipient: addr(i as u8 + 1),
            amount,
        })
        .collect()
}

/// Committed tree over `table(amounts)`.
pub fn commit(amounts: &[u64]) -> AllocationTree {
    AllocationTree::from_allocations(table(amounts)).unwrap()
}

/// Controller with `funding` minted to the vault and no root installed.
pub fn funded_controller(funding: u64) -> DropController<MemoryTokenStore> {
    let mut store = MemoryTokenStore::new();
    store.mint(&ASSET, &VAULT, funding).unwrap();
    DropController::new(OWNER, VAULT, ASSET, store, DropConfig::default())
}

/// Controller with `funding` in the vault and the tree's root installed.
pub fn active_controller(
    tree: &AllocationTree,
    funding: u64,
) -> DropController<MemoryTokenStore> {
    let mut controller = funded_controller(funding);
    controller.set_merkle_root(OWNER, tree.root()).unwrap();
    controller
}

/// Claim one recipient's row straight off the committed tree.
pub fn claim_row(
    controller: &mut DropController<MemoryTokenStore>,
    tree: &AllocationTree,
    recipient: Address,
) -> Result<ClaimReceipt, DropError> {
    let amount = tree.amount_of(&recipient).unwrap();
    let proof = tree.proof_of(&recipient).unwrap();
    controller.claim(recipient, amount, tree.root(), &proof)
}
