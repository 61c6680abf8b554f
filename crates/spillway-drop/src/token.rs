//! Asset custody seam between the engine and its host.
//!
//! The controller never holds funds itself; it directs a [`TokenStore`]
//! supplied by the host. Hosts embedding the engine adapt their own
//! balance machinery behind this trait; tests and single-process hosts
//! use [`MemoryTokenStore`].

use std::collections::HashMap;

use spillway_core::types::Address;

use crate::error::TokenError;

/// Host-provided fungible asset custody.
///
/// Balances are keyed by `(asset, holder)`; unknown pairs read as zero.
/// `balance_of` reports the total held balance, with no notion of
/// reserved or locked funds.
pub trait TokenStore {
    /// Balance of `holder` in `asset` base units.
    fn balance_of(&self, asset: &Address, holder: &Address) -> u64;

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// Fails with [`TokenError::InsufficientBalance`] when the debit
    /// exceeds the holder's balance. Zero-amount transfers succeed.
    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError>;

    /// Create `amount` new units of `asset` for `to`.
    ///
    /// Fails with [`TokenError::Overflow`] when the asset's total supply
    /// would exceed `u64::MAX`.
    fn mint(&mut self, asset: &Address, to: &Address, amount: u64) -> Result<(), TokenError>;
}

/// In-memory token store for tests and single-process hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    balances: HashMap<(Address, Address), u64>,
    supply: HashMap<Address, u64>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total minted supply of an asset.
    pub fn total_supply(&self, asset: &Address) -> u64 {
        self.supply.get(asset).copied().unwrap_or(0)
    }
}

impl TokenStore for MemoryTokenStore {
    fn balance_of(&self, asset: &Address, holder: &Address) -> u64 {
        self.balances.get(&(*asset, *holder)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        let have = self.balance_of(asset, from);
        if have < amount {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        self.balances.insert((*asset, *from), have - amount);
        let to_balance = self.balance_of(asset, to);
        // Credit cannot overflow: balances partition the minted supply,
        // which mint caps at u64::MAX.
        self.balances.insert((*asset, *to), to_balance + amount);
        Ok(())
    }

    fn mint(&mut self, asset: &Address, to: &Address, amount: u64) -> Result<(), TokenError> {
        let minted = self.total_supply(asset);
        let new_supply = minted.checked_add(amount).ok_or(TokenError::Overflow)?;
        self.supply.insert(*asset, new_supply);

        let balance = self.balance_of(asset, to);
        // Bounded by the supply cap checked above.
        self.balances.insert((*asset, *to), balance + amount);
        Ok(())
    }
}
