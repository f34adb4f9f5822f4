//! External ledger interfaces consumed by the engine.
//!
//! The engine never owns assets or funds itself; it custodies them under
//! [`ENGINE_ACCOUNT`] on external ledgers reached through these traits.
//! Both traits require atomic success-or-failure: a failed transfer aborts
//! the whole engine operation with no partial state change.

use std::collections::HashMap;
use thiserror::Error;

use sealbid_types::{Address, AssetRef};

/// The distinguished account under which the engine custodies assets and
/// escrowed funds on the external ledgers.
pub const ENGINE_ACCOUNT: Address = [0xEE; 32];

/// Errors surfaced by the external ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Asset is not registered")]
    UnknownAsset,

    #[error("Account does not hold the asset")]
    NotOwner,
}

/// Custody interface over the external asset registry.
pub trait AssetCustody {
    /// Current owner of an asset, if the asset is registered.
    fn owner_of(&self, asset: &AssetRef) -> Option<Address>;

    /// Transfer an asset between accounts. Fails unless `from` owns it.
    fn transfer(&mut self, asset: &AssetRef, from: Address, to: Address)
        -> Result<(), LedgerError>;
}

/// Interface over the external fungible-token ledger.
pub trait CurrencyLedger {
    /// Balance of `account` on the ledger identified by `currency`.
    fn balance_of(&self, currency: Address, account: Address) -> u64;

    /// Move `amount` from one account to another on the given currency
    /// ledger. Fails if `from` cannot cover the amount.
    fn transfer(
        &mut self,
        currency: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), LedgerError>;
}

/// The engine's view of both external ledgers.
#[derive(Debug, Default)]
pub struct Ledgers<A, C> {
    pub assets: A,
    pub currency: C,
}

impl<A, C> Ledgers<A, C> {
    pub fn new(assets: A, currency: C) -> Self {
        Self { assets, currency }
    }
}

/// In-memory asset registry for tests and the dev server.
#[derive(Debug, Default)]
pub struct InMemoryAssetRegistry {
    owners: HashMap<AssetRef, Address>,
}

impl InMemoryAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset with an initial owner.
    pub fn register(&mut self, asset: AssetRef, owner: Address) {
        self.owners.insert(asset, owner);
    }
}

impl AssetCustody for InMemoryAssetRegistry {
    fn owner_of(&self, asset: &AssetRef) -> Option<Address> {
        self.owners.get(asset).copied()
    }

    fn transfer(
        &mut self,
        asset: &AssetRef,
        from: Address,
        to: Address,
    ) -> Result<(), LedgerError> {
        let owner = self.owners.get_mut(asset).ok_or(LedgerError::UnknownAsset)?;
        if *owner != from {
            return Err(LedgerError::NotOwner);
        }
        *owner = to;
        Ok(())
    }
}

/// In-memory fungible-token ledger for tests and the dev server.
#[derive(Debug, Default)]
pub struct InMemoryCurrencyLedger {
    balances: HashMap<(Address, Address), u64>,
}

impl InMemoryCurrencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air (test/dev setup only).
    pub fn mint(&mut self, currency: Address, account: Address, amount: u64) {
        *self.balances.entry((currency, account)).or_insert(0) += amount;
    }
}

impl CurrencyLedger for InMemoryCurrencyLedger {
    fn balance_of(&self, currency: Address, account: Address) -> u64 {
        self.balances.get(&(currency, account)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        currency: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(currency, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        *self.balances.entry((currency, from)).or_insert(0) -= amount;
        *self.balances.entry((currency, to)).or_insert(0) += amount;
        Ok(())
    }
}
