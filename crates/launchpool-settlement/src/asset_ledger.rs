//! Fungible-asset collaborator seam.
//!
//! The pool never implements the investment currency or the presale
//! tokens; it only consumes them through [`AssetLedger`]. Every asset is
//! named by its [`Address`] and exposes the usual fungible interface:
//! balances, decimals, approvals, `transfer`, and `transfer_from`.
//!
//! [`InMemoryLedger`] is a complete in-process implementation used for
//! simulations and tests. It tracks per-(asset, holder) balances and
//! per-(asset, owner, spender) approvals. All mutations are atomic: either
//! the full operation succeeds or the ledger is unchanged.

use std::collections::HashMap;

use launchpool_types::{Address, Amount, LaunchpoolError, Result};

/// What the pool needs from an external fungible asset.
///
/// Implementations report shortfalls as `InsufficientBalance` or
/// `InsufficientApproval`, unknown assets as `UnknownAsset`, and any other
/// refusal as [`LaunchpoolError::AssetTransferFailed`].
pub trait AssetLedger {
    /// Decimal precision of `asset`.
    fn decimals(&self, asset: &Address) -> Result<u8>;

    /// Balance of `holder` in `asset`.
    fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount>;

    /// How much `spender` may still move out of `owner`'s balance.
    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> Result<Amount>;

    /// Move `amount` from `from` (the acting account) to `to`.
    fn transfer(&mut self, asset: &Address, from: &Address, to: &Address, amount: Amount)
    -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// `spender`'s approval.
    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;
}

/// One asset's books.
#[derive(Debug, Clone, Default)]
struct AssetBook {
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    approvals: HashMap<(Address, Address), Amount>,
}

impl AssetBook {
    fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn approval(&self, owner: &Address, spender: &Address) -> Amount {
        self.approvals.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Check-then-move. Nothing changes unless every check passes.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let available = self.balance(from);
        if available < amount {
            return Err(LaunchpoolError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| LaunchpoolError::overflow("recipient balance"))?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

/// In-process fungible-asset ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    assets: HashMap<Address, AssetBook>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new asset. Re-registering an existing asset keeps its
    /// balances and only updates the metadata.
    pub fn register(&mut self, asset: Address, symbol: &str, decimals: u8) {
        let book = self.assets.entry(asset).or_default();
        book.symbol = symbol.to_string();
        book.decimals = decimals;
    }

    fn book(&self, asset: &Address) -> Result<&AssetBook> {
        self.assets
            .get(asset)
            .ok_or(LaunchpoolError::UnknownAsset(*asset))
    }

    fn book_mut(&mut self, asset: &Address) -> Result<&mut AssetBook> {
        self.assets
            .get_mut(asset)
            .ok_or(LaunchpoolError::UnknownAsset(*asset))
    }

    /// Create `amount` new units in `to`'s balance.
    pub fn mint(&mut self, asset: &Address, to: &Address, amount: Amount) -> Result<()> {
        let book = self.book_mut(asset)?;
        let supply = book
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LaunchpoolError::overflow("total supply"))?;
        // balance <= supply, so this cannot overflow once supply did not
        let balance = book.balance(to) + amount;
        book.total_supply = supply;
        book.balances.insert(*to, balance);
        Ok(())
    }

    /// Set `spender`'s approval over `owner`'s balance (overwrites).
    pub fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<()> {
        let book = self.book_mut(asset)?;
        book.approvals.insert((*owner, *spender), amount);
        Ok(())
    }

    pub fn total_supply(&self, asset: &Address) -> Result<Amount> {
        Ok(self.book(asset)?.total_supply)
    }

    pub fn symbol(&self, asset: &Address) -> Result<&str> {
        Ok(&self.book(asset)?.symbol)
    }

    /// Sum of all holder balances; equals `total_supply` for a sound ledger.
    pub fn sum_of_balances(&self, asset: &Address) -> Result<Amount> {
        Ok(self
            .book(asset)?
            .balances
            .values()
            .fold(0u128, |acc, b| acc.saturating_add(*b)))
    }
}

impl AssetLedger for InMemoryLedger {
    fn decimals(&self, asset: &Address) -> Result<u8> {
        Ok(self.book(asset)?.decimals)
    }

    fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount> {
        Ok(self.book(asset)?.balance(holder))
    }

    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> Result<Amount> {
        Ok(self.book(asset)?.approval(owner, spender))
    }

    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.book_mut(asset)?.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let book = self.book_mut(asset)?;
        let approved = book.approval(from, spender);
        if approved < amount {
            return Err(LaunchpoolError::InsufficientApproval {
                needed: amount,
                approved,
            });
        }
        book.move_balance(from, to, amount)?;
        book.approvals.insert((*from, *spender), approved - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (InMemoryLedger, Address) {
        let mut ledger = InMemoryLedger::new();
        let fdai = Address::derive("fDAI");
        ledger.register(fdai, "fDAI", 18);
        (ledger, fdai)
    }

    #[test]
    fn mint_increases_balance_and_supply() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        ledger.mint(&fdai, &alice, 6_000).unwrap();
        assert_eq!(ledger.balance_of(&fdai, &alice).unwrap(), 6_000);
        assert_eq!(ledger.total_supply(&fdai).unwrap(), 6_000);
        assert_eq!(ledger.decimals(&fdai).unwrap(), 18);
        assert_eq!(ledger.symbol(&fdai).unwrap(), "fDAI");
    }

    #[test]
    fn transfer_moves_balance() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        ledger.mint(&fdai, &alice, 100).unwrap();
        ledger.transfer(&fdai, &alice, &bob, 40).unwrap();
        assert_eq!(ledger.balance_of(&fdai, &alice).unwrap(), 60);
        assert_eq!(ledger.balance_of(&fdai, &bob).unwrap(), 40);
        assert_eq!(ledger.sum_of_balances(&fdai).unwrap(), 100);
    }

    #[test]
    fn transfer_insufficient_fails_unchanged() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        ledger.mint(&fdai, &alice, 10).unwrap();
        let err = ledger.transfer(&fdai, &alice, &bob, 11).unwrap_err();
        assert!(matches!(
            err,
            LaunchpoolError::InsufficientBalance { needed: 11, available: 10 }
        ));
        assert_eq!(ledger.balance_of(&fdai, &alice).unwrap(), 10);
        assert_eq!(ledger.balance_of(&fdai, &bob).unwrap(), 0);
    }

    #[test]
    fn transfer_from_consumes_approval() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        let pool = Address::derive("launchpool");
        ledger.mint(&fdai, &alice, 6_000).unwrap();
        ledger.approve(&fdai, &alice, &pool, 5_000).unwrap();
        ledger
            .transfer_from(&fdai, &pool, &alice, &pool, 3_000)
            .unwrap();
        assert_eq!(ledger.allowance(&fdai, &alice, &pool).unwrap(), 2_000);
        assert_eq!(ledger.balance_of(&fdai, &pool).unwrap(), 3_000);
    }

    #[test]
    fn transfer_from_without_approval_fails() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        let pool = Address::derive("launchpool");
        ledger.mint(&fdai, &alice, 100).unwrap();
        ledger.approve(&fdai, &alice, &pool, 10).unwrap();
        let err = ledger
            .transfer_from(&fdai, &pool, &alice, &pool, 50)
            .unwrap_err();
        assert!(matches!(err, LaunchpoolError::InsufficientApproval { .. }));
        assert_eq!(ledger.balance_of(&fdai, &alice).unwrap(), 100);
        assert_eq!(ledger.allowance(&fdai, &alice, &pool).unwrap(), 10);
    }

    #[test]
    fn transfer_from_insufficient_balance_keeps_approval() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        let pool = Address::derive("launchpool");
        ledger.mint(&fdai, &alice, 10).unwrap();
        ledger.approve(&fdai, &alice, &pool, 100).unwrap();
        assert!(ledger.transfer_from(&fdai, &pool, &alice, &pool, 50).is_err());
        assert_eq!(ledger.allowance(&fdai, &alice, &pool).unwrap(), 100);
    }

    #[test]
    fn unknown_asset_rejected() {
        let ledger = InMemoryLedger::new();
        let ghost = Address::derive("ghost");
        assert!(matches!(
            ledger.balance_of(&ghost, &ghost),
            Err(LaunchpoolError::UnknownAsset(a)) if a == ghost
        ));
    }

    #[test]
    fn mint_overflow_rejected() {
        let (mut ledger, fdai) = setup();
        let alice = Address::derive("alice");
        ledger.mint(&fdai, &alice, Amount::MAX).unwrap();
        assert!(ledger.mint(&fdai, &alice, 1).is_err());
        assert_eq!(ledger.balance_of(&fdai, &alice).unwrap(), Amount::MAX);
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let (ledger, fdai) = setup();
        assert_eq!(ledger.balance_of(&fdai, &Address::random()).unwrap(), 0);
    }
}
