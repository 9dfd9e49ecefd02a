//! Serialized, shareable handle to a [`LaunchPool`].
//!
//! Every operation, administrative or purchase, takes the same lock for
//! its whole duration, so operations are totally ordered and no purchase
//! can interleave with a settlement or whitelist change.

use std::sync::{Arc, Mutex, MutexGuard};

use launchpool_ingress::Clock;
use launchpool_settlement::AssetLedger;
use launchpool_types::{
    Address, Allocation, Amount, EpochIndex, LaunchpoolError, PurchaseReceipt, Result, SalePhase,
    SettlementReceipt,
};

use crate::pool::LaunchPool;

/// Cloneable handle; clones share one pool.
pub struct SharedLaunchPool<L, C> {
    inner: Arc<Mutex<LaunchPool<L, C>>>,
}

impl<L, C> Clone for SharedLaunchPool<L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: AssetLedger, C: Clock> SharedLaunchPool<L, C> {
    #[must_use]
    pub fn new(pool: LaunchPool<L, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LaunchPool<L, C>>> {
        self.inner.lock().map_err(|_| {
            tracing::error!("Launch pool lock poisoned");
            LaunchpoolError::Internal("launch pool lock poisoned".into())
        })
    }

    /// Run `f` with exclusive access to the pool.
    pub fn with<R>(&self, f: impl FnOnce(&mut LaunchPool<L, C>) -> Result<R>) -> Result<R> {
        let mut pool = self.lock()?;
        f(&mut pool)
    }

    /// Run `f` with the lock held for reading a value.
    pub fn read<R>(&self, f: impl FnOnce(&LaunchPool<L, C>) -> R) -> Result<R> {
        let pool = self.lock()?;
        Ok(f(&pool))
    }

    pub fn buy(&self, caller: Address, allocation: Allocation, amount: Amount) -> Result<PurchaseReceipt> {
        self.with(|pool| pool.buy(caller, allocation, amount))
    }

    pub fn buy_standard(&self, caller: Address, amount: Amount) -> Result<PurchaseReceipt> {
        self.buy(caller, Allocation::Standard, amount)
    }

    pub fn buy_degen(&self, caller: Address, amount: Amount) -> Result<PurchaseReceipt> {
        self.buy(caller, Allocation::Degen, amount)
    }

    pub fn enable_whitelist(&self, caller: Address, enabled: bool) -> Result<()> {
        self.with(|pool| pool.enable_whitelist(caller, enabled))
    }

    pub fn add_whitelist(&self, caller: Address, who: Address) -> Result<bool> {
        self.with(|pool| pool.add_whitelist(caller, who))
    }

    pub fn remove_whitelist(&self, caller: Address, who: Address) -> Result<bool> {
        self.with(|pool| pool.remove_whitelist(caller, who))
    }

    pub fn add_multiple_whitelist(&self, caller: Address, batch: Vec<Address>) -> Result<usize> {
        self.with(|pool| pool.add_multiple_whitelist(caller, batch))
    }

    pub fn is_whitelisted(&self, who: &Address) -> Result<bool> {
        self.read(|pool| pool.is_whitelisted(who))
    }

    pub fn transfer_admin(&self, caller: Address, new_admin: Address) -> Result<()> {
        self.with(|pool| pool.transfer_admin(caller, new_admin))
    }

    pub fn phase(&self) -> Result<SalePhase> {
        self.read(LaunchPool::phase)
    }

    pub fn current_epoch(&self) -> Result<EpochIndex> {
        self.read(LaunchPool::current_epoch)
    }

    pub fn investor_current_buy_allowance(&self, investor: &Address) -> Result<Amount> {
        self.read(|pool| pool.investor_current_buy_allowance(investor))
    }

    pub fn check_investor_details(&self, investor: &Address) -> Result<(Amount, Amount, Amount)> {
        self.read(|pool| pool.check_investor_details(investor))
    }

    pub fn withdraw_investment_to_treasury(&self, caller: Address) -> Result<SettlementReceipt> {
        self.with(|pool| pool.withdraw_investment_to_treasury(caller))
    }

    pub fn withdraw_unclaimed_to_treasury(&self, caller: Address) -> Result<Vec<SettlementReceipt>> {
        self.with(|pool| pool.withdraw_unclaimed_to_treasury(caller))
    }

    pub fn reconcile(&self) -> Result<()> {
        self.with(LaunchPool::reconcile)
    }

    pub fn ledger_digest(&self) -> Result<[u8; 32]> {
        self.read(LaunchPool::ledger_digest)
    }
}

impl<L, C> std::fmt::Debug for SharedLaunchPool<L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLaunchPool")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}
