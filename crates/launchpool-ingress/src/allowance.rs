//! Allowance ledger: per-investor cumulative investment and the cap on
//! further purchases.
//!
//! The cap comes from the configured [`AllowancePolicy`]; the ledger only
//! tracks what each investor has committed so far. The purchase processor
//! is the only caller of [`AllowanceLedger::record_investment`], and only
//! after every gate has passed.

use std::collections::HashMap;

use launchpool_types::{
    Address, AllowancePolicy, Amount, EpochIndex, LaunchpoolError, PresaleConfig, Result,
};

/// Tracks cumulative investment per investor against a cap.
#[derive(Debug, Clone)]
pub struct AllowanceLedger {
    policy: AllowancePolicy,
    invested: HashMap<Address, Amount>,
}

impl AllowanceLedger {
    #[must_use]
    pub fn new(policy: AllowancePolicy) -> Self {
        Self {
            policy,
            invested: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &PresaleConfig) -> Self {
        Self::new(config.allowance.clone())
    }

    /// Total investment currency `investor` has committed.
    #[must_use]
    pub fn invested(&self, investor: &Address) -> Amount {
        self.invested.get(investor).copied().unwrap_or(0)
    }

    /// How much more `investor` may commit at `epoch`.
    ///
    /// Never negative: if a schedule lowers the cap below what the investor
    /// already committed, the remainder is zero.
    #[must_use]
    pub fn remaining_allowance(&self, investor: &Address, epoch: EpochIndex) -> Amount {
        let cap = self.policy.cap_at(epoch).unwrap_or(Amount::MAX);
        cap.saturating_sub(self.invested(investor))
    }

    /// Gate check: `cost` must fit in the remaining allowance.
    pub fn check(&self, investor: &Address, epoch: EpochIndex, cost: Amount) -> Result<()> {
        let remaining = self.remaining_allowance(investor, epoch);
        if cost > remaining {
            return Err(LaunchpoolError::AllowanceExceeded {
                requested: cost,
                remaining,
            });
        }
        Ok(())
    }

    /// Add `amount` to the investor's cumulative investment.
    /// Returns the new total.
    pub fn record_investment(&mut self, investor: Address, amount: Amount) -> Result<Amount> {
        let entry = self.invested.entry(investor).or_insert(0);
        let total = entry
            .checked_add(amount)
            .ok_or_else(|| LaunchpoolError::overflow("cumulative investment"))?;
        *entry = total;
        Ok(total)
    }

    /// Undo a [`record_investment`](Self::record_investment) whose
    /// enclosing purchase failed afterwards.
    pub fn rewind(&mut self, investor: &Address, amount: Amount) {
        if let Some(entry) = self.invested.get_mut(investor) {
            *entry = entry.saturating_sub(amount);
            if *entry == 0 {
                self.invested.remove(investor);
            }
        }
    }

    /// Sum over all investors.
    #[must_use]
    pub fn total_invested(&self) -> Amount {
        self.invested
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    #[must_use]
    pub fn policy(&self) -> &AllowancePolicy {
        &self.policy
    }
}
