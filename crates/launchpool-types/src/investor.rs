//! Per-investor accounting records.
//!
//! An [`InvestorRecord`] is created lazily on the investor's first
//! purchase. Its counters only ever grow; no operation short of dropping
//! the whole pool removes a record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount of an asset in base units.
pub type Amount = u128;

/// The two presale allocation classes sold by a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Allocation {
    /// Standard allocation, priced at `p_price`.
    Standard,
    /// Higher-risk allocation, priced at `d_price`.
    Degen,
}

impl Allocation {
    pub const ALL: [Self; 2] = [Self::Standard, Self::Degen];
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "STANDARD"),
            Self::Degen => write!(f, "DEGEN"),
        }
    }
}

/// Cumulative purchases of a single investor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorRecord {
    pub standard_tokens_bought: Amount,
    pub degen_tokens_bought: Amount,
    /// Investment currency debited across all purchases.
    pub amount_invested: Amount,
}

impl InvestorRecord {
    #[must_use]
    pub fn bought(&self, allocation: Allocation) -> Amount {
        match allocation {
            Allocation::Standard => self.standard_tokens_bought,
            Allocation::Degen => self.degen_tokens_bought,
        }
    }

    /// The record after buying `tokens` of `allocation` for `cost`.
    ///
    /// Returns `None` if any counter would overflow; the receiver is never
    /// modified, so callers can validate before committing.
    #[must_use]
    pub fn with_purchase(&self, allocation: Allocation, tokens: Amount, cost: Amount) -> Option<Self> {
        let mut next = *self;
        next.amount_invested = self.amount_invested.checked_add(cost)?;
        match allocation {
            Allocation::Standard => {
                next.standard_tokens_bought = self.standard_tokens_bought.checked_add(tokens)?;
            }
            Allocation::Degen => {
                next.degen_tokens_bought = self.degen_tokens_bought.checked_add(tokens)?;
            }
        }
        Some(next)
    }

    /// The `(standard, degen, invested)` projection reported to callers.
    #[must_use]
    pub fn as_tuple(&self) -> (Amount, Amount, Amount) {
        (
            self.standard_tokens_bought,
            self.degen_tokens_bought,
            self.amount_invested,
        )
    }
}

/// Running totals over every investor record of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTotals {
    pub standard_sold: Amount,
    pub degen_sold: Amount,
    pub total_raised: Amount,
    pub investor_count: u64,
}

impl PoolTotals {
    #[must_use]
    pub fn sold(&self, allocation: Allocation) -> Amount {
        match allocation {
            Allocation::Standard => self.standard_sold,
            Allocation::Degen => self.degen_sold,
        }
    }

    /// Totals after one more purchase; `None` on overflow.
    #[must_use]
    pub fn with_purchase(
        &self,
        allocation: Allocation,
        tokens: Amount,
        cost: Amount,
        new_investor: bool,
    ) -> Option<Self> {
        let mut next = *self;
        next.total_raised = self.total_raised.checked_add(cost)?;
        match allocation {
            Allocation::Standard => next.standard_sold = self.standard_sold.checked_add(tokens)?,
            Allocation::Degen => next.degen_sold = self.degen_sold.checked_add(tokens)?,
        }
        if new_investor {
            next.investor_count = self.investor_count.checked_add(1)?;
        }
        Some(next)
    }
}
