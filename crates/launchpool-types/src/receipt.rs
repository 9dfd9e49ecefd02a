//! Receipts returned by successful purchases and settlements.
//!
//! Receipts are the audit trail of a pool: every asset movement the core
//! initiates is described by exactly one receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Allocation, Amount, EpochIndex, ReceiptId};

/// Proof that a purchase executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub id: ReceiptId,
    pub investor: Address,
    pub allocation: Allocation,
    /// Presale tokens credited to the investor.
    pub tokens: Amount,
    /// Investment currency debited from the investor.
    pub cost: Amount,
    /// Epoch in which the purchase executed.
    pub epoch: EpochIndex,
    pub executed_at: DateTime<Utc>,
}

/// What a settlement moved to the treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    /// Collected investment currency.
    Investment,
    /// Unsold presale-token inventory.
    Unclaimed,
}

impl std::fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Investment => write!(f, "INVESTMENT"),
            Self::Unclaimed => write!(f, "UNCLAIMED"),
        }
    }
}

/// Proof that one asset balance was swept to the treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub id: ReceiptId,
    pub kind: SettlementKind,
    pub asset: Address,
    pub treasury: Address,
    /// Zero when the pool was already drained.
    pub amount: Amount,
    pub executed_at: DateTime<Utc>,
}

impl SettlementReceipt {
    /// `executed_at` comes from the pool's clock, not the system clock.
    #[must_use]
    pub fn new(
        kind: SettlementKind,
        asset: Address,
        treasury: Address,
        amount: Amount,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            kind,
            asset,
            treasury,
            amount,
            executed_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }
}
