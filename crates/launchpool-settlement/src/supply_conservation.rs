//! Inventory conservation invariant checker.
//!
//! Mathematical invariant enforced for every asset the pool holds:
//! ```text
//! ∀ asset: received == sold + swept + on_hand
//! ```
//! where `received` is everything that ever reached the pool (operator
//! provisioning, purchase proceeds), `sold` is what left to investors, and
//! `swept` is what left to the treasury.
//!
//! The pool cannot see provisioning mints directly, so increases in the
//! on-hand balance that no recorded flow explains are learned as new
//! receipts when observed. Decreases that no recorded flow explains mean
//! something other than the pool moved its assets: a critical violation.

use std::collections::{BTreeMap, HashMap};

use launchpool_types::{Address, Amount, LaunchpoolError, Result};
use serde::Serialize;

/// Flows of one asset through the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub received: Amount,
    pub sold: Amount,
    pub swept: Amount,
}

impl InventoryEntry {
    /// What the pool should hold: `received - sold - swept`.
    #[must_use]
    pub fn expected_on_hand(&self) -> Option<Amount> {
        self.received.checked_sub(self.sold)?.checked_sub(self.swept)
    }
}

/// Tracks per-asset flows and validates conservation against the ledger.
#[derive(Debug, Clone, Default)]
pub struct InventoryBook {
    entries: HashMap<Address, InventoryEntry>,
}

fn add(slot: &mut Amount, amount: Amount, context: &'static str) -> Result<()> {
    *slot = slot
        .checked_add(amount)
        .ok_or_else(|| LaunchpoolError::overflow(context))?;
    Ok(())
}

impl InventoryBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile an on-hand balance read from the ledger.
    ///
    /// Unexplained increases are recorded as receipts (top-ups).
    ///
    /// # Errors
    /// [`LaunchpoolError::SupplyInvariantViolation`] if the pool holds less
    /// than its recorded flows allow.
    pub fn observe(&mut self, asset: &Address, on_hand: Amount) -> Result<()> {
        let entry = self.entries.entry(*asset).or_default();
        let expected = entry.expected_on_hand().ok_or_else(|| {
            LaunchpoolError::SupplyInvariantViolation {
                reason: format!("asset {asset}: outflows exceed receipts ({entry:?})"),
            }
        })?;
        if on_hand < expected {
            return Err(LaunchpoolError::SupplyInvariantViolation {
                reason: format!(
                    "asset {asset}: on hand {on_hand} < expected {expected} \
                     (received={}, sold={}, swept={})",
                    entry.received, entry.sold, entry.swept,
                ),
            });
        }
        if on_hand > expected {
            let top_up = on_hand - expected;
            add(&mut entry.received, top_up, "inventory received")?;
            tracing::debug!(asset = %asset, top_up, "Inventory top-up observed");
        }
        Ok(())
    }

    /// Record assets that reached the pool through a known flow.
    pub fn record_inflow(&mut self, asset: &Address, amount: Amount) -> Result<()> {
        add(&mut self.entries.entry(*asset).or_default().received, amount, "inventory received")
    }

    /// Record assets that left the pool to an investor.
    pub fn record_sale(&mut self, asset: &Address, amount: Amount) -> Result<()> {
        add(&mut self.entries.entry(*asset).or_default().sold, amount, "inventory sold")
    }

    /// Record assets that left the pool to the treasury.
    pub fn record_sweep(&mut self, asset: &Address, amount: Amount) -> Result<()> {
        add(&mut self.entries.entry(*asset).or_default().swept, amount, "inventory swept")
    }

    /// Verify `received == sold + swept + on_hand` exactly.
    ///
    /// # Errors
    /// Returns [`LaunchpoolError::SupplyInvariantViolation`] if it does not.
    pub fn verify(&self, asset: &Address, on_hand: Amount) -> Result<()> {
        let entry = self.entry(asset);
        if entry.expected_on_hand() != Some(on_hand) {
            return Err(LaunchpoolError::SupplyInvariantViolation {
                reason: format!(
                    "asset {asset}: on hand {on_hand} != received {} - sold {} - swept {}",
                    entry.received, entry.sold, entry.swept,
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn entry(&self, asset: &Address) -> InventoryEntry {
        self.entries.get(asset).copied().unwrap_or_default()
    }

    /// Ordered snapshot of every tracked asset, for audit export.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Address, InventoryEntry> {
        self.entries.iter().map(|(a, e)| (*a, *e)).collect()
    }
}
