//! # launchpool-settlement
//!
//! **Asset Plane**: everything that touches external fungible assets.
//!
//! ## Architecture
//!
//! 1. **AssetLedger**: the collaborator seam for the investment currency and
//!    both presale tokens (balances, approvals, transfers)
//! 2. **InventoryBook**: per-asset conservation of everything that entered
//!    and left the pool
//! 3. **TreasurySettlement**: operator sweeps of proceeds and unsold
//!    inventory to the treasury
//!
//! The pool never implements an asset itself. [`InMemoryLedger`] is the
//! in-process implementation used by simulations and tests.

pub mod asset_ledger;
pub mod supply_conservation;
pub mod treasury;

pub use asset_ledger::{AssetLedger, InMemoryLedger};
pub use supply_conservation::{InventoryBook, InventoryEntry};
pub use treasury::{SweepContext, TreasurySettlement};
