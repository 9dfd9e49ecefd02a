//! # launchpool-types
//!
//! Shared types, errors, and configuration for the **LaunchPool** presale
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`ReceiptId`]
//! - **Sale model**: [`SalePhase`], [`EpochIndex`]
//! - **Investor model**: [`InvestorRecord`], [`Allocation`], [`PoolTotals`], [`Amount`]
//! - **Receipts**: [`PurchaseReceipt`], [`SettlementReceipt`], [`SettlementKind`]
//! - **Configuration**: [`PresaleConfig`], [`AllowancePolicy`], [`AllowanceStep`]
//! - **Errors**: [`LaunchpoolError`] with `LP_ERR_` prefix codes
//! - **Units**: decimal ↔ base-unit conversion ([`units`])
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod ids;
pub mod investor;
pub mod receipt;
pub mod units;

pub use config::*;
pub use epoch::*;
pub use error::*;
pub use ids::*;
pub use investor::*;
pub use receipt::*;

// Constants and unit helpers are accessed via their modules
// (`launchpool_types::constants::FOO`, `launchpool_types::units::parse_units`).
