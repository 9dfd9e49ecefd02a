//! # launchpool-core
//!
//! Purchase processor for the **LaunchPool** presale engine.
//!
//! - [`LaunchPool`]: owns sale state, runs the purchase pipeline, exposes the
//!   admin surface and treasury settlement, and reconciles its books
//! - [`SharedLaunchPool`]: `Arc<Mutex<_>>` handle serializing every
//!   operation on one pool
//!
//! ## Sale Lifecycle
//!
//! ```text
//! ┌─────────────┐    ┌──────────────────────────┐    ┌──────────┐
//! │ NOT_STARTED │───▶│ ACTIVE(0) … ACTIVE(n-1)  │───▶│  ENDED   │
//! │             │    │                          │    │          │
//! │ admin:      │    │ buy_standard / buy_degen │    │ withdraw │
//! │ whitelist   │    │ gated by whitelist,      │    │ proceeds │
//! │ setup       │    │ allowance, inventory     │    │ + unsold │
//! └─────────────┘    └──────────────────────────┘    └──────────┘
//! ```
//!
//! Phases are derived from the clock on every call; there is no explicit
//! transition and the sale never returns to `ACTIVE` once ended.
//!
//! ## Invariants
//!
//! 1. **Atomicity**: a failed operation leaves records, totals, and asset
//!    balances unchanged
//! 2. **Conservation**: for each presale token,
//!    `sold + swept + on_hand == provisioned`
//! 3. **Allowance**: no investor ever commits more than the cap in force
//! 4. **Checks-effects-interactions**: internal state is final before any
//!    external transfer

pub mod pool;
pub mod shared;

pub use pool::{LaunchPool, PoolHoldings};
pub use shared::SharedLaunchPool;
