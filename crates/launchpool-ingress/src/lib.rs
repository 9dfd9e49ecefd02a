//! # launchpool-ingress
//!
//! **Gate Plane**: every check a purchase must clear before any state
//! changes.
//!
//! ## Architecture
//!
//! 1. **EpochClock**: derives `NotStarted | Active(n) | Ended` from the clock
//! 2. **WhitelistRegistry**: optional membership gate, admin-managed
//! 3. **PricingEngine**: exact fixed-price conversion between currencies
//! 4. **AllowanceLedger**: per-investor cumulative investment vs. cap
//!
//! ## Purchase Gate Order
//!
//! ```text
//! EpochClock.phase() → WhitelistRegistry.check() → amount > 0
//!     → PricingEngine.to_investment() → AllowanceLedger.check()
//! ```
//!
//! Nothing in this crate moves assets; it only decides.

pub mod allowance;
pub mod epoch_clock;
pub mod pricing;
pub mod whitelist;

pub use allowance::AllowanceLedger;
pub use epoch_clock::{Clock, EpochClock, ManualClock, SystemClock};
pub use pricing::PricingEngine;
pub use whitelist::WhitelistRegistry;
