//! System-wide constants for the LaunchPool presale engine.

/// Default epoch length in seconds (one hour).
pub const DEFAULT_EPOCH_DURATION_SECS: u64 = 3600;

/// Default number of epochs in the sale window (three days of hourly epochs).
pub const DEFAULT_TOTAL_EPOCHS: u64 = 72;

/// Decimal precision of a typical fungible asset.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Default precision of configured unit prices (whole units).
pub const DEFAULT_PRICE_DECIMALS: u8 = 0;

/// Largest power of ten representable in `u128` (10^38).
pub const MAX_DECIMALS: u8 = 38;

/// Maximum addresses accepted by a single batch whitelist update.
pub const MAX_WHITELIST_BATCH: usize = 1_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "LaunchPool";
