//! Error types for the LaunchPool presale engine.
//!
//! All errors use the `LP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Sale phase errors
//! - 2xx: Whitelist / access errors
//! - 3xx: Pricing / allowance errors
//! - 4xx: Inventory / asset errors
//! - 8xx: Invariant errors
//! - 9xx: Configuration / internal errors

use thiserror::Error;

use crate::{Address, Amount, SalePhase};

/// Central error enum for all LaunchPool operations.
///
/// Every variant is a synchronous, atomic rejection: the operation that
/// returned it left pool state unchanged.
#[derive(Debug, Error)]
pub enum LaunchpoolError {
    // =================================================================
    // Sale Phase Errors (1xx)
    // =================================================================
    /// A purchase was attempted outside an `Active` phase.
    #[error("LP_ERR_100: Sale not active (phase {phase})")]
    NotActive { phase: SalePhase },

    /// Settlement attempted before the sale ended while the pool is
    /// configured to require it.
    #[error("LP_ERR_101: Sale has not ended (phase {phase})")]
    SaleNotEnded { phase: SalePhase },

    // =================================================================
    // Whitelist / Access Errors (2xx)
    // =================================================================
    /// Gating is enabled and the caller is not on the whitelist.
    #[error("LP_ERR_200: Address not whitelisted: {0}")]
    NotWhitelisted(Address),

    /// An admin-only operation was invoked by someone else.
    #[error("LP_ERR_201: Unauthorized caller: {0}")]
    Unauthorized(Address),

    /// A batch whitelist update exceeded the per-call limit.
    #[error("LP_ERR_202: Whitelist batch too large: {size} > {max}")]
    WhitelistBatchTooLarge { size: usize, max: usize },

    // =================================================================
    // Pricing / Allowance Errors (3xx)
    // =================================================================
    /// Zero, unrepresentable, or (under whole-unit pricing) inexact amount.
    #[error("LP_ERR_300: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The purchase cost exceeds the investor's remaining allowance.
    #[error("LP_ERR_301: Allowance exceeded: cost {requested}, remaining {remaining}")]
    AllowanceExceeded { requested: Amount, remaining: Amount },

    /// An intermediate computation left the representable range.
    #[error("LP_ERR_302: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    // =================================================================
    // Inventory / Asset Errors (4xx)
    // =================================================================
    /// The pool holds fewer presale tokens than requested.
    #[error("LP_ERR_400: Insufficient pool supply: requested {requested}, available {available}")]
    InsufficientPoolSupply { requested: Amount, available: Amount },

    /// The investor's investment-currency balance is below the cost.
    #[error("LP_ERR_401: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The investor has not approved the pool to debit enough.
    #[error("LP_ERR_402: Insufficient approval: need {needed}, approved {approved}")]
    InsufficientApproval { needed: Amount, approved: Amount },

    /// The asset is not known to the ledger.
    #[error("LP_ERR_403: Unknown asset: {0}")]
    UnknownAsset(Address),

    /// The external asset rejected a transfer.
    ///
    /// The in-memory ledger never returns this; it is the variant other
    /// `AssetLedger` implementations use for a refusal that is not a
    /// balance or approval shortfall (paused asset, blocked account).
    #[error("LP_ERR_404: Asset transfer failed for {asset}: {reason}")]
    AssetTransferFailed { asset: Address, reason: String },

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Investor records no longer reconcile with pool holdings.
    #[error("LP_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error (e.g. poisoned pool lock).
    #[error("LP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("LP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Invalid presale configuration.
    #[error("LP_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (config file).
    #[error("LP_ERR_903: I/O error: {0}")]
    Io(String),
}

impl LaunchpoolError {
    /// The `LP_ERR_` code of this error, for structured log fields.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::NotActive { .. } => 100,
            Self::SaleNotEnded { .. } => 101,
            Self::NotWhitelisted(_) => 200,
            Self::Unauthorized(_) => 201,
            Self::WhitelistBatchTooLarge { .. } => 202,
            Self::InvalidAmount { .. } => 300,
            Self::AllowanceExceeded { .. } => 301,
            Self::ArithmeticOverflow { .. } => 302,
            Self::InsufficientPoolSupply { .. } => 400,
            Self::InsufficientBalance { .. } => 401,
            Self::InsufficientApproval { .. } => 402,
            Self::UnknownAsset(_) => 403,
            Self::AssetTransferFailed { .. } => 404,
            Self::SupplyInvariantViolation { .. } => 800,
            Self::Internal(_) => 900,
            Self::Serialization(_) => 901,
            Self::Configuration(_) => 902,
            Self::Io(_) => 903,
        }
    }

    /// Shorthand for an [`InvalidAmount`](Self::InvalidAmount) error.
    #[must_use]
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`ArithmeticOverflow`](Self::ArithmeticOverflow) error.
    #[must_use]
    pub fn overflow(context: &'static str) -> Self {
        Self::ArithmeticOverflow { context }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LaunchpoolError>;

impl From<std::io::Error> for LaunchpoolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LaunchpoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = LaunchpoolError::NotWhitelisted(Address::derive("alice"));
        let msg = format!("{err}");
        assert!(msg.starts_with("LP_ERR_200"), "Got: {msg}");
    }

    #[test]
    fn allowance_exceeded_display() {
        let err = LaunchpoolError::AllowanceExceeded {
            requested: 100,
            remaining: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("LP_ERR_301"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn not_active_display_names_phase() {
        let err = LaunchpoolError::NotActive {
            phase: SalePhase::NotStarted,
        };
        assert!(format!("{err}").contains("NOT_STARTED"));
    }

    #[test]
    fn code_matches_display_prefix() {
        let errors = vec![
            LaunchpoolError::NotActive {
                phase: SalePhase::Ended,
            },
            LaunchpoolError::Unauthorized(Address::ZERO),
            LaunchpoolError::invalid_amount("zero"),
            LaunchpoolError::overflow("cost"),
            LaunchpoolError::InsufficientPoolSupply {
                requested: 2,
                available: 1,
            },
            LaunchpoolError::SupplyInvariantViolation {
                reason: "test".into(),
            },
            LaunchpoolError::Internal("test".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with(&format!("LP_ERR_{}", err.code())),
                "code {} does not match message {msg}",
                err.code()
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LaunchpoolError = io.into();
        assert!(matches!(err, LaunchpoolError::Io(_)));
    }
}
