//! Sale phase types for the epoch-gated presale.
//!
//! The sale moves through
//! **NOT_STARTED → ACTIVE(0) → … → ACTIVE(n-1) → ENDED**
//! purely as wall-clock time elapses. There is no transition call: the
//! phase is recomputed from the clock on every entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based index of an epoch within the sale window.
pub type EpochIndex = u64;

/// Where the sale stands at a given instant.
///
/// Variant order gives the total order used for monotonicity checks:
/// `NotStarted < Active(0) < Active(1) < … < Ended`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SalePhase {
    /// Before `start_time`.
    NotStarted,
    /// Within the sale window, in the given epoch.
    Active(EpochIndex),
    /// At or after `start_time + epoch_duration * total_epochs`.
    Ended,
}

impl SalePhase {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active(_))
    }

    #[must_use]
    pub fn is_ended(self) -> bool {
        self == Self::Ended
    }

    /// The epoch index when active.
    #[must_use]
    pub fn epoch(self) -> Option<EpochIndex> {
        match self {
            Self::Active(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for SalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Active(n) => write!(f, "ACTIVE({n})"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}
