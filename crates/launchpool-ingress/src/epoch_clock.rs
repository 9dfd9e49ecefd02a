//! Epoch clock: derives the sale phase from wall-clock time.
//!
//! Every gate re-evaluates the phase at call time; nothing is cached.
//! Time is unix seconds, supplied by a [`Clock`] so tests and simulations
//! can drive it explicitly.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use launchpool_types::{EpochIndex, PresaleConfig, SalePhase};

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Pre-1970 system time reads as the epoch itself.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Settable clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| Some(t.saturating_add(secs)));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Pure phase computation over a sale window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochClock {
    start_time: u64,
    epoch_duration: u64,
    total_epochs: u64,
}

impl EpochClock {
    /// Build from a validated config.
    #[must_use]
    pub fn from_config(config: &PresaleConfig) -> Self {
        Self {
            start_time: config.start_time,
            // validate() guarantees both are non-zero; max(1) keeps the
            // division total for unvalidated input.
            epoch_duration: config.epoch_duration.max(1),
            total_epochs: config.total_epochs.max(1),
        }
    }

    /// Phase at `now`.
    ///
    /// - `now < start_time` → `NotStarted`
    /// - `n = (now - start_time) / epoch_duration`; `n >= total_epochs` → `Ended`
    /// - otherwise `Active(n)`
    #[must_use]
    pub fn phase(&self, now: u64) -> SalePhase {
        if now < self.start_time {
            return SalePhase::NotStarted;
        }
        let n = (now - self.start_time) / self.epoch_duration;
        if n >= self.total_epochs {
            SalePhase::Ended
        } else {
            SalePhase::Active(n)
        }
    }

    /// Epoch index at `now`: `0` before the start, clamped to
    /// `total_epochs` once the sale has ended.
    #[must_use]
    pub fn current_epoch(&self, now: u64) -> EpochIndex {
        match self.phase(now) {
            SalePhase::NotStarted => 0,
            SalePhase::Active(n) => n,
            SalePhase::Ended => self.total_epochs,
        }
    }

    /// Unix time at which epoch `n` begins, if within the window.
    #[must_use]
    pub fn epoch_start(&self, n: EpochIndex) -> Option<u64> {
        if n >= self.total_epochs {
            return None;
        }
        self.epoch_duration
            .checked_mul(n)
            .and_then(|offset| self.start_time.checked_add(offset))
    }

    /// First instant of the `Ended` phase.
    #[must_use]
    pub fn sale_end(&self) -> u64 {
        self.start_time
            .saturating_add(self.epoch_duration.saturating_mul(self.total_epochs))
    }

    /// Seconds until the phase next changes, `None` once ended.
    #[must_use]
    pub fn seconds_until_next_transition(&self, now: u64) -> Option<u64> {
        match self.phase(now) {
            SalePhase::NotStarted => Some(self.start_time - now),
            SalePhase::Active(n) => {
                let next = self.epoch_start(n + 1).unwrap_or_else(|| self.sale_end());
                Some(next - now)
            }
            SalePhase::Ended => None,
        }
    }

    #[must_use]
    pub fn total_epochs(&self) -> u64 {
        self.total_epochs
    }
}
