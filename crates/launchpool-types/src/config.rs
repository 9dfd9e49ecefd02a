//! Presale configuration.
//!
//! A [`PresaleConfig`] is fixed at construction. It is loaded from JSON
//! (optional fields fall back to defaults) and always validated before a
//! pool is built from it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, Allocation, Amount, EpochIndex, LaunchpoolError, Result, constants};

/// One step of an allowance schedule: from `from_epoch` onward, each
/// investor may commit at most `cap` in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceStep {
    pub from_epoch: EpochIndex,
    pub cap: Amount,
}

/// How much investment currency a single investor may commit in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllowancePolicy {
    /// No cap.
    #[default]
    Unlimited,
    /// Same cap for every investor for the whole sale.
    Flat { cap: Amount },
    /// Cap changes at configured epochs. The last step whose
    /// `from_epoch <= epoch` is in force.
    Schedule { steps: Vec<AllowanceStep> },
}

impl AllowancePolicy {
    /// The cap in force at `epoch`, or `None` when uncapped.
    #[must_use]
    pub fn cap_at(&self, epoch: EpochIndex) -> Option<Amount> {
        match self {
            Self::Unlimited => None,
            Self::Flat { cap } => Some(*cap),
            Self::Schedule { steps } => steps
                .iter()
                .take_while(|step| step.from_epoch <= epoch)
                .last()
                .map(|step| step.cap),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Self::Schedule { steps } = self {
            let first = steps.first().ok_or_else(|| {
                LaunchpoolError::Configuration("allowance schedule has no steps".into())
            })?;
            if first.from_epoch != 0 {
                return Err(LaunchpoolError::Configuration(format!(
                    "allowance schedule must start at epoch 0, starts at {}",
                    first.from_epoch
                )));
            }
            if steps.windows(2).any(|w| w[0].from_epoch >= w[1].from_epoch) {
                return Err(LaunchpoolError::Configuration(
                    "allowance schedule epochs must be strictly increasing".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Immutable parameters of a launch pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleConfig {
    /// Standard presale token asset.
    pub standard_token: Address,
    /// Degen presale token asset.
    pub degen_token: Address,
    /// Receives proceeds and unsold inventory.
    pub treasury: Address,
    /// Currency investors pay with.
    pub investment_token: Address,
    /// Sale start, unix seconds.
    pub start_time: u64,
    /// Length of one epoch in seconds.
    pub epoch_duration: u64,
    /// Number of epochs in the sale window.
    pub total_epochs: u64,
    /// Unit price of the standard token.
    pub p_price: Amount,
    /// Unit price of the degen token.
    pub d_price: Amount,
    /// Operator allowed to run whitelist and settlement operations.
    pub admin: Address,
    /// The pool's own account in the asset ledgers.
    pub pool: Address,
    /// Prices are `price / 10^price_decimals` per whole presale token.
    #[serde(default)]
    pub price_decimals: u8,
    #[serde(default)]
    pub allowance: AllowancePolicy,
    /// Reject conversions that do not divide evenly instead of rounding.
    #[serde(default)]
    pub whole_unit_pricing: bool,
    /// Reject treasury withdrawals before the sale has ended.
    #[serde(default)]
    pub settlement_requires_end: bool,
}

impl PresaleConfig {
    /// Check every construction invariant.
    pub fn validate(&self) -> Result<()> {
        if self.total_epochs == 0 {
            return Err(LaunchpoolError::Configuration("total_epochs must be > 0".into()));
        }
        if self.epoch_duration == 0 {
            return Err(LaunchpoolError::Configuration(
                "epoch_duration must be > 0".into(),
            ));
        }
        if self.p_price == 0 || self.d_price == 0 {
            return Err(LaunchpoolError::Configuration("prices must be > 0".into()));
        }
        if self.price_decimals > constants::MAX_DECIMALS {
            return Err(LaunchpoolError::Configuration(format!(
                "price_decimals {} exceeds {}",
                self.price_decimals,
                constants::MAX_DECIMALS
            )));
        }
        self.sale_end()?;

        let accounts = [
            ("standard_token", self.standard_token),
            ("degen_token", self.degen_token),
            ("investment_token", self.investment_token),
            ("treasury", self.treasury),
            ("pool", self.pool),
        ];
        for (i, (name, addr)) in accounts.iter().enumerate() {
            if addr.is_zero() {
                return Err(LaunchpoolError::Configuration(format!("{name} is the zero address")));
            }
            if let Some((other, _)) = accounts[i + 1..].iter().find(|(_, a)| a == addr) {
                return Err(LaunchpoolError::Configuration(format!(
                    "{name} and {other} share address {addr}"
                )));
            }
        }
        if self.admin.is_zero() {
            return Err(LaunchpoolError::Configuration("admin is the zero address".into()));
        }

        self.allowance.validate()
    }

    /// First instant at which the sale is over.
    pub fn sale_end(&self) -> Result<u64> {
        self.epoch_duration
            .checked_mul(self.total_epochs)
            .and_then(|len| self.start_time.checked_add(len))
            .ok_or_else(|| LaunchpoolError::Configuration("sale window overflows u64".into()))
    }

    /// Presale token asset for an allocation class.
    #[must_use]
    pub fn token(&self, allocation: Allocation) -> Address {
        match allocation {
            Allocation::Standard => self.standard_token,
            Allocation::Degen => self.degen_token,
        }
    }

    /// Unit price for an allocation class.
    #[must_use]
    pub fn price(&self, allocation: Allocation) -> Amount {
        match allocation {
            Allocation::Standard => self.p_price,
            Allocation::Degen => self.d_price,
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PresaleConfig {
    /// Hourly epochs, 72 of them, prices 15 / 25, starting at `start_time`.
    /// Every participant address is derived from a fixed label.
    pub fn fixture(start_time: u64) -> Self {
        Self {
            standard_token: Address::derive("pDEFIRE"),
            degen_token: Address::derive("dDEFIRE"),
            treasury: Address::derive("treasury"),
            investment_token: Address::derive("fDAI"),
            start_time,
            epoch_duration: constants::DEFAULT_EPOCH_DURATION_SECS,
            total_epochs: constants::DEFAULT_TOTAL_EPOCHS,
            p_price: 15,
            d_price: 25,
            admin: Address::derive("deployer"),
            pool: Address::derive("launchpool"),
            price_decimals: constants::DEFAULT_PRICE_DECIMALS,
            allowance: AllowancePolicy::Unlimited,
            whole_unit_pricing: false,
            settlement_requires_end: false,
        }
    }
}
