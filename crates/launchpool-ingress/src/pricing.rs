//! Pricing engine: fixed-price conversion between the investment
//! currency and presale tokens.
//!
//! A price `p` with `price_decimals = k` means `p / 10^k` whole units of
//! investment currency per whole presale token. All arithmetic is exact
//! integer math on base units; there is no floating point anywhere.
//!
//! Inexact conversions round in the pool's favour: costs round up, token
//! quantities round down. Under whole-unit pricing they are rejected.

use launchpool_types::{Amount, LaunchpoolError, PresaleConfig, Result, units::pow10};

/// Stateless converter parameterised by price precision and rounding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    price_decimals: u8,
    whole_unit_pricing: bool,
}

/// Rounding direction for a division.
#[derive(Debug, Clone, Copy)]
enum Round {
    Up,
    Down,
}

impl PricingEngine {
    #[must_use]
    pub fn new(price_decimals: u8, whole_unit_pricing: bool) -> Self {
        Self {
            price_decimals,
            whole_unit_pricing,
        }
    }

    #[must_use]
    pub fn from_config(config: &PresaleConfig) -> Self {
        Self::new(config.price_decimals, config.whole_unit_pricing)
    }

    /// Investment-currency cost of `tokens` presale base units.
    ///
    /// `cost = tokens * price * 10^investment_decimals
    ///         / (10^presale_decimals * 10^price_decimals)`, rounded up.
    ///
    /// # Errors
    /// - `InvalidAmount` if `tokens` or `price` is zero, or the result is
    ///   inexact under whole-unit pricing
    /// - `ArithmeticOverflow` if any intermediate exceeds `u128`
    pub fn to_investment(
        &self,
        tokens: Amount,
        price: Amount,
        presale_decimals: u8,
        investment_decimals: u8,
    ) -> Result<Amount> {
        if tokens == 0 {
            return Err(LaunchpoolError::invalid_amount("token amount must be > 0"));
        }
        if price == 0 {
            return Err(LaunchpoolError::invalid_amount("price must be > 0"));
        }
        let gross = tokens
            .checked_mul(price)
            .ok_or_else(|| LaunchpoolError::overflow("cost = tokens * price"))?;
        let up = u32::from(investment_decimals);
        let down = u32::from(presale_decimals) + u32::from(self.price_decimals);
        self.rescale(gross, up, down, 1, Round::Up, "cost")
    }

    /// Presale base units purchasable with `investment` base units.
    ///
    /// `tokens = investment * 10^presale_decimals * 10^price_decimals
    ///           / (price * 10^investment_decimals)`, rounded down.
    ///
    /// # Errors
    /// - `InvalidAmount` if `investment` or `price` is zero, if the
    ///   investment buys nothing, or the result is inexact under whole-unit
    ///   pricing
    /// - `ArithmeticOverflow` if any intermediate exceeds `u128`
    pub fn to_presale(
        &self,
        investment: Amount,
        price: Amount,
        investment_decimals: u8,
        presale_decimals: u8,
    ) -> Result<Amount> {
        if investment == 0 {
            return Err(LaunchpoolError::invalid_amount("investment amount must be > 0"));
        }
        if price == 0 {
            return Err(LaunchpoolError::invalid_amount("price must be > 0"));
        }
        let up = u32::from(presale_decimals) + u32::from(self.price_decimals);
        let down = u32::from(investment_decimals);
        let tokens = self.rescale(investment, up, down, price, Round::Down, "tokens")?;
        if tokens == 0 {
            return Err(LaunchpoolError::invalid_amount(format!(
                "investment {investment} buys less than one base unit"
            )));
        }
        Ok(tokens)
    }

    /// `value * 10^up / (divisor * 10^down)` with common powers cancelled
    /// first so intermediates stay small.
    fn rescale(
        &self,
        value: Amount,
        up: u32,
        down: u32,
        divisor: Amount,
        round: Round,
        context: &'static str,
    ) -> Result<Amount> {
        let overflow = || LaunchpoolError::overflow(context);
        let (numerator, denominator) = if up >= down {
            let scaled = pow10(up - down)
                .and_then(|f| value.checked_mul(f))
                .ok_or_else(overflow)?;
            (scaled, divisor)
        } else {
            let scaled = pow10(down - up)
                .and_then(|f| divisor.checked_mul(f))
                .ok_or_else(overflow)?;
            (value, scaled)
        };

        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder == 0 {
            return Ok(quotient);
        }
        if self.whole_unit_pricing {
            return Err(LaunchpoolError::invalid_amount(format!(
                "{context} {numerator}/{denominator} is not a whole number of base units"
            )));
        }
        match round {
            Round::Down => Ok(quotient),
            Round::Up => quotient.checked_add(1).ok_or_else(overflow),
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(0, false)
    }
}
