//! Currency conversion.
//!
//! All figures the engine reports are in JPY.  USD amounts are
//! converted with a fixed rate supplied by the caller; there is no
//! live lookup and no rounding happens here.

use crate::error::EngineError;
use crate::models::Currency;

/// Default number of yen per US dollar.
pub const DEFAULT_USD_TO_JPY: f64 = 150.0;

/// A fixed USD to JPY conversion rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate {
    usd_to_jpy: f64,
}

impl ExchangeRate {
    /// Create a rate, rejecting values that are not finite and
    /// strictly positive.
    pub fn new(usd_to_jpy: f64) -> Result<Self, EngineError> {
        if !usd_to_jpy.is_finite() || usd_to_jpy <= 0.0 {
            return Err(EngineError::InvalidExchangeRate(usd_to_jpy));
        }
        Ok(Self { usd_to_jpy })
    }

    pub fn usd_to_jpy(&self) -> f64 {
        self.usd_to_jpy
    }

    /// Convert `amount` expressed in `currency` into JPY.
    pub fn to_jpy(&self, amount: f64, currency: Currency) -> f64 {
        match currency {
            Currency::Jpy => amount,
            Currency::Usd => amount * self.usd_to_jpy,
        }
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self {
            usd_to_jpy: DEFAULT_USD_TO_JPY,
        }
    }
}
