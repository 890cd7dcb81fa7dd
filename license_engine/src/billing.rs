//! Billing cycle normalisation.
//!
//! Converts an amount billed every `period` `unit`s into a monthly
//! equivalent in the same currency.  The conversion uses fixed
//! calendar approximations: a month is 30 days or 4 weeks, a year is
//! 12 months.  These do not agree with each other (a 360-day year
//! versus 48 weeks); the figures are reproduced as-is.

use crate::models::{BillingCycle, BillingUnit};

/// Days per month used by the day rule.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Weeks per month used by the week rule.
pub const WEEKS_PER_MONTH: f64 = 4.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Monthly equivalent of `amount` billed on `cycle`.
///
/// `cycle.period` must be at least 1; a zero period is a precondition
/// violation caught by [`crate::error::validate_subscription`] and
/// yields an infinite result here rather than a panic.
#[must_use]
pub fn monthly_equivalent(amount: f64, cycle: &BillingCycle) -> f64 {
    let period = f64::from(cycle.period);
    match cycle.unit {
        BillingUnit::Day => amount / period * DAYS_PER_MONTH,
        BillingUnit::Week => amount / period * WEEKS_PER_MONTH,
        BillingUnit::Month => amount / period,
        BillingUnit::Year => amount / (period * MONTHS_PER_YEAR),
    }
}

/// Like [`monthly_equivalent`] but treats an absent cycle as no
/// recurring charge.
#[must_use]
pub fn monthly_equivalent_opt(amount: f64, cycle: Option<&BillingCycle>) -> f64 {
    cycle.map_or(0.0, |c| monthly_equivalent(amount, c))
}
