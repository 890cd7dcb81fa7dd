//! Engine error types and input validation.
//!
//! The computations themselves never fail: missing data degrades to
//! zero or to the unassigned bucket.  Records that break the
//! structural preconditions (negative amounts, zero billing periods,
//! non-finite numbers) would otherwise surface as NaN or infinity, so
//! callers that cannot trust their input run [`validate_subscription`]
//! first.

use crate::models::Subscription;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("account {account} of subscription {subscription} has a negative amount ({amount})")]
    NegativeAmount {
        subscription: String,
        account: String,
        amount: f64,
    },

    #[error("account {account} of subscription {subscription} has a non-finite amount")]
    NonFiniteAmount {
        subscription: String,
        account: String,
    },

    #[error("account {account} of subscription {subscription} has a billing period of zero")]
    ZeroPeriod {
        subscription: String,
        account: String,
    },

    #[error("per-user pricing of subscription {subscription} is negative or non-finite")]
    InvalidPerUserPrice { subscription: String },

    #[error("exchange rate must be finite and positive, got {0}")]
    InvalidExchangeRate(f64),

    #[error("record {index} is not a valid subscription: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },
}

fn valid_price(value: Option<f64>) -> bool {
    value.map_or(true, |v| v.is_finite() && v >= 0.0)
}

/// Check the structural preconditions of a subscription.
pub fn validate_subscription(subscription: &Subscription) -> Result<(), EngineError> {
    for (index, account) in subscription.accounts.iter().enumerate() {
        let label = || account.id.clone().unwrap_or_else(|| format!("#{index}"));
        if !account.amount.is_finite() {
            return Err(EngineError::NonFiniteAmount {
                subscription: subscription.id.clone(),
                account: label(),
            });
        }
        if account.amount < 0.0 {
            return Err(EngineError::NegativeAmount {
                subscription: subscription.id.clone(),
                account: label(),
                amount: account.amount,
            });
        }
        if account.billing_cycle.is_some_and(|c| c.period == 0) {
            return Err(EngineError::ZeroPeriod {
                subscription: subscription.id.clone(),
                account: label(),
            });
        }
    }
    if let Some(pricing) = &subscription.per_user_pricing {
        if !valid_price(pricing.monthly) || !valid_price(pricing.yearly) {
            return Err(EngineError::InvalidPerUserPrice {
                subscription: subscription.id.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a whole collection, stopping at the first violation.
pub fn validate_all(subscriptions: &[Subscription]) -> Result<(), EngineError> {
    subscriptions.iter().try_for_each(validate_subscription)
}
