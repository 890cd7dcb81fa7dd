//! Usage rate calculation.

use crate::models::{PricingType, Subscription};

/// Utilisation of a subscription as a whole percentage in `0..=100`.
///
/// Per-seat subscriptions are either fully used (at least one assigned
/// user) or unused; there is no seat capacity to compare against.
/// Per-license subscriptions report the share of accounts assigned to
/// a user or device, rounded half-up.
pub fn usage_rate(subscription: &Subscription) -> u8 {
    match subscription.pricing_type {
        PricingType::PerSeat => {
            if subscription.assigned_users.is_empty() {
                0
            } else {
                100
            }
        }
        PricingType::PerLicense => {
            let total = subscription.accounts.len();
            let used = subscription
                .accounts
                .iter()
                .filter(|a| a.is_in_use())
                .count();
            percentage(used, total)
        }
    }
}

/// `part / total` as a percentage rounded half-up; zero when `total` is
/// zero.  Computed in integers so exact halves always round up.
pub(crate) fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    ((200 * part + total) / (2 * total)) as u8
}
