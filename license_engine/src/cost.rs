//! Monthly cost computation and aggregation.
//!
//! Every subscription is reduced to a monthly-equivalent cost in JPY
//! using one of three rules, picked in priority order:
//!
//! 1. perpetual licenses contribute the flat amount of each account;
//! 2. per-seat subscriptions with per-user pricing contribute the
//!    monthly per-user price for every assigned user;
//! 3. everything else sums the normalised billing cycle of each
//!    account, skipping accounts without a cycle.
//!
//! The total is rounded to an integer once, at the subscription level.
//! Grouped views split that rounded total across the account (or seat)
//! holders with largest-remainder allocation and attribute the integer
//! parts to groups through a caller-supplied [`GroupingKey`], so the
//! grouped totals always add up to the sum of the per-subscription
//! figures.

use crate::billing::{monthly_equivalent, monthly_equivalent_opt};
use crate::currency::ExchangeRate;
use crate::models::{Employee, GroupedCost, LicenseType, PricingType, Subscription};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps the holder of a cost (an employee id, or nobody) to the name
/// of the group the cost is attributed to.  `None` sends the cost to
/// the unassigned bucket.
pub trait GroupingKey {
    fn group_of(&self, employee_id: Option<&str>) -> Option<String>;
}

impl<F> GroupingKey for F
where
    F: Fn(Option<&str>) -> Option<String>,
{
    fn group_of(&self, employee_id: Option<&str>) -> Option<String> {
        self(employee_id)
    }
}

/// Employee attribute used to group costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Department,
    Location,
    Project,
}

/// A [`GroupingKey`] backed by an employee list.  Unknown employees and
/// employees without a value for the dimension are unassigned.
#[derive(Debug, Clone)]
pub struct EmployeeDirectory {
    employees: HashMap<String, Employee>,
    dimension: Dimension,
}

impl EmployeeDirectory {
    pub fn new(employees: &[Employee], dimension: Dimension) -> Self {
        let employees = employees
            .iter()
            .map(|e| (e.id.clone(), e.clone()))
            .collect();
        Self {
            employees,
            dimension,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }
}

impl GroupingKey for EmployeeDirectory {
    fn group_of(&self, employee_id: Option<&str>) -> Option<String> {
        let employee = self.employees.get(employee_id?)?;
        let value = match self.dimension {
            Dimension::Department => &employee.department,
            Dimension::Location => &employee.location,
            Dimension::Project => &employee.project,
        };
        value.as_ref().filter(|v| !v.is_empty()).cloned()
    }
}

/// Monthly cost of `subscription` in JPY, rounded to an integer.
pub fn monthly_cost(subscription: &Subscription, rate: &ExchangeRate) -> f64 {
    raw_monthly_cost(subscription, rate).round()
}

/// Unrounded monthly cost.
fn raw_monthly_cost(subscription: &Subscription, rate: &ExchangeRate) -> f64 {
    if subscription.license_type == LicenseType::Perpetual {
        return subscription
            .accounts
            .iter()
            .map(|a| rate.to_jpy(a.amount, a.currency))
            .sum();
    }
    match subscription.pricing_type {
        PricingType::PerSeat => match &subscription.per_user_pricing {
            Some(pricing) => {
                let per_user = rate.to_jpy(pricing.monthly_price(), pricing.currency);
                per_user * subscription.assigned_users.len() as f64
            }
            None => 0.0,
        },
        PricingType::PerLicense => subscription
            .accounts
            .iter()
            .map(|a| monthly_equivalent_opt(rate.to_jpy(a.amount, a.currency), a.billing_cycle.as_ref()))
            .sum(),
    }
}

/// Each monthly cost contribution of `subscription` together with the
/// employee it belongs to, following the same rules as
/// [`monthly_cost`].
pub fn attributed_costs<'a>(
    subscription: &'a Subscription,
    rate: &ExchangeRate,
) -> Vec<(Option<&'a str>, f64)> {
    if subscription.license_type == LicenseType::Perpetual {
        return subscription
            .accounts
            .iter()
            .map(|a| (a.holder(), rate.to_jpy(a.amount, a.currency)))
            .collect();
    }
    match subscription.pricing_type {
        PricingType::PerSeat => {
            let Some(pricing) = &subscription.per_user_pricing else {
                return Vec::new();
            };
            let per_user = rate.to_jpy(pricing.monthly_price(), pricing.currency);
            subscription
                .assigned_users
                .iter()
                .map(|u| (Some(u.employee_id.as_str()).filter(|id| !id.is_empty()), per_user))
                .collect()
        }
        PricingType::PerLicense => subscription
            .accounts
            .iter()
            .filter_map(|a| {
                let cycle = a.billing_cycle.as_ref()?;
                let jpy = rate.to_jpy(a.amount, a.currency);
                Some((a.holder(), monthly_equivalent(jpy, cycle)))
            })
            .collect(),
    }
}

/// [`attributed_costs`] with every contribution rounded to an integer
/// so that the parts add up exactly to [`monthly_cost`].  Each part
/// gets its floor, then the units left over go one at a time to the
/// parts with the largest fractional remainder; equal remainders are
/// served in account (or seat) order.
pub fn allocated_costs<'a>(
    subscription: &'a Subscription,
    rate: &ExchangeRate,
) -> Vec<(Option<&'a str>, f64)> {
    let mut parts = attributed_costs(subscription, rate);
    if parts.is_empty() {
        return parts;
    }
    let total = monthly_cost(subscription, rate);
    let mut by_remainder: Vec<(usize, f64)> = parts
        .iter()
        .map(|(_, cost)| cost - cost.floor())
        .enumerate()
        .collect();
    by_remainder.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (_, cost) in &mut parts {
        *cost = cost.floor();
    }

    let floored: f64 = parts.iter().map(|(_, cost)| cost).sum();
    let left_over = (total - floored) as i64;
    let step = if left_over < 0 { -1.0 } else { 1.0 };
    for n in 0..left_over.unsigned_abs() as usize {
        let (i, _) = by_remainder[n % by_remainder.len()];
        parts[i].1 += step;
    }
    parts
}

/// Monthly cost of the capacity of `subscription` that nobody uses:
/// unassigned accounts for per-license (and perpetual) subscriptions,
/// the whole cost of a per-seat subscription without seats.
pub fn idle_monthly_cost(subscription: &Subscription, rate: &ExchangeRate) -> f64 {
    if subscription.license_type != LicenseType::Perpetual
        && subscription.pricing_type == PricingType::PerSeat
    {
        return if subscription.assigned_users.is_empty() {
            monthly_cost(subscription, rate)
        } else {
            0.0
        };
    }
    let perpetual = subscription.license_type == LicenseType::Perpetual;
    subscription
        .accounts
        .iter()
        .filter(|a| !a.is_in_use())
        .map(|a| {
            let jpy = rate.to_jpy(a.amount, a.currency);
            if perpetual {
                jpy
            } else {
                monthly_equivalent_opt(jpy, a.billing_cycle.as_ref())
            }
        })
        .sum::<f64>()
        .round()
}

/// Total monthly cost per group, sorted by total descending.  Groups
/// with equal totals keep the order in which they were first seen.
/// Costs whose holder has no group go to `unassigned_label`.  The
/// totals sum to the sum of [`monthly_cost`] over `subscriptions`.
pub fn grouped_cost<K>(
    subscriptions: &[Subscription],
    rate: &ExchangeRate,
    key: &K,
    unassigned_label: &str,
) -> Vec<GroupedCost>
where
    K: GroupingKey + ?Sized,
{
    let mut groups: Vec<GroupedCost> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for subscription in subscriptions {
        for (holder, cost) in allocated_costs(subscription, rate) {
            let name = key
                .group_of(holder)
                .unwrap_or_else(|| unassigned_label.to_string());
            match index.get(&name) {
                Some(&i) => groups[i].total_cost += cost,
                None => {
                    index.insert(name.clone(), groups.len());
                    groups.push(GroupedCost {
                        name,
                        total_cost: cost,
                    });
                }
            }
        }
    }

    // sort_by is stable, so ties stay in first-seen order
    groups.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn account(amount: f64, currency: Currency, cycle: Option<BillingCycle>, user: Option<&str>) -> Account {
        Account {
            id: None,
            amount,
            currency,
            billing_cycle: cycle,
            assigned_user: user.map(Into::into),
            assigned_device: None,
            extra: Default::default(),
        }
    }

    fn subscription(license_type: LicenseType, pricing_type: PricingType) -> Subscription {
        Subscription {
            id: "s".into(),
            name: "S".into(),
            status: SubscriptionStatus::Active,
            license_type,
            pricing_type,
            accounts: Vec::new(),
            assigned_users: Vec::new(),
            per_user_pricing: None,
            extra: Default::default(),
        }
    }

    fn seat(id: &str) -> AssignedUser {
        AssignedUser {
            employee_id: id.into(),
            assigned_at: "2024-01-01".into(),
            extra: Default::default(),
        }
    }

    fn employee(id: &str, department: Option<&str>) -> Employee {
        Employee {
            id: id.into(),
            name: id.to_uppercase(),
            department: department.map(Into::into),
            location: Some("Tokyo".into()),
            project: None,
        }
    }

    #[test]
    fn test_per_license_sums_normalised_accounts() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerLicense);
        sub.accounts = vec![
            account(1200.0, Currency::Jpy, Some(BillingCycle::yearly()), None),
            account(10.0, Currency::Usd, Some(BillingCycle::monthly()), None),
            account(99_999.0, Currency::Jpy, None, None),
        ];
        assert_eq!(monthly_cost(&sub, &rate), 1600.0);
    }

    #[test]
    fn test_rounds_once_at_subscription_level() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerLicense);
        // 101/3 = 33.67 each; per-account rounding would give 102
        let cycle = Some(BillingCycle::new(BillingUnit::Month, 3));
        sub.accounts = vec![
            account(101.0, Currency::Jpy, cycle, None),
            account(101.0, Currency::Jpy, cycle, None),
            account(101.0, Currency::Jpy, cycle, None),
        ];
        assert_eq!(monthly_cost(&sub, &rate), 101.0);
    }

    #[test]
    fn test_per_seat_ignores_account_billing() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerSeat);
        sub.accounts = vec![account(5000.0, Currency::Jpy, Some(BillingCycle::monthly()), None)];
        sub.assigned_users = vec![seat("e1"), seat("e2")];
        assert_eq!(monthly_cost(&sub, &rate), 0.0);

        sub.per_user_pricing = Some(PerUserPricing {
            monthly: None,
            yearly: Some(120.0),
            currency: Currency::Usd,
            extra: Default::default(),
        });
        assert_eq!(monthly_cost(&sub, &rate), 3000.0);
    }

    #[test]
    fn test_perpetual_is_flat() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Perpetual, PricingType::PerSeat);
        sub.accounts = vec![account(30_000.0, Currency::Jpy, Some(BillingCycle::yearly()), None)];
        sub.assigned_users = vec![seat("e1")];
        sub.per_user_pricing = Some(PerUserPricing {
            monthly: Some(1.0),
            yearly: None,
            currency: Currency::Jpy,
            extra: Default::default(),
        });
        assert_eq!(monthly_cost(&sub, &rate), 30_000.0);
    }

    #[test]
    fn test_idle_cost() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerLicense);
        sub.accounts = vec![
            account(1000.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("e1")),
            account(1000.0, Currency::Jpy, Some(BillingCycle::monthly()), None),
        ];
        assert_eq!(idle_monthly_cost(&sub, &rate), 1000.0);

        let mut seats = subscription(LicenseType::Subscription, PricingType::PerSeat);
        seats.per_user_pricing = Some(PerUserPricing {
            monthly: Some(500.0),
            yearly: None,
            currency: Currency::Jpy,
            extra: Default::default(),
        });
        assert_eq!(idle_monthly_cost(&seats, &rate), 0.0);
        seats.assigned_users.push(seat("e1"));
        assert_eq!(idle_monthly_cost(&seats, &rate), 0.0);
    }

    #[test]
    fn test_grouped_by_department() {
        let rate = ExchangeRate::default();
        let employees = vec![
            employee("e1", Some("Engineering")),
            employee("e2", Some("Sales")),
            employee("e3", None),
        ];
        let directory = EmployeeDirectory::new(&employees, Dimension::Department);

        let mut licenses = subscription(LicenseType::Subscription, PricingType::PerLicense);
        licenses.accounts = vec![
            account(3000.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("e1")),
            account(1000.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("e2")),
            account(500.0, Currency::Jpy, Some(BillingCycle::monthly()), None),
        ];
        let mut seats = subscription(LicenseType::Subscription, PricingType::PerSeat);
        seats.per_user_pricing = Some(PerUserPricing {
            monthly: Some(10.0),
            yearly: None,
            currency: Currency::Usd,
            extra: Default::default(),
        });
        seats.assigned_users = vec![seat("e2"), seat("e3"), seat("ghost")];

        let grouped = grouped_cost(&[licenses, seats], &rate, &directory, "Unassigned");
        assert_eq!(
            grouped,
            vec![
                GroupedCost { name: "Unassigned".into(), total_cost: 3500.0 },
                GroupedCost { name: "Engineering".into(), total_cost: 3000.0 },
                GroupedCost { name: "Sales".into(), total_cost: 2500.0 },
            ]
        );
    }

    #[test]
    fn test_grouped_fractional_costs_add_up_to_subscription_total() {
        let rate = ExchangeRate::default();
        let quarterly = Some(BillingCycle::new(BillingUnit::Month, 3));
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerLicense);
        sub.accounts = vec![
            account(100.0, Currency::Jpy, quarterly, Some("e1")),
            account(100.0, Currency::Jpy, quarterly, Some("e2")),
        ];
        let employees = vec![employee("e1", Some("A")), employee("e2", Some("B"))];
        let directory = EmployeeDirectory::new(&employees, Dimension::Department);

        assert_eq!(monthly_cost(&sub, &rate), 67.0);
        let grouped = grouped_cost(std::slice::from_ref(&sub), &rate, &directory, "Unassigned");
        assert_eq!(
            grouped,
            vec![
                GroupedCost { name: "A".into(), total_cost: 34.0 },
                GroupedCost { name: "B".into(), total_cost: 33.0 },
            ]
        );
    }

    #[test]
    fn test_allocation_favours_largest_remainder() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Perpetual, PricingType::PerLicense);
        sub.accounts = vec![
            account(10.25, Currency::Jpy, None, Some("a")),
            account(10.75, Currency::Jpy, None, Some("b")),
            account(10.5, Currency::Jpy, None, Some("c")),
        ];
        // 31.5 rounds to 32: floors give 30, the two largest remainders get the rest
        let parts = allocated_costs(&sub, &rate);
        assert_eq!(
            parts,
            vec![(Some("a"), 10.0), (Some("b"), 11.0), (Some("c"), 11.0)]
        );
        assert!(allocated_costs(&subscription(LicenseType::Subscription, PricingType::PerSeat), &rate).is_empty());
    }

    #[test]
    fn test_grouped_ties_keep_first_seen_order() {
        let rate = ExchangeRate::default();
        let mut sub = subscription(LicenseType::Subscription, PricingType::PerLicense);
        sub.accounts = vec![
            account(100.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("b")),
            account(100.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("a")),
            account(100.0, Currency::Jpy, Some(BillingCycle::monthly()), Some("c")),
        ];
        let key = |id: Option<&str>| id.map(|s| s.to_uppercase());
        let grouped = grouped_cost(&[sub], &rate, &key, "Unassigned");
        let names: Vec<_> = grouped.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn test_directory_dimensions() {
        let employees = vec![employee("e1", Some(""))];
        let by_department = EmployeeDirectory::new(&employees, Dimension::Department);
        let by_location = EmployeeDirectory::new(&employees, Dimension::Location);
        let by_project = EmployeeDirectory::new(&employees, Dimension::Project);
        assert_eq!(by_department.group_of(Some("e1")), None);
        assert_eq!(by_location.group_of(Some("e1")), Some("Tokyo".into()));
        assert_eq!(by_project.group_of(Some("e1")), None);
        assert_eq!(by_location.group_of(Some("missing")), None);
        assert_eq!(by_location.group_of(None), None);
    }
}
