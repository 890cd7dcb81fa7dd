//! Data models for the License Engine.
//!
//! The `models` module defines the serialisable records the engine
//! consumes (subscriptions, accounts, assigned users, employees) and
//! the derived values it produces.  Field names follow the camelCase
//! JSON shape used by the administration UI so that records coming
//! from the persistence layer can be deserialised directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

/// Whether a subscription is billed on a recurring basis or bought
/// outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Recurring billing; each account carries a billing cycle.
    Subscription,
    /// One-time purchase.  Account amounts are taken as-is and never
    /// amortised over a billing cycle.
    Perpetual,
}

/// How the price of a subscription is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingType {
    /// Each purchased account is priced and assigned independently.
    PerLicense,
    /// A single per-user price applies to every assigned user.
    PerSeat,
}

/// The two currencies the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "JPY")]
    Jpy,
    #[serde(rename = "USD")]
    Usd,
}

/// Unit of a billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingUnit {
    Day,
    Week,
    Month,
    Year,
}

/// How often an account is charged, e.g. every 1 month or every 2
/// years.  `period` must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub unit: BillingUnit,
    pub period: u32,
}

impl BillingCycle {
    pub fn new(unit: BillingUnit, period: u32) -> Self {
        Self { unit, period }
    }

    pub fn monthly() -> Self {
        Self::new(BillingUnit::Month, 1)
    }

    pub fn yearly() -> Self {
        Self::new(BillingUnit::Year, 1)
    }
}

/// A purchased unit of a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Billed amount per cycle (or the one-time price for perpetual
    /// licenses).  Never negative.
    pub amount: f64,
    pub currency: Currency,
    /// Absent cycles make the account contribute nothing to recurring
    /// monthly cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    /// Employee id of the account holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_device: Option<String>,
    /// Fields the engine does not interpret (license keys, emails...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    /// An account is in use when it is assigned to a user or a device.
    /// Empty identifiers do not count.
    pub fn is_in_use(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.assigned_user) || present(&self.assigned_device)
    }

    /// The holder's employee id, if one is set and non-empty.
    pub fn holder(&self) -> Option<&str> {
        self.assigned_user.as_deref().filter(|s| !s.is_empty())
    }
}

/// An employee holding a seat of a per-seat subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedUser {
    pub employee_id: String,
    /// Assignment date as an ISO 8601 string (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assigned_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Uniform per-user price of a per-seat subscription.  When both
/// prices are set the monthly one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerUserPricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly: Option<f64>,
    pub currency: Currency,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PerUserPricing {
    /// Monthly price per user in the pricing currency.  Falls back to
    /// a twelfth of the yearly price, and to zero when neither is set.
    pub fn monthly_price(&self) -> f64 {
        self.monthly
            .unwrap_or_else(|| self.yearly.unwrap_or(0.0) / 12.0)
    }
}

/// A software subscription or license as stored by the administration
/// tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub status: SubscriptionStatus,
    pub license_type: LicenseType,
    pub pricing_type: PricingType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Account>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_users: Vec<AssignedUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_user_pricing: Option<PerUserPricing>,
    /// Any other fields on the record (vendor, notes, renewal dates...).
    /// They are opaque to the engine and re-emitted unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// An employee from the external directory.  The engine only looks at
/// the grouping attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Monthly cost and usage rate of a single subscription, as shown in
/// list views and charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionMetrics {
    pub id: String,
    pub name: String,
    /// Monthly-equivalent cost in JPY, rounded to an integer.
    pub monthly_cost: f64,
    pub usage_rate: u8,
}

/// A subscription augmented with its usage rate.  This is the payload
/// embedded into the subscription-insight prompt, so the subscription
/// fields are flattened and preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithUsage {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub usage_rate: u8,
}

/// Total monthly cost attributed to one group (department, location,
/// project...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedCost {
    pub name: String,
    pub total_cost: f64,
}

/// Portfolio-wide figures for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_monthly_cost: f64,
    pub total_yearly_cost: f64,
    /// Monthly cost of active subscriptions only.
    pub active_monthly_cost: f64,
    pub subscription_count: usize,
    pub active_count: usize,
    /// Rounded mean usage rate over active subscriptions.
    pub average_usage_rate: u8,
}

/// An under-utilised active subscription, input to the
/// license-optimisation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationCandidate {
    pub id: String,
    pub name: String,
    pub usage_rate: u8,
    pub monthly_cost: f64,
    /// Monthly cost of the capacity nobody is using.
    pub idle_monthly_cost: f64,
}
