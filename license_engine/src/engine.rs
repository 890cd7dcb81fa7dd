//! Subscription cost engine.
//!
//! The `engine` module ties the normaliser, converter, usage
//! calculator and aggregator together behind [`CostEngine`], which
//! carries the configuration (exchange rate, unassigned label,
//! under-utilisation threshold) so callers do not have to thread it
//! through every call.  Batch operations use [`rayon`] to compute
//! per-subscription figures across CPU cores; results keep the input
//! order and every sum is taken sequentially, so repeated calls on the
//! same input return identical output.

use crate::config::EngineConfig;
use crate::cost::{self, Dimension, EmployeeDirectory, GroupingKey};
use crate::currency::ExchangeRate;
use crate::error::{validate_subscription, EngineError};
use crate::models::{
    Employee, GroupedCost, OptimizationCandidate, PortfolioSummary, Subscription,
    SubscriptionMetrics, SubscriptionWithUsage,
};
use crate::usage;
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

/// Computes costs and usage for subscription collections.
#[derive(Debug, Clone)]
pub struct CostEngine {
    rate: ExchangeRate,
    unassigned_label: String,
    underutilized_threshold: u8,
}

impl Default for CostEngine {
    fn default() -> Self {
        Self {
            rate: ExchangeRate::default(),
            unassigned_label: EngineConfig::default().unassigned_label,
            underutilized_threshold: EngineConfig::default().underutilized_threshold,
        }
    }
}

impl CostEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            rate: config.exchange_rate()?,
            unassigned_label: config.unassigned_label.clone(),
            underutilized_threshold: config.underutilized_threshold,
        })
    }

    pub fn with_rate(rate: ExchangeRate) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    /// Monthly cost of one subscription in JPY, rounded to an integer.
    pub fn monthly_cost(&self, subscription: &Subscription) -> f64 {
        cost::monthly_cost(subscription, &self.rate)
    }

    pub fn usage_rate(&self, subscription: &Subscription) -> u8 {
        usage::usage_rate(subscription)
    }

    /// Cost and usage of every subscription, in input order.
    pub fn metrics(&self, subscriptions: &[Subscription]) -> Vec<SubscriptionMetrics> {
        debug!(count = subscriptions.len(), "Computing subscription metrics");
        subscriptions
            .par_iter()
            .map(|s| SubscriptionMetrics {
                id: s.id.clone(),
                name: s.name.clone(),
                monthly_cost: self.monthly_cost(s),
                usage_rate: self.usage_rate(s),
            })
            .collect()
    }

    /// Copy of `subscriptions` with each record's usage rate attached.
    pub fn with_usage_rates(&self, subscriptions: &[Subscription]) -> Vec<SubscriptionWithUsage> {
        subscriptions
            .par_iter()
            .map(|s| SubscriptionWithUsage {
                subscription: s.clone(),
                usage_rate: self.usage_rate(s),
            })
            .collect()
    }

    /// Stored subscription records, exactly as received, each with a
    /// `usageRate` field added.  Records are parsed and validated only
    /// to compute the rate; everything else passes through untouched,
    /// including fields the engine does not model and explicit nulls.
    pub fn annotate_usage(&self, records: &[Value]) -> Result<Vec<Value>, EngineError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let subscription: Subscription = serde_json::from_value(record.clone())
                    .map_err(|err| EngineError::InvalidRecord {
                        index,
                        reason: err.to_string(),
                    })?;
                validate_subscription(&subscription)?;
                let mut annotated = record.clone();
                if let Value::Object(fields) = &mut annotated {
                    fields.insert("usageRate".into(), Value::from(self.usage_rate(&subscription)));
                }
                Ok(annotated)
            })
            .collect()
    }

    /// The usage-augmented records as the JSON string embedded into the
    /// subscription-insight prompt.
    pub fn insight_payload(&self, records: &[Value]) -> Result<String, EngineError> {
        Ok(Value::Array(self.annotate_usage(records)?).to_string())
    }

    /// Grouped totals using an arbitrary grouping key.
    pub fn grouped_cost<K>(&self, subscriptions: &[Subscription], key: &K) -> Vec<GroupedCost>
    where
        K: GroupingKey + ?Sized,
    {
        cost::grouped_cost(subscriptions, &self.rate, key, &self.unassigned_label)
    }

    /// Grouped totals by an employee attribute.
    pub fn grouped_cost_by(
        &self,
        subscriptions: &[Subscription],
        employees: &[Employee],
        dimension: Dimension,
    ) -> Vec<GroupedCost> {
        debug!(
            subscriptions = subscriptions.len(),
            employees = employees.len(),
            ?dimension,
            "Grouping monthly cost"
        );
        let directory = EmployeeDirectory::new(employees, dimension);
        self.grouped_cost(subscriptions, &directory)
    }

    /// Portfolio-wide totals for dashboards.
    pub fn summary(&self, subscriptions: &[Subscription]) -> PortfolioSummary {
        let metrics: Vec<(bool, f64, u8)> = subscriptions
            .par_iter()
            .map(|s| (s.is_active(), self.monthly_cost(s), self.usage_rate(s)))
            .collect();

        let total_monthly_cost: f64 = metrics.iter().map(|m| m.1).sum();
        let active: Vec<_> = metrics.iter().filter(|m| m.0).collect();
        let active_monthly_cost: f64 = active.iter().map(|m| m.1).sum();
        let average_usage_rate = if active.is_empty() {
            0
        } else {
            let total: u32 = active.iter().map(|m| u32::from(m.2)).sum();
            (f64::from(total) / active.len() as f64).round() as u8
        };

        PortfolioSummary {
            total_monthly_cost,
            total_yearly_cost: total_monthly_cost * 12.0,
            active_monthly_cost,
            subscription_count: subscriptions.len(),
            active_count: active.len(),
            average_usage_rate,
        }
    }

    /// Active subscriptions used below the configured threshold,
    /// most idle spend first.
    pub fn optimization_candidates(&self, subscriptions: &[Subscription]) -> Vec<OptimizationCandidate> {
        let mut candidates: Vec<OptimizationCandidate> = subscriptions
            .par_iter()
            .filter(|s| s.is_active())
            .filter_map(|s| {
                let usage_rate = self.usage_rate(s);
                if usage_rate >= self.underutilized_threshold {
                    return None;
                }
                Some(OptimizationCandidate {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    usage_rate,
                    monthly_cost: self.monthly_cost(s),
                    idle_monthly_cost: cost::idle_monthly_cost(s, &self.rate),
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.idle_monthly_cost.total_cmp(&a.idle_monthly_cost));
        candidates
    }
}
