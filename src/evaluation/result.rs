//! Evaluation output records
//!
//! Constructed fresh on every evaluation and serializable for report and
//! chart consumers. The per-underlying records carry a fully-populated
//! `SecurityData` copy; writing that cache back to the product store is the
//! caller's job, never the engine's.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::product::{ProductFamily, SecurityData};
use super::lifecycle::{Lifecycle, LifecycleStatus};
use super::orion::OrionEvaluation;
use super::participation::ParticipationEvaluation;
use super::resolver::ResolvedPrices;

/// One underlying after price resolution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedUnderlying {
    pub ticker: String,
    pub full_ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    pub strike: Option<f64>,
    pub prices: ResolvedPrices,
    /// Percent move of the evaluation price over the initial level
    pub performance: Option<f64>,
    /// Refreshed price cache for the caller to persist
    pub security_data: SecurityData,
}

/// Family-specific payoff breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Payoff {
    Orion(OrionEvaluation),
    Participation(ParticipationEvaluation),
}

/// Complete evaluation of one product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub product_id: String,
    pub display_name: String,
    pub family: ProductFamily,
    pub lifecycle: Lifecycle,
    pub underlyings: Vec<EvaluatedUnderlying>,
    /// The family's headline basket figure: averaged considered performance
    /// for Orion, mode-aggregated performance for participation notes
    pub basket_performance: Option<f64>,
    pub payoff: Payoff,
    /// What could not be resolved, one entry per gap. Empty means every
    /// figure above is backed by authoritative data.
    pub unresolved: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn status(&self) -> LifecycleStatus {
        self.lifecycle.status
    }

    /// Whether any input data gap degraded this evaluation
    pub fn is_indeterminate(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Headline redemption estimate in percent of notional
    pub fn redemption_estimate(&self) -> Option<f64> {
        match &self.payoff {
            Payoff::Orion(orion) => orion.capital_return,
            Payoff::Participation(participation) => participation.redemption,
        }
    }
}
