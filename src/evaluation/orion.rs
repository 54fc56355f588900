//! Orion payoff calculation
//!
//! An Orion note substitutes a fixed rebate for an underlying's performance
//! once its upper barrier has been touched anywhere along the historical
//! path, averages the substituted performances across the basket, and
//! projects an indicative maturity value with capital protection that holds
//! only while the worst performer stays above the lower barrier.

use serde::Serialize;

use crate::product::OrionParams;
use super::lookback::BarrierScan;

/// How many underlyings touched the upper barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarrierHitStatus {
    All,
    None,
    Partial,
}

impl std::fmt::Display for BarrierHitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarrierHitStatus::All => write!(f, "all"),
            BarrierHitStatus::None => write!(f, "none"),
            BarrierHitStatus::Partial => write!(f, "partial"),
        }
    }
}

/// Per-underlying Orion figures
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrionUnderlyingOutcome {
    pub ticker: String,
    /// Raw performance in percent, absent when no authoritative price resolved
    pub performance: Option<f64>,
    /// Rebate when the barrier was touched, raw performance otherwise
    pub considered_performance: Option<f64>,
    pub hit_upper_barrier: bool,
    pub hit_lower_barrier: bool,
    pub barrier_scan: BarrierScan,
}

impl OrionUnderlyingOutcome {
    pub fn new(
        ticker: String,
        performance: Option<f64>,
        scan: BarrierScan,
        params: &OrionParams,
    ) -> Self {
        let hit_upper_barrier = scan.touched();
        let considered_performance = if hit_upper_barrier {
            Some(params.rebate)
        } else {
            performance
        };
        let hit_lower_barrier = performance
            .map(|p| p <= params.lower_threshold())
            .unwrap_or(false);
        Self {
            ticker,
            performance,
            considered_performance,
            hit_upper_barrier,
            hit_lower_barrier,
            barrier_scan: scan,
        }
    }
}

/// Full Orion evaluation for one product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrionEvaluation {
    pub params: OrionParams,
    pub underlyings: Vec<OrionUnderlyingOutcome>,
    /// Average of considered performances across the basket
    pub basket_considered_performance: Option<f64>,
    pub worst_performance: Option<f64>,
    /// Whether the worst performer is at or above the lower threshold
    pub protection_intact: Option<bool>,
    /// Indicative maturity value in percent of notional
    pub capital_return: Option<f64>,
    pub upper_barrier_hits: usize,
    pub barrier_hit_status: BarrierHitStatus,
}

/// Combine per-underlying outcomes into the basket-level Orion result.
///
/// Basket figures require every underlying to have resolved: averaging over
/// a partial basket would silently misstate the payoff, so a single missing
/// performance leaves the basket figures unset.
pub fn evaluate_orion(
    params: OrionParams,
    underlyings: Vec<OrionUnderlyingOutcome>,
) -> OrionEvaluation {
    let upper_barrier_hits = underlyings.iter().filter(|u| u.hit_upper_barrier).count();
    let barrier_hit_status = if underlyings.is_empty() || upper_barrier_hits == 0 {
        BarrierHitStatus::None
    } else if upper_barrier_hits == underlyings.len() {
        BarrierHitStatus::All
    } else {
        BarrierHitStatus::Partial
    };

    let considered: Option<Vec<f64>> = underlyings
        .iter()
        .map(|u| u.considered_performance)
        .collect();
    let basket_considered_performance = considered
        .filter(|v| !v.is_empty())
        .map(|v| v.iter().sum::<f64>() / v.len() as f64);

    let raw: Option<Vec<f64>> = underlyings.iter().map(|u| u.performance).collect();
    let worst_performance = raw
        .filter(|v| !v.is_empty())
        .map(|v| v.iter().copied().fold(f64::INFINITY, f64::min));

    let lower_threshold = params.lower_threshold();
    let protection_intact = worst_performance.map(|w| w >= lower_threshold);
    let capital_return = match (worst_performance, basket_considered_performance) {
        // Protection intact: par plus the averaged considered performance
        (Some(worst), Some(basket)) if worst >= lower_threshold => Some(100.0 + basket),
        // Breach: full downside participation in the worst performer, no floor
        (Some(worst), _) if worst < lower_threshold => Some(100.0 + worst),
        _ => None,
    };

    OrionEvaluation {
        params,
        underlyings,
        basket_considered_performance,
        worst_performance,
        protection_intact,
        capital_return,
        upper_barrier_hits,
        barrier_hit_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use crate::evaluation::lookback::ScanGap;

    fn params() -> OrionParams {
        OrionParams {
            upper_barrier: 150.0,
            lower_barrier: 70.0,
            rebate: 8.0,
            ..OrionParams::default()
        }
    }

    fn not_touched(max: f64) -> BarrierScan {
        BarrierScan::NotTouched { max_close: max }
    }

    fn touched() -> BarrierScan {
        BarrierScan::Touched {
            date: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            close: 151.0,
        }
    }

    #[test]
    fn test_raw_performance_kept_when_barrier_untouched() {
        let p = params();
        let outcome =
            OrionUnderlyingOutcome::new("AAPL.US".into(), Some(20.0), not_touched(140.0), &p);
        assert!(!outcome.hit_upper_barrier);
        assert_eq!(outcome.considered_performance, Some(20.0));
    }

    #[test]
    fn test_rebate_substituted_on_touch() {
        let p = params();
        let outcome = OrionUnderlyingOutcome::new("AAPL.US".into(), Some(20.0), touched(), &p);
        assert!(outcome.hit_upper_barrier);
        // The rebate replaces the actual +20% performance
        assert_eq!(outcome.considered_performance, Some(8.0));
    }

    #[test]
    fn test_protected_branch_uses_basket_considered() {
        let p = params();
        let outcomes = vec![
            OrionUnderlyingOutcome::new("A".into(), Some(20.0), touched(), &p),
            OrionUnderlyingOutcome::new("B".into(), Some(-10.0), not_touched(120.0), &p),
        ];
        let result = evaluate_orion(p, outcomes);

        // considered = [8, -10], average -1
        assert_relative_eq!(result.basket_considered_performance.unwrap(), -1.0);
        assert_eq!(result.worst_performance, Some(-10.0));
        assert_eq!(result.protection_intact, Some(true));
        assert_relative_eq!(result.capital_return.unwrap(), 99.0);
        assert_eq!(result.barrier_hit_status, BarrierHitStatus::Partial);
        assert_eq!(result.upper_barrier_hits, 1);
    }

    #[test]
    fn test_worst_on_threshold_is_protected() {
        let p = params();
        // lower barrier 70 => threshold -30; worst exactly -30 stays protected
        let outcomes = vec![
            OrionUnderlyingOutcome::new("A".into(), Some(-30.0), not_touched(90.0), &p),
            OrionUnderlyingOutcome::new("B".into(), Some(5.0), not_touched(110.0), &p),
        ];
        let result = evaluate_orion(p, outcomes);
        assert_eq!(result.protection_intact, Some(true));
        assert_relative_eq!(result.capital_return.unwrap(), 100.0 + (-30.0 + 5.0) / 2.0);
    }

    #[test]
    fn test_breach_participates_fully_in_worst() {
        let p = params();
        let outcomes = vec![
            OrionUnderlyingOutcome::new("A".into(), Some(-42.5), not_touched(80.0), &p),
            OrionUnderlyingOutcome::new("B".into(), Some(12.0), touched(), &p),
        ];
        let result = evaluate_orion(p, outcomes);
        assert_eq!(result.protection_intact, Some(false));
        // No floor: 100 - 42.5
        assert_relative_eq!(result.capital_return.unwrap(), 57.5);
        assert!(result.underlyings[0].hit_lower_barrier);
    }

    #[test]
    fn test_all_and_none_hit_status() {
        let p = params();
        let all = evaluate_orion(
            p.clone(),
            vec![
                OrionUnderlyingOutcome::new("A".into(), Some(60.0), touched(), &p),
                OrionUnderlyingOutcome::new("B".into(), Some(55.0), touched(), &p),
            ],
        );
        assert_eq!(all.barrier_hit_status, BarrierHitStatus::All);

        let none = evaluate_orion(
            p.clone(),
            vec![OrionUnderlyingOutcome::new(
                "A".into(),
                Some(5.0),
                not_touched(120.0),
                &p,
            )],
        );
        assert_eq!(none.barrier_hit_status, BarrierHitStatus::None);
    }

    #[test]
    fn test_missing_performance_leaves_basket_unset() {
        let p = params();
        let outcomes = vec![
            OrionUnderlyingOutcome::new("A".into(), Some(10.0), not_touched(120.0), &p),
            OrionUnderlyingOutcome::new(
                "B".into(),
                None,
                BarrierScan::Indeterminate {
                    reason: ScanGap::NoSeries,
                },
                &p,
            ),
        ];
        let result = evaluate_orion(p, outcomes);
        assert_eq!(result.basket_considered_performance, None);
        assert_eq!(result.worst_performance, None);
        assert_eq!(result.capital_return, None);
    }

    #[test]
    fn test_touched_leg_with_unknown_performance_still_earns_rebate() {
        let p = params();
        let outcome = OrionUnderlyingOutcome::new("A".into(), None, touched(), &p);
        assert_eq!(outcome.considered_performance, Some(8.0));
    }
}
