//! Participation note payoff calculation
//!
//! Redemption is par plus the basket performance scaled by the participation
//! rate. Two things only ever happen on an issuer call: the capital floor
//! (when one is configured) and the call rebate. A note that simply runs to
//! maturity takes the full downside regardless of any configured protection
//! level.

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::product::{ParticipationParams, RebateType};
use super::lifecycle::Lifecycle;

/// Which payoff path produced the redemption figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionKind {
    Participation,
    IssuerCall,
}

impl std::fmt::Display for RedemptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedemptionKind::Participation => write!(f, "participation"),
            RedemptionKind::IssuerCall => write!(f, "issuer_call"),
        }
    }
}

/// Cash received on an issuer call: call price plus rebate, strictly additive
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    pub call_date: DateTime<Utc>,
    pub call_price: f64,
    pub rebate: f64,
    /// Days between trade and call dates, when both are known
    pub days_held: Option<i64>,
    pub total_received: f64,
}

/// Full participation evaluation for one product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationEvaluation {
    pub params: ParticipationParams,
    pub basket_performance: Option<f64>,
    pub participated_performance: Option<f64>,
    /// Redemption before any capital floor
    pub raw_redemption: Option<f64>,
    /// Final redemption in percent of notional
    pub redemption: Option<f64>,
    pub protection_applied: bool,
    pub kind: RedemptionKind,
    pub call: Option<CallOutcome>,
}

/// Evaluate the participation payoff from an already-aggregated basket
/// performance.
pub fn evaluate_participation(
    params: ParticipationParams,
    basket_performance: Option<f64>,
    lifecycle: &Lifecycle,
    trade_date: Option<DateTime<Utc>>,
) -> ParticipationEvaluation {
    let participated_performance =
        basket_performance.map(|p| p * (params.participation_rate / 100.0));
    let raw_redemption = participated_performance.map(|p| 100.0 + p);

    let kind = if lifecycle.called {
        RedemptionKind::IssuerCall
    } else {
        RedemptionKind::Participation
    };

    // Capital guarantee applies only on an issuer call
    let (redemption, protection_applied) = match (raw_redemption, lifecycle.called) {
        (Some(raw), true) => match params.protection_level {
            Some(floor) if raw < floor => (Some(floor), true),
            _ => (Some(raw), false),
        },
        (raw, _) => (raw, false),
    };

    let call = if lifecycle.called {
        params
            .issuer_call_date
            .map(|call_date| call_outcome(&params, call_date, trade_date))
    } else {
        None
    };

    ParticipationEvaluation {
        params,
        basket_performance,
        participated_performance,
        raw_redemption,
        redemption,
        protection_applied,
        kind,
        call,
    }
}

fn call_outcome(
    params: &ParticipationParams,
    call_date: DateTime<Utc>,
    trade_date: Option<DateTime<Utc>>,
) -> CallOutcome {
    let days_held = trade_date.map(|trade| {
        let seconds = (call_date - trade).num_seconds() as f64;
        (seconds / 86_400.0).ceil() as i64
    });

    let rebate = match params.issuer_call_rebate_type {
        RebateType::Fixed => params.issuer_call_rebate,
        RebateType::PerAnnum => match days_held {
            Some(days) => params.issuer_call_rebate * (days as f64 / 365.0),
            None => {
                warn!("per-annum call rebate without a trade date, applying flat");
                params.issuer_call_rebate
            }
        },
    };

    let call_price = params.issuer_call_price.unwrap_or(100.0);
    CallOutcome {
        call_date,
        call_price,
        rebate,
        days_held,
        total_received: call_price + rebate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    use crate::evaluation::lifecycle::LifecycleStatus;
    use crate::product::Product;

    fn lifecycle(called: bool) -> Lifecycle {
        Lifecycle {
            status: if called {
                LifecycleStatus::Called
            } else {
                LifecycleStatus::Live
            },
            maturity_passed: false,
            final_observation_passed: false,
            called,
            redemption_date: None,
            days_to_maturity: Some(300),
            maturity_label: Some("300 days".to_string()),
        }
    }

    fn params_from(structure: &str) -> ParticipationParams {
        let product: Product = serde_json::from_str(&format!(
            r#"{{"id": "p", "productType": "participation", "structure": {}}}"#,
            structure
        ))
        .unwrap();
        ParticipationParams::from_product(&product)
    }

    #[test]
    fn test_no_floor_when_not_called() {
        let params = params_from(r#"{"participationRate": 150, "capitalGuarantee": 90}"#);
        let result = evaluate_participation(params, Some(-10.0), &lifecycle(false), None);

        assert_relative_eq!(result.participated_performance.unwrap(), -15.0);
        assert_relative_eq!(result.redemption.unwrap(), 85.0);
        assert_eq!(result.kind, RedemptionKind::Participation);
        // Configured protection is ignored without a call
        assert!(!result.protection_applied);
        assert!(result.call.is_none());
    }

    #[test]
    fn test_floor_applied_when_called() {
        let params = params_from(
            r#"{"participationRate": 150, "capitalGuarantee": 95,
                "issuerCallDate": "2024-03-01"}"#,
        );
        let result = evaluate_participation(params, Some(-10.0), &lifecycle(true), None);

        assert_relative_eq!(result.raw_redemption.unwrap(), 85.0);
        assert_relative_eq!(result.redemption.unwrap(), 95.0);
        assert!(result.protection_applied);
        assert_eq!(result.kind, RedemptionKind::IssuerCall);
    }

    #[test]
    fn test_floor_not_marked_when_above_it() {
        let params = params_from(
            r#"{"participationRate": 100, "capitalGuarantee": 95,
                "issuerCallDate": "2024-03-01"}"#,
        );
        let result = evaluate_participation(params, Some(10.0), &lifecycle(true), None);
        assert_relative_eq!(result.redemption.unwrap(), 110.0);
        assert!(!result.protection_applied);
    }

    #[test]
    fn test_fixed_rebate_is_flat() {
        let params = params_from(
            r#"{"issuerCallDate": "2024-03-01", "issuerCallPrice": 102,
                "issuerCallRebate": 3.5}"#,
        );
        let trade = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        let result = evaluate_participation(params, Some(0.0), &lifecycle(true), Some(trade));

        let call = result.call.unwrap();
        assert_relative_eq!(call.rebate, 3.5);
        assert_relative_eq!(call.total_received, 105.5);
    }

    #[test]
    fn test_per_annum_rebate_prorates_linearly() {
        let trade = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

        let params_half = params_from(
            r#"{"issuerCallDate": "2023-07-03", "issuerCallRebate": 4.0,
                "issuerCallRebateType": "per_annum"}"#,
        );
        let half = evaluate_participation(params_half, Some(0.0), &lifecycle(true), Some(trade))
            .call
            .unwrap();

        let params_full = params_from(
            r#"{"issuerCallDate": "2024-01-03", "issuerCallRebate": 4.0,
                "issuerCallRebateType": "per_annum"}"#,
        );
        let full = evaluate_participation(params_full, Some(0.0), &lifecycle(true), Some(trade))
            .call
            .unwrap();

        assert_eq!(half.days_held, Some(183));
        assert_eq!(full.days_held, Some(367));
        assert_relative_eq!(half.rebate, 4.0 * 183.0 / 365.0, max_relative = 1e-12);
        assert_relative_eq!(full.rebate, 4.0 * 367.0 / 365.0, max_relative = 1e-12);

        // Doubling days held doubles the prorated rebate
        let params_two_years = params_from(
            r#"{"issuerCallDate": "2025-01-02", "issuerCallRebate": 4.0,
                "issuerCallRebateType": "per_annum"}"#,
        );
        let double =
            evaluate_participation(params_two_years, Some(0.0), &lifecycle(true), Some(trade))
                .call
                .unwrap();
        assert_eq!(double.days_held, Some(732));
        assert_relative_eq!(double.rebate, 4.0 * 732.0 / 365.0, max_relative = 1e-12);
    }

    #[test]
    fn test_call_price_defaults_to_par() {
        let params = params_from(r#"{"issuerCallDate": "2024-03-01", "issuerCallRebate": 1.0}"#);
        let result = evaluate_participation(params, Some(0.0), &lifecycle(true), None);
        let call = result.call.unwrap();
        assert_relative_eq!(call.call_price, 100.0);
        assert_relative_eq!(call.total_received, 101.0);
    }

    #[test]
    fn test_missing_basket_yields_no_redemption() {
        let params = params_from(r#"{"participationRate": 120}"#);
        let result = evaluate_participation(params, None, &lifecycle(false), None);
        assert_eq!(result.redemption, None);
        assert_eq!(result.raw_redemption, None);
    }
}
