//! Lifecycle classification
//!
//! Determines whether a product is live, matured, or called, and the
//! redemption date that follows from that. Date handling is deliberately
//! uneven between the two families and must stay that way:
//!
//! - Orion compares calendar dates. The final-observation check is strict
//!   (`<`) because closing data for the observation date only becomes
//!   available the next day, while the maturity check is inclusive (`<=`)
//!   because settlement occurs on or after that date.
//! - The participation issuer-call check compares full timestamps, not
//!   stripped dates. This asymmetry is contractual behavior around boundary
//!   days, not an accident to clean up.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::product::{ParticipationParams, Product};

/// Where a product is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Live,
    Matured,
    Called,
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleStatus::Live => write!(f, "live"),
            LifecycleStatus::Matured => write!(f, "matured"),
            LifecycleStatus::Called => write!(f, "called"),
        }
    }
}

/// Classification output consumed by the price resolver and the calculators
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    pub status: LifecycleStatus,
    pub maturity_passed: bool,
    pub final_observation_passed: bool,
    pub called: bool,
    /// Calendar date of the lifecycle event that fixes the redemption price
    pub redemption_date: Option<NaiveDate>,
    /// Signed days until maturity, negative once past
    pub days_to_maturity: Option<i64>,
    pub maturity_label: Option<String>,
}

impl Lifecycle {
    /// True when a redemption price, rather than a live price, should drive
    /// the evaluation
    pub fn is_redeemed(&self) -> bool {
        matches!(self.status, LifecycleStatus::Matured | LifecycleStatus::Called)
    }
}

/// Classify an Orion note
pub fn classify_orion(product: &Product, now: DateTime<Utc>) -> Lifecycle {
    let today = now.date_naive();
    let maturity = product.effective_maturity();
    let final_observation = product.effective_final_observation();

    // Strict: the observation date's close is only known the next day
    let final_observation_passed = final_observation
        .map(|d| d.date_naive() < today)
        .unwrap_or(false);
    let maturity_passed = maturity.map(|d| d.date_naive() <= today).unwrap_or(false);

    // Final observation wins when both have passed
    let redemption_date = if final_observation_passed {
        final_observation.map(|d| d.date_naive())
    } else if maturity_passed {
        maturity.map(|d| d.date_naive())
    } else {
        None
    };

    let status = if final_observation_passed || maturity_passed {
        LifecycleStatus::Matured
    } else {
        LifecycleStatus::Live
    };

    let days_to_maturity = maturity.map(|d| days_until(d, now));
    Lifecycle {
        status,
        maturity_passed,
        final_observation_passed,
        called: false,
        redemption_date,
        days_to_maturity,
        maturity_label: days_to_maturity.map(maturity_label),
    }
}

/// Classify a participation note. `called` takes precedence over `matured`.
pub fn classify_participation(
    product: &Product,
    params: &ParticipationParams,
    now: DateTime<Utc>,
) -> Lifecycle {
    let today = now.date_naive();
    let maturity = product.effective_maturity();

    let maturity_passed = maturity.map(|d| d.date_naive() <= today).unwrap_or(false);
    // Full-timestamp comparison, by contract
    let called = params.issuer_call_date.map(|d| d <= now).unwrap_or(false);

    let status = if called {
        LifecycleStatus::Called
    } else if maturity_passed {
        LifecycleStatus::Matured
    } else {
        LifecycleStatus::Live
    };

    let redemption_date = if called {
        params.issuer_call_date.map(|d| d.date_naive())
    } else if maturity_passed {
        maturity.map(|d| d.date_naive())
    } else {
        None
    };

    let days_to_maturity = maturity.map(|d| days_until(d, now));
    Lifecycle {
        status,
        maturity_passed,
        final_observation_passed: false,
        called,
        redemption_date,
        days_to_maturity,
        maturity_label: days_to_maturity.map(maturity_label),
    }
}

/// Signed ceiling of the distance to a date in days
fn days_until(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (date - now).num_seconds() as f64;
    (seconds / 86_400.0).ceil() as i64
}

fn maturity_label(days: i64) -> String {
    if days < 0 {
        format!("{} days (matured)", -days)
    } else {
        format!("{} days", days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn orion_product(maturity: &str, final_obs: &str) -> Product {
        serde_json::from_str(&format!(
            r#"{{"id": "o", "productType": "orion",
                 "maturityDate": "{}", "finalObservationDate": "{}"}}"#,
            maturity, final_obs
        ))
        .unwrap()
    }

    fn participation_product(maturity: &str, call_date: Option<&str>) -> (Product, ParticipationParams) {
        let structure = match call_date {
            Some(d) => format!(r#"{{"issuerCallDate": "{}"}}"#, d),
            None => "{}".to_string(),
        };
        let product: Product = serde_json::from_str(&format!(
            r#"{{"id": "p", "productType": "participation",
                 "maturityDate": "{}", "structure": {}}}"#,
            maturity, structure
        ))
        .unwrap();
        let params = ParticipationParams::from_product(&product);
        (product, params)
    }

    #[test]
    fn test_orion_final_observation_is_strict() {
        let product = orion_product("2026-06-15", "2024-03-10");

        // On the observation date itself: still live, data not yet available
        let on_day = classify_orion(&product, at(2024, 3, 10, 15));
        assert_eq!(on_day.status, LifecycleStatus::Live);
        assert!(!on_day.final_observation_passed);

        // The next calendar day: matured on the observation date
        let next_day = classify_orion(&product, at(2024, 3, 11, 0));
        assert_eq!(next_day.status, LifecycleStatus::Matured);
        assert_eq!(
            next_day.redemption_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
    }

    #[test]
    fn test_orion_maturity_is_inclusive() {
        let product = orion_product("2024-03-10", "2024-06-15");
        let on_day = classify_orion(&product, at(2024, 3, 10, 9));
        assert_eq!(on_day.status, LifecycleStatus::Matured);
        assert!(on_day.maturity_passed);
        assert_eq!(
            on_day.redemption_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
    }

    #[test]
    fn test_orion_prefers_final_observation_when_both_passed() {
        let product = orion_product("2024-03-10", "2024-03-01");
        let lifecycle = classify_orion(&product, at(2024, 3, 20, 12));
        assert!(lifecycle.maturity_passed && lifecycle.final_observation_passed);
        assert_eq!(
            lifecycle.redemption_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_participation_call_compares_timestamps() {
        let (product, params) =
            participation_product("2026-06-15", Some("2024-03-10T16:00:00Z"));

        // Same calendar day, before the call timestamp: not yet called
        let before = classify_participation(&product, &params, at(2024, 3, 10, 9));
        assert_eq!(before.status, LifecycleStatus::Live);

        // After the timestamp: called
        let after = classify_participation(&product, &params, at(2024, 3, 10, 17));
        assert_eq!(after.status, LifecycleStatus::Called);
        assert_eq!(
            after.redemption_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
    }

    #[test]
    fn test_called_takes_precedence_over_matured() {
        let (product, params) = participation_product("2024-01-01", Some("2023-06-30"));
        let lifecycle = classify_participation(&product, &params, at(2024, 6, 1, 0));
        assert!(lifecycle.maturity_passed);
        assert_eq!(lifecycle.status, LifecycleStatus::Called);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let product = orion_product("2024-03-10", "2024-03-01");
        let mut was_redeemed = false;
        for day in 1..=31 {
            let lifecycle = classify_orion(&product, at(2024, 3, day, 12));
            if was_redeemed {
                assert!(lifecycle.is_redeemed(), "reverted to live on day {}", day);
            }
            was_redeemed = lifecycle.is_redeemed();
        }
        assert!(was_redeemed);
    }

    #[test]
    fn test_days_to_maturity_sign_and_label() {
        let product = orion_product("2024-03-10", "2024-06-15");

        let before = classify_orion(&product, at(2024, 3, 7, 12));
        assert_eq!(before.days_to_maturity, Some(3));
        assert_eq!(before.maturity_label.as_deref(), Some("3 days"));

        let after = classify_orion(&product, at(2024, 3, 15, 12));
        assert_eq!(after.days_to_maturity, Some(-5));
        assert_eq!(after.maturity_label.as_deref(), Some("5 days (matured)"));
    }

    #[test]
    fn test_missing_maturity_stays_live() {
        let product: Product =
            serde_json::from_str(r#"{"id": "x", "productType": "orion"}"#).unwrap();
        let lifecycle = classify_orion(&product, at(2024, 1, 1, 0));
        assert_eq!(lifecycle.status, LifecycleStatus::Live);
        assert_eq!(lifecycle.days_to_maturity, None);
        assert_eq!(lifecycle.maturity_label, None);
    }
}
