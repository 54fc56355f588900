//! Product document model
//!
//! Products arrive as JSON documents from an external store. Field naming in
//! that store is inconsistent (`maturityDate` vs `maturity`, `tradeDate` vs
//! `valueDate`, three spellings of the structure-parameter bag), and numeric
//! fields occasionally arrive as strings. The document model keeps every
//! synonym as its own optional field and exposes accessor methods that apply
//! the documented fallback chains in one place.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Map;

/// Product family determines which payoff calculator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
    /// Memory-rebate barrier note
    Orion,
    /// Participation note with optional issuer call
    Participation,
}

impl ProductFamily {
    pub fn label(&self) -> &'static str {
        match self {
            ProductFamily::Orion => "Orion",
            ProductFamily::Participation => "Participation Note",
        }
    }
}

/// Cache of resolved prices carried on each underlying document.
///
/// The engine treats the incoming copy as read-only and returns a freshly
/// populated one on every evaluation; persisting it back to the store is the
/// caller's explicit responsibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityData {
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, alias = "date", deserialize_with = "lenient_date")]
    pub price_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub trade_date_price: Option<f64>,
    #[serde(default, alias = "maturityPrice", deserialize_with = "lenient_number")]
    pub redemption_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub final_observation_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
}

/// One constituent asset of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Underlying {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub isin: Option<String>,
    /// Contractual reference level. This is the authoritative initial price
    /// for barrier comparisons, not whatever traded on the trade date.
    #[serde(default, deserialize_with = "lenient_number")]
    pub strike: Option<f64>,
    #[serde(default)]
    pub security_data: SecurityData,
}

impl Underlying {
    pub fn new(ticker: &str, strike: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: None,
            isin: None,
            strike: Some(strike),
            security_data: SecurityData::default(),
        }
    }
}

/// A structured-note document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "productType", alias = "family")]
    pub product_family: ProductFamily,
    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub trade_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub value_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub maturity_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub maturity: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub final_observation_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub final_observation: Option<DateTime<Utc>>,

    #[serde(default)]
    pub underlyings: Vec<Underlying>,

    // Structure-parameter bags. All three spellings occur in the store; the
    // extraction step in params.rs merges them per field.
    #[serde(default)]
    pub structure: Option<Map<String, serde_json::Value>>,
    #[serde(default)]
    pub structure_params: Option<Map<String, serde_json::Value>>,
    #[serde(default)]
    pub structure_parameters: Option<Map<String, serde_json::Value>>,
}

impl Product {
    /// Trade date: `tradeDate` falling back to `valueDate`
    pub fn effective_trade_date(&self) -> Option<DateTime<Utc>> {
        self.trade_date.or(self.value_date)
    }

    /// Maturity: `maturityDate` falling back to `maturity`
    pub fn effective_maturity(&self) -> Option<DateTime<Utc>> {
        self.maturity_date.or(self.maturity)
    }

    /// Final observation: `finalObservationDate` falling back to
    /// `finalObservation` (Orion only)
    pub fn effective_final_observation(&self) -> Option<DateTime<Utc>> {
        self.final_observation_date.or(self.final_observation)
    }

    /// Start of the barrier lookback window: trade date, then issue date,
    /// then value date, first present
    pub fn lookback_start(&self) -> Option<DateTime<Utc>> {
        self.trade_date.or(self.issue_date).or(self.value_date)
    }
}

/// Parse an ISO timestamp, accepting bare `YYYY-MM-DD` dates as midnight UTC
pub(crate) fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_flexible_date(&s),
        _ => None,
    })
}

/// Accept a number, a numeric string, or nothing. Non-numeric values become
/// `None` so a bad strike degrades to an indeterminate evaluation instead of
/// failing the whole book.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
