//! Basket aggregation of per-underlying performances

use serde::Serialize;

/// How constituent performances combine into one basket figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasketMode {
    WorstOf,
    BestOf,
    Average,
}

impl Default for BasketMode {
    fn default() -> Self {
        BasketMode::WorstOf
    }
}

impl BasketMode {
    /// Parse a document string; anything unrecognized falls back to worst-of
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "best-of" | "best_of" | "bestof" | "best" => BasketMode::BestOf,
            "average" | "avg" | "mean" => BasketMode::Average,
            _ => BasketMode::WorstOf,
        }
    }
}

/// Combine performances per the basket mode. Empty input yields `None`.
pub fn aggregate(performances: &[f64], mode: BasketMode) -> Option<f64> {
    if performances.is_empty() {
        return None;
    }
    let value = match mode {
        BasketMode::WorstOf => performances.iter().copied().fold(f64::INFINITY, f64::min),
        BasketMode::BestOf => performances.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        BasketMode::Average => performances.iter().sum::<f64>() / performances.len() as f64,
    };
    Some(value)
}
