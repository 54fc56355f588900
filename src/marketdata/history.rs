//! Historical price series and the in-memory store
//!
//! The reference store used by the CLI, the batch binary, and tests. It is
//! loaded from a flat CSV of `ticker,date,close,adjusted_close` rows; a
//! production deployment would put a database-backed implementation behind
//! the same `MarketDataStore` trait.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use super::ports::MarketDataStore;
use super::ticker::full_ticker;

/// A single end-of-day record in a historical series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_close: Option<f64>,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            adjusted_close: None,
        }
    }

    /// Close used for barrier comparisons: adjusted when available
    pub fn effective_close(&self) -> f64 {
        self.adjusted_close.unwrap_or(self.close)
    }
}

/// A cached historical document for one instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSeries {
    pub full_ticker: String,
    pub history: Vec<PriceRecord>,
}

/// A live quote from a venue feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPrice {
    pub price: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// In-memory market data keyed by full ticker
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    series: HashMap<String, HistoricalSeries>,
    spot: HashMap<String, CurrentPrice>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a historical series. Records are kept sorted by
    /// date so range scans stay chronological.
    pub fn insert_series(&mut self, ticker: &str, mut history: Vec<PriceRecord>) {
        history.sort_by_key(|r| r.date);
        let key = full_ticker(ticker);
        self.series.insert(
            key.clone(),
            HistoricalSeries {
                full_ticker: key,
                history,
            },
        );
    }

    pub fn insert_current_price(&mut self, ticker: &str, quote: CurrentPrice) {
        self.spot.insert(full_ticker(ticker), quote);
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Load historical series from a CSV with `ticker,date,close,adjusted_close`
    /// columns. Malformed rows are skipped with a warning rather than failing
    /// the whole load.
    pub fn load_history_csv(&mut self, path: &Path) -> Result<usize, EngineError> {
        #[derive(Debug, Deserialize)]
        struct CsvRow {
            ticker: String,
            date: String,
            close: f64,
            adjusted_close: Option<f64>,
        }

        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut by_ticker: HashMap<String, Vec<PriceRecord>> = HashMap::new();
        let mut loaded = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("skipping malformed history row in {}: {}", path.display(), e);
                    continue;
                }
            };
            let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    warn!("skipping history row with bad date '{}' for {}", row.date, row.ticker);
                    continue;
                }
            };
            by_ticker
                .entry(full_ticker(&row.ticker))
                .or_default()
                .push(PriceRecord {
                    date,
                    close: row.close,
                    adjusted_close: row.adjusted_close,
                });
            loaded += 1;
        }

        for (ticker, history) in by_ticker {
            self.insert_series(&ticker, history);
        }
        Ok(loaded)
    }

    /// Load current prices from a CSV with `ticker,price,date,currency` columns
    pub fn load_spot_csv(&mut self, path: &Path) -> Result<usize, EngineError> {
        #[derive(Debug, Deserialize)]
        struct CsvRow {
            ticker: String,
            price: f64,
            date: DateTime<Utc>,
            currency: Option<String>,
        }

        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut loaded = 0usize;
        for result in reader.deserialize::<CsvRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("skipping malformed spot row in {}: {}", path.display(), e);
                    continue;
                }
            };
            self.insert_current_price(
                &row.ticker,
                CurrentPrice {
                    price: row.price,
                    date: row.date,
                    currency: row.currency,
                },
            );
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl MarketDataStore for InMemoryMarketData {
    fn historical_range(
        &self,
        full_ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<PriceRecord> {
        match self.series.get(full_ticker) {
            Some(series) => series
                .history
                .iter()
                .filter(|r| r.date >= from && r.date <= to)
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    fn find_series(&self, full_ticker: &str) -> Option<HistoricalSeries> {
        self.series.get(full_ticker).cloned()
    }

    fn current_price(&self, ticker: &str) -> Option<CurrentPrice> {
        self.spot.get(&full_ticker(ticker)).cloned()
    }
}
