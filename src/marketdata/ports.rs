//! Port traits the engine evaluates against
//!
//! The engine never talks to a database or a market-data vendor directly:
//! everything it needs arrives through these traits. Remote implementations
//! own their timeout and retry policy; the engine only sees a hit or a miss.
//! Lookups must not fail for unknown tickers — they return empty/`None`
//! instead, which keeps evaluation total.

use chrono::{DateTime, NaiveDate, Utc};

use super::history::{CurrentPrice, HistoricalSeries, PriceRecord};

/// Source of historical and live prices
pub trait MarketDataStore: Sync {
    /// Historical records for a full ticker within `[from, to]` inclusive.
    /// Unknown tickers yield an empty vector, never an error.
    fn historical_range(&self, full_ticker: &str, from: NaiveDate, to: NaiveDate)
        -> Vec<PriceRecord>;

    /// The cached historical document for a full ticker, if one exists
    fn find_series(&self, full_ticker: &str) -> Option<HistoricalSeries>;

    /// Latest quoted price for a ticker, if the venue knows it
    fn current_price(&self, ticker: &str) -> Option<CurrentPrice>;
}

/// Rebases minor-unit quoted prices (e.g. pence) to major units so they can
/// be compared against strikes and barriers
pub trait CurrencyNormalizer: Sync {
    /// Normalize a whole series against a reference level
    fn normalize_series(
        &self,
        records: Vec<PriceRecord>,
        reference_price: f64,
        ticker: &str,
    ) -> Vec<PriceRecord>;

    /// Normalize a single price against a reference level
    fn normalize_price(&self, price: f64, reference_price: f64, ticker: &str) -> f64;
}

/// Injected time source so evaluations are reproducible
pub trait Clock: Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen clock for deterministic tests and as-of evaluations
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
    }
}
