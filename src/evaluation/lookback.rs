//! Historical barrier lookback
//!
//! Scans an underlying's price path between the trade date and the
//! evaluation cutoff for a touch of the upper barrier. The reference level is
//! always the contractual strike, never a traded or cached price, so the
//! barrier shown on charts and the barrier used for payoff agree.
//!
//! The scan is tri-state. "No data" and "barrier not hit" are different
//! answers to a payoff question, and collapsing them into `false` silently
//! turns missing market data into a worse redemption figure. Callers that
//! only need the boolean use [`BarrierScan::touched`], which maps
//! `Indeterminate` to the conservative not-touched branch.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::marketdata::{ticker, Clock, CurrencyNormalizer, HistoricalSeries, MarketDataStore};
use crate::product::{Product, Underlying};
use super::lifecycle::Lifecycle;

/// Why a scan could not produce a definitive answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanGap {
    /// Strike missing or non-positive
    MissingReference,
    /// No trade/issue/value date to anchor the window
    MissingWindow,
    /// No historical series under any ticker variant
    NoSeries,
    /// Series exists but has no records inside the window
    NoDataInWindow,
}

impl std::fmt::Display for ScanGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanGap::MissingReference => write!(f, "missing reference price"),
            ScanGap::MissingWindow => write!(f, "missing scan window"),
            ScanGap::NoSeries => write!(f, "no historical series"),
            ScanGap::NoDataInWindow => write!(f, "no data in scan window"),
        }
    }
}

/// Outcome of a barrier lookback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BarrierScan {
    /// The barrier was reached; the first touching record is reported
    Touched { date: NaiveDate, close: f64 },
    /// Data was present and never reached the barrier
    NotTouched { max_close: f64 },
    /// The question could not be answered from available data
    Indeterminate { reason: ScanGap },
}

impl BarrierScan {
    /// Boolean view for payoff math: indeterminate counts as not touched
    pub fn touched(&self) -> bool {
        matches!(self, BarrierScan::Touched { .. })
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, BarrierScan::Indeterminate { .. })
    }
}

/// Scans historical paths for upper-barrier touches
pub struct BarrierLookbackScanner<'a> {
    store: &'a dyn MarketDataStore,
    currency: &'a dyn CurrencyNormalizer,
    clock: &'a dyn Clock,
}

impl<'a> BarrierLookbackScanner<'a> {
    pub fn new(
        store: &'a dyn MarketDataStore,
        currency: &'a dyn CurrencyNormalizer,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            currency,
            clock,
        }
    }

    /// Scan one underlying's path against `upper_barrier_pct` percent of its
    /// strike, between the product's trade date and the evaluation cutoff.
    pub fn scan(
        &self,
        underlying: &Underlying,
        product: &Product,
        lifecycle: &Lifecycle,
        upper_barrier_pct: f64,
    ) -> BarrierScan {
        let reference = match underlying.strike {
            Some(strike) if strike > 0.0 => strike,
            _ => {
                warn!(
                    "{}: cannot scan barrier without a strike",
                    underlying.ticker
                );
                return BarrierScan::Indeterminate {
                    reason: ScanGap::MissingReference,
                };
            }
        };

        let start = match product.lookback_start() {
            Some(date) => date.date_naive(),
            None => {
                warn!("{}: no trade date to anchor barrier scan", underlying.ticker);
                return BarrierScan::Indeterminate {
                    reason: ScanGap::MissingWindow,
                };
            }
        };
        let end = self.cutoff(product, lifecycle);

        let series = match self.find_series(&underlying.ticker) {
            Some(series) => series,
            None => {
                warn!("{}: no historical series found", underlying.ticker);
                return BarrierScan::Indeterminate {
                    reason: ScanGap::NoSeries,
                };
            }
        };

        let mut window: Vec<_> = series
            .history
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .copied()
            .collect();
        if window.is_empty() {
            debug!(
                "{}: no records between {} and {}",
                series.full_ticker, start, end
            );
            return BarrierScan::Indeterminate {
                reason: ScanGap::NoDataInWindow,
            };
        }
        window.sort_by_key(|r| r.date);
        let window = self
            .currency
            .normalize_series(window, reference, &series.full_ticker);

        let barrier_price = reference * (upper_barrier_pct / 100.0);
        let mut max_close = f64::NEG_INFINITY;
        for record in &window {
            let close = record.effective_close();
            if close >= barrier_price {
                debug!(
                    "{}: barrier {} touched at {} on {}",
                    series.full_ticker, barrier_price, close, record.date
                );
                return BarrierScan::Touched {
                    date: record.date,
                    close,
                };
            }
            max_close = max_close.max(close);
        }

        debug!(
            "{}: barrier {} never touched, max close {} over {}..={}",
            series.full_ticker, barrier_price, max_close, start, end
        );
        BarrierScan::NotTouched { max_close }
    }

    /// Scan cutoff: final observation if passed, else maturity if passed,
    /// else today
    fn cutoff(&self, product: &Product, lifecycle: &Lifecycle) -> NaiveDate {
        if lifecycle.final_observation_passed {
            if let Some(date) = product.effective_final_observation() {
                return date.date_naive();
            }
        }
        if lifecycle.maturity_passed {
            if let Some(date) = product.effective_maturity() {
                return date.date_naive();
            }
        }
        self.clock.now().date_naive()
    }

    /// Series lookup with exchange-suffix retries on the base symbol
    fn find_series(&self, raw_ticker: &str) -> Option<HistoricalSeries> {
        for variant in ticker::history_variants(raw_ticker) {
            if let Some(series) = self.store.find_series(&variant) {
                return Some(series);
            }
            debug!("{}: no series under variant {}", raw_ticker, variant);
        }
        None
    }
}
