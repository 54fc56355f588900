//! Minor-unit price normalization
//!
//! LSE equities are commonly quoted in pence while strikes and barriers in
//! product documents are stored in pounds. Comparing the two raw would put
//! every close two orders of magnitude above its barrier, so historical
//! closes and live quotes are rebased against the contractual reference
//! level before any comparison.

use super::history::PriceRecord;
use super::ports::CurrencyNormalizer;
use super::ticker::exchange_suffix;

/// Ratio of price to reference above which an LSE quote is taken to be in
/// pence. A structured-note underlying trading at 25x its strike is far more
/// likely to be a unit mismatch than a real move.
const MINOR_UNIT_RATIO: f64 = 25.0;

/// Heuristic normalizer detecting GBp-quoted instruments
#[derive(Debug, Clone, Copy, Default)]
pub struct MinorUnitNormalizer;

impl MinorUnitNormalizer {
    fn is_minor_unit(&self, price: f64, reference_price: f64, ticker: &str) -> bool {
        if price <= 0.0 || reference_price <= 0.0 {
            return false;
        }
        let quoted_in_pence = matches!(exchange_suffix(ticker), Some("LSE") | Some("L"));
        quoted_in_pence && price / reference_price >= MINOR_UNIT_RATIO
    }
}

impl CurrencyNormalizer for MinorUnitNormalizer {
    fn normalize_series(
        &self,
        records: Vec<PriceRecord>,
        reference_price: f64,
        ticker: &str,
    ) -> Vec<PriceRecord> {
        records
            .into_iter()
            .map(|mut record| {
                if self.is_minor_unit(record.close, reference_price, ticker) {
                    record.close /= 100.0;
                }
                if let Some(adjusted) = record.adjusted_close {
                    if self.is_minor_unit(adjusted, reference_price, ticker) {
                        record.adjusted_close = Some(adjusted / 100.0);
                    }
                }
                record
            })
            .collect()
    }

    fn normalize_price(&self, price: f64, reference_price: f64, ticker: &str) -> f64 {
        if self.is_minor_unit(price, reference_price, ticker) {
            price / 100.0
        } else {
            price
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_pence_quoted_lse_rebased() {
        let normalizer = MinorUnitNormalizer;
        // 45250 pence vs a 450 GBP strike
        assert_eq!(normalizer.normalize_price(45_250.0, 450.0, "VOD.LSE"), 452.5);
    }

    #[test]
    fn test_major_unit_lse_untouched() {
        let normalizer = MinorUnitNormalizer;
        assert_eq!(normalizer.normalize_price(460.0, 450.0, "VOD.LSE"), 460.0);
    }

    #[test]
    fn test_non_lse_untouched() {
        let normalizer = MinorUnitNormalizer;
        // A US ticker far above its reference is a real move, not a unit issue
        assert_eq!(normalizer.normalize_price(45_250.0, 450.0, "AAPL.US"), 45_250.0);
    }

    #[test]
    fn test_series_normalizes_both_closes() {
        let normalizer = MinorUnitNormalizer;
        let records = vec![PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            close: 45_000.0,
            adjusted_close: Some(44_800.0),
        }];
        let normalized = normalizer.normalize_series(records, 450.0, "VOD.LSE");
        assert_eq!(normalized[0].close, 450.0);
        assert_eq!(normalized[0].adjusted_close, Some(448.0));
    }

    #[test]
    fn test_zero_reference_untouched() {
        let normalizer = MinorUnitNormalizer;
        assert_eq!(normalizer.normalize_price(45_000.0, 0.0, "VOD.LSE"), 45_000.0);
    }
}
