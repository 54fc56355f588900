//! Ticker normalization and exchange-suffix variants
//!
//! Historical series are keyed by "full ticker" (symbol plus exchange suffix,
//! e.g. `AAPL.US`). Product documents carry tickers in whatever shape the
//! upstream feed used, so lookups normalize first and then walk a fixed
//! variant list until one hits.

/// Suffixes tried, in order, when resolving a live price for a bare symbol
pub const LIVE_PRICE_SUFFIXES: [&str; 6] = ["US", "NASDAQ", "NYSE", "LSE", "PA", "DE"];

/// Suffixes tried, in order, when a historical series is missing under the
/// ticker as given
pub const HISTORY_SUFFIXES: [&str; 5] = ["US", "PA", "DE", "LSE", "CO"];

/// Normalize a raw ticker to the full-ticker key used by the historical store.
/// Bare symbols default to the US exchange.
pub fn full_ticker(raw: &str) -> String {
    let trimmed = raw.trim().to_uppercase();
    if trimmed.contains('.') {
        trimmed
    } else {
        format!("{}.US", trimmed)
    }
}

/// Strip the exchange suffix, leaving the bare symbol
pub fn base_symbol(ticker: &str) -> &str {
    match ticker.find('.') {
        Some(idx) => &ticker[..idx],
        None => ticker,
    }
}

/// Exchange suffix of a full ticker, if any
pub fn exchange_suffix(ticker: &str) -> Option<&str> {
    ticker.rsplit_once('.').map(|(_, suffix)| suffix)
}

/// Candidate tickers for a live-price lookup: the raw ticker first, then the
/// bare symbol with each known exchange suffix. First hit wins.
pub fn live_price_variants(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().to_uppercase();
    let base = base_symbol(&trimmed).to_string();

    let mut variants = vec![trimmed];
    for suffix in LIVE_PRICE_SUFFIXES {
        let candidate = format!("{}.{}", base, suffix);
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Candidate full tickers for a historical-series lookup
pub fn history_variants(raw: &str) -> Vec<String> {
    let full = full_ticker(raw);
    let base = base_symbol(&full).to_string();

    let mut variants = vec![full];
    for suffix in HISTORY_SUFFIXES {
        let candidate = format!("{}.{}", base, suffix);
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ticker_defaults_to_us() {
        assert_eq!(full_ticker("aapl"), "AAPL.US");
        assert_eq!(full_ticker("VOD.LSE"), "VOD.LSE");
        assert_eq!(full_ticker(" msft "), "MSFT.US");
    }

    #[test]
    fn test_base_symbol() {
        assert_eq!(base_symbol("AAPL.US"), "AAPL");
        assert_eq!(base_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn test_live_variants_order() {
        let variants = live_price_variants("AAPL");
        assert_eq!(variants[0], "AAPL");
        assert_eq!(variants[1], "AAPL.US");
        assert_eq!(variants[2], "AAPL.NASDAQ");
        assert_eq!(variants.last().unwrap(), "AAPL.DE");
    }

    #[test]
    fn test_history_variants_dedupe() {
        let variants = history_variants("SAN.PA");
        // The raw full ticker comes first and is not repeated by the suffix walk
        assert_eq!(variants[0], "SAN.PA");
        assert_eq!(variants.iter().filter(|v| *v == "SAN.PA").count(), 1);
        assert!(variants.contains(&"SAN.LSE".to_string()));
    }
}
