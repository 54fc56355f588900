//! Price resolution
//!
//! Each underlying needs a reference ("initial") price and an evaluation
//! price before any payoff math can run. Both come out of a prioritized
//! fallback chain over the market-data ports, and every resolved price is
//! tagged with its source so downstream consumers can tell an authoritative
//! quote from a stopgap. A miss at any tier cascades to the next tier and is
//! never an error; a quote tagged `InitialFallback` signals missing data and
//! is excluded from payoff math entirely.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::marketdata::{ticker, Clock, CurrencyNormalizer, MarketDataStore};
use crate::product::{ProductFamily, Underlying};
use super::lifecycle::Lifecycle;

/// Where a resolved price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Exact-date hit in the historical series
    MarketDataCache,
    /// Last cached price, used when the redemption date had no record
    FallbackCurrentPrice,
    /// Contractual strike standing in for a missing market price
    StrikeFallback,
    /// No usable data at all; never authoritative for payoff math
    InitialFallback,
    /// Historical close on the redemption date
    Redemption,
    /// Historical close on the final observation date
    FinalObservation,
    /// Venue quote from the current-price feed
    Live,
    /// Historical close on the issuer call date
    IssuerCall,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            PriceSource::MarketDataCache => "market_data_cache",
            PriceSource::FallbackCurrentPrice => "fallback_current_price",
            PriceSource::StrikeFallback => "strike_fallback",
            PriceSource::InitialFallback => "initial_fallback",
            PriceSource::Redemption => "redemption",
            PriceSource::FinalObservation => "final_observation",
            PriceSource::Live => "live",
            PriceSource::IssuerCall => "issuer_call",
        };
        write!(f, "{}", tag)
    }
}

/// A resolved price with provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub date: Option<NaiveDate>,
    pub source: PriceSource,
}

impl PriceQuote {
    pub fn new(price: f64, date: Option<NaiveDate>, source: PriceSource) -> Self {
        Self { price, date, source }
    }

    /// Whether this quote may feed payoff math
    pub fn is_authoritative(&self) -> bool {
        self.source != PriceSource::InitialFallback
    }
}

/// Every price resolved for one underlying in one evaluation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrices {
    /// Authoritative initial level: the strike (Orion) or the trade-date
    /// price (participation)
    pub initial: Option<PriceQuote>,
    pub trade_date: Option<PriceQuote>,
    pub redemption: Option<PriceQuote>,
    pub final_observation: Option<PriceQuote>,
    pub live: Option<PriceQuote>,
    /// The price performance math runs against, per the selection hierarchy
    pub evaluation: Option<PriceQuote>,
}

/// Resolves prices for one underlying against the injected ports
pub struct PriceResolver<'a> {
    store: &'a dyn MarketDataStore,
    currency: &'a dyn CurrencyNormalizer,
    clock: &'a dyn Clock,
}

impl<'a> PriceResolver<'a> {
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

    /// Resolve the full price set for one underlying
    pub fn resolve(
        &self,
        underlying: &Underlying,
        family: ProductFamily,
        lifecycle: &Lifecycle,
        trade_date: Option<NaiveDate>,
        final_observation_date: Option<NaiveDate>,
    ) -> ResolvedPrices {
        let reference = underlying.strike.unwrap_or(0.0);
        let full = ticker::full_ticker(&underlying.ticker);

        let trade_quote = self.trade_date_price(underlying, &full, reference, trade_date);

        let redemption = lifecycle.redemption_date.and_then(|date| {
            let tag = if lifecycle.called {
                PriceSource::IssuerCall
            } else {
                PriceSource::Redemption
            };
            self.redemption_price(underlying, &full, reference, date, tag)
        });

        let final_observation = if lifecycle.final_observation_passed {
            final_observation_date.and_then(|date| {
                self.exact_close(&full, reference, date)
                    .map(|(price, date)| {
                        PriceQuote::new(price, Some(date), PriceSource::FinalObservation)
                    })
            })
        } else {
            None
        };

        let live = self.live_price(underlying, reference);

        let initial = match family {
            ProductFamily::Orion => underlying
                .strike
                .map(|strike| PriceQuote::new(strike, trade_date, PriceSource::StrikeFallback)),
            ProductFamily::Participation => trade_quote,
        };

        let evaluation = self.select_evaluation(
            underlying,
            lifecycle,
            &initial,
            &redemption,
            &final_observation,
            &live,
        );

        ResolvedPrices {
            initial,
            trade_date: trade_quote,
            redemption,
            final_observation,
            live,
            evaluation,
        }
    }

    /// Exact-date close from the historical series, currency-normalized
    fn exact_close(&self, full: &str, reference: f64, date: NaiveDate) -> Option<(f64, NaiveDate)> {
        let records = self.store.historical_range(full, date, date);
        let record = records.first()?;
        let price = self
            .currency
            .normalize_price(record.effective_close(), reference, full);
        Some((price, record.date))
    }

    /// Historical close on the trade date, strike as fallback
    fn trade_date_price(
        &self,
        underlying: &Underlying,
        full: &str,
        reference: f64,
        trade_date: Option<NaiveDate>,
    ) -> Option<PriceQuote> {
        if let Some(date) = trade_date {
            if let Some((price, date)) = self.exact_close(full, reference, date) {
                return Some(PriceQuote::new(price, Some(date), PriceSource::MarketDataCache));
            }
            debug!("{}: no trade-date close on {}", full, date);
        }
        underlying
            .strike
            .map(|strike| PriceQuote::new(strike, trade_date, PriceSource::StrikeFallback))
    }

    /// Historical close on the redemption date, last cached price as fallback
    fn redemption_price(
        &self,
        underlying: &Underlying,
        full: &str,
        reference: f64,
        date: NaiveDate,
        tag: PriceSource,
    ) -> Option<PriceQuote> {
        if let Some((price, date)) = self.exact_close(full, reference, date) {
            return Some(PriceQuote::new(price, Some(date), tag));
        }
        debug!("{}: no close on redemption date {}, using cached price", full, date);
        underlying.security_data.price.map(|cached| {
            let price = self.currency.normalize_price(cached, reference, full);
            PriceQuote::new(
                price,
                underlying.security_data.price_date.map(|d| d.date_naive()),
                PriceSource::FallbackCurrentPrice,
            )
        })
    }

    /// Current price: the cached value when it is dated today, otherwise a
    /// walk over venue ticker variants. A full miss resolves to `None`.
    fn live_price(&self, underlying: &Underlying, reference: f64) -> Option<PriceQuote> {
        let today = self.clock.now().date_naive();
        let cached_today = underlying
            .security_data
            .price_date
            .map(|d| d.date_naive() == today)
            .unwrap_or(false);

        if cached_today {
            if let Some(cached) = underlying.security_data.price {
                let full = ticker::full_ticker(&underlying.ticker);
                let price = self.currency.normalize_price(cached, reference, &full);
                return Some(PriceQuote::new(price, Some(today), PriceSource::MarketDataCache));
            }
        }

        for variant in ticker::live_price_variants(&underlying.ticker) {
            if let Some(quote) = self.store.current_price(&variant) {
                let price = self.currency.normalize_price(quote.price, reference, &variant);
                return Some(PriceQuote::new(
                    price,
                    Some(quote.date.date_naive()),
                    PriceSource::Live,
                ));
            }
        }
        debug!("{}: no live price across venue variants", underlying.ticker);
        None
    }

    /// The evaluation-price hierarchy. Absent tiers cascade; the last resort
    /// is the initial level retagged as a non-authoritative fallback.
    fn select_evaluation(
        &self,
        underlying: &Underlying,
        lifecycle: &Lifecycle,
        initial: &Option<PriceQuote>,
        redemption: &Option<PriceQuote>,
        final_observation: &Option<PriceQuote>,
        live: &Option<PriceQuote>,
    ) -> Option<PriceQuote> {
        if lifecycle.is_redeemed() || lifecycle.final_observation_passed {
            if let Some(quote) = redemption {
                return Some(*quote);
            }
        }
        if lifecycle.final_observation_passed {
            if let Some(quote) = final_observation {
                return Some(*quote);
            }
        }
        if let Some(quote) = live {
            return Some(*quote);
        }
        debug!(
            "{}: no market price resolved, falling back to initial level",
            underlying.ticker
        );
        initial.map(|quote| PriceQuote::new(quote.price, quote.date, PriceSource::InitialFallback))
    }
}
