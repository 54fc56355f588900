//! Evaluation orchestrator
//!
//! Runs the full pipeline for one product: lifecycle classification, parallel
//! per-underlying price resolution, the barrier lookback (Orion), basket
//! aggregation, and the family payoff. Evaluation is a pure function of the
//! product document and the injected ports; inputs are never mutated and no
//! failure escapes as an error.

use chrono::{DateTime, NaiveTime, Utc};
use rayon::prelude::*;

use crate::marketdata::{ticker, Clock, CurrencyNormalizer, MarketDataStore};
use crate::product::{
    OrionParams, ParticipationParams, Product, ProductFamily, SecurityData, Underlying,
};
use super::basket::aggregate;
use super::lifecycle::{classify_orion, classify_participation, Lifecycle};
use super::lookback::BarrierLookbackScanner;
use super::orion::{evaluate_orion, OrionUnderlyingOutcome};
use super::participation::evaluate_participation;
use super::resolver::{PriceResolver, ResolvedPrices};
use super::result::{EvaluatedUnderlying, EvaluationResult, Payoff};

/// Evaluates products against injected market-data, currency, and clock ports
pub struct EvaluationEngine<'a> {
    store: &'a dyn MarketDataStore,
    currency: &'a dyn CurrencyNormalizer,
    clock: &'a dyn Clock,
}

impl<'a> EvaluationEngine<'a> {
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

    /// Evaluate one product. Total: data gaps surface in the result's
    /// `unresolved` list, never as an error.
    pub fn evaluate(&self, product: &Product) -> EvaluationResult {
        let now = self.clock.now();
        match product.product_family {
            ProductFamily::Orion => self.evaluate_orion_product(product, now),
            ProductFamily::Participation => self.evaluate_participation_product(product, now),
        }
    }

    fn evaluate_orion_product(&self, product: &Product, now: DateTime<Utc>) -> EvaluationResult {
        let params = OrionParams::from_product(product);
        let lifecycle = classify_orion(product, now);
        let resolver = PriceResolver::new(self.store, self.currency, self.clock);
        let scanner = BarrierLookbackScanner::new(self.store, self.currency, self.clock);

        let trade_date = product.effective_trade_date().map(|d| d.date_naive());
        let final_obs_date = product.effective_final_observation().map(|d| d.date_naive());

        // Underlyings are independent: resolve and scan them concurrently
        let legs: Vec<(EvaluatedUnderlying, OrionUnderlyingOutcome)> = product
            .underlyings
            .par_iter()
            .map(|underlying| {
                let prices = resolver.resolve(
                    underlying,
                    ProductFamily::Orion,
                    &lifecycle,
                    trade_date,
                    final_obs_date,
                );
                let scan = scanner.scan(underlying, product, &lifecycle, params.upper_barrier);
                let evaluated = enrich_underlying(underlying, product, prices);
                let outcome = OrionUnderlyingOutcome::new(
                    evaluated.full_ticker.clone(),
                    evaluated.performance,
                    scan,
                    &params,
                );
                (evaluated, outcome)
            })
            .collect();

        let (underlyings, outcomes): (Vec<_>, Vec<_>) = legs.into_iter().unzip();
        let mut unresolved = collect_gaps(product, &lifecycle, &underlyings);
        for outcome in &outcomes {
            if let super::lookback::BarrierScan::Indeterminate { reason } = outcome.barrier_scan {
                unresolved.push(format!("{}: barrier scan inconclusive: {}", outcome.ticker, reason));
            }
        }

        let payoff = evaluate_orion(params, outcomes);
        let basket_performance = payoff.basket_considered_performance;

        EvaluationResult {
            product_id: product.id.clone(),
            display_name: display_name(product),
            family: ProductFamily::Orion,
            lifecycle,
            underlyings,
            basket_performance,
            payoff: Payoff::Orion(payoff),
            unresolved,
            evaluated_at: now,
        }
    }

    fn evaluate_participation_product(
        &self,
        product: &Product,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        let params = ParticipationParams::from_product(product);
        let lifecycle = classify_participation(product, &params, now);
        let resolver = PriceResolver::new(self.store, self.currency, self.clock);

        let trade_date = product.effective_trade_date().map(|d| d.date_naive());

        let underlyings: Vec<EvaluatedUnderlying> = product
            .underlyings
            .par_iter()
            .map(|underlying| {
                let prices = resolver.resolve(
                    underlying,
                    ProductFamily::Participation,
                    &lifecycle,
                    trade_date,
                    None,
                );
                enrich_underlying(underlying, product, prices)
            })
            .collect();

        let unresolved = collect_gaps(product, &lifecycle, &underlyings);

        // Basket figures only when every constituent resolved
        let performances: Option<Vec<f64>> =
            underlyings.iter().map(|u| u.performance).collect();
        let basket_performance =
            performances.and_then(|perfs| aggregate(&perfs, params.basket_mode));

        let payoff = evaluate_participation(
            params,
            basket_performance,
            &lifecycle,
            product.effective_trade_date(),
        );

        EvaluationResult {
            product_id: product.id.clone(),
            display_name: display_name(product),
            family: ProductFamily::Participation,
            lifecycle,
            underlyings,
            basket_performance,
            payoff: Payoff::Participation(payoff),
            unresolved,
            evaluated_at: now,
        }
    }
}

/// Percent performance of the evaluation price over the initial level.
/// Fallback-tagged evaluation prices are not authoritative and yield `None`
/// rather than a fake zero.
fn performance(prices: &ResolvedPrices) -> Option<f64> {
    let initial = prices.initial.filter(|q| q.price > 0.0)?;
    let evaluation = prices.evaluation.filter(|q| q.is_authoritative())?;
    Some((evaluation.price / initial.price - 1.0) * 100.0)
}

/// Build the per-underlying output, including the refreshed security-data
/// copy. The input underlying is left untouched.
fn enrich_underlying(
    underlying: &Underlying,
    product: &Product,
    prices: ResolvedPrices,
) -> EvaluatedUnderlying {
    let full_ticker = ticker::full_ticker(&underlying.ticker);
    let performance = performance(&prices);

    let incoming = &underlying.security_data;
    let security_data = SecurityData {
        price: prices.live.map(|q| q.price).or(incoming.price),
        price_date: prices
            .live
            .and_then(|q| q.date)
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .or(incoming.price_date),
        trade_date_price: prices.trade_date.map(|q| q.price),
        redemption_price: prices.redemption.map(|q| q.price).or(incoming.redemption_price),
        final_observation_price: prices
            .final_observation
            .map(|q| q.price)
            .or(incoming.final_observation_price),
        currency: incoming
            .currency
            .clone()
            .or_else(|| product.currency.clone()),
        ticker: Some(full_ticker.clone()),
    };

    EvaluatedUnderlying {
        ticker: underlying.ticker.clone(),
        full_ticker,
        name: underlying.name.clone(),
        isin: underlying.isin.clone(),
        strike: underlying.strike,
        prices,
        performance,
        security_data,
    }
}

/// Data gaps shared by both families
fn collect_gaps(
    product: &Product,
    lifecycle: &Lifecycle,
    underlyings: &[EvaluatedUnderlying],
) -> Vec<String> {
    let mut gaps = Vec::new();
    if product.effective_maturity().is_none() {
        gaps.push("product: missing maturity date".to_string());
    }
    if lifecycle.is_redeemed() && lifecycle.redemption_date.is_none() {
        gaps.push("product: redeemed without a redemption date".to_string());
    }
    for underlying in underlyings {
        if underlying.performance.is_none() {
            gaps.push(format!(
                "{}: no authoritative evaluation price",
                underlying.full_ticker
            ));
        }
    }
    gaps
}

/// Human-readable product label for dashboards and reports
fn display_name(product: &Product) -> String {
    let base = product
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| {
            let tickers: Vec<&str> = product
                .underlyings
                .iter()
                .map(|u| u.ticker.as_str())
                .collect();
            if tickers.is_empty() {
                product.id.clone()
            } else {
                tickers.join(" / ")
            }
        });

    let label = product.product_family.label();
    match product.effective_maturity() {
        Some(maturity) => format!("{} {} {}", base, label, maturity.format("%Y")),
        None => format!("{} {}", base, label),
    }
}
