//! AWS Lambda handler for on-demand product evaluation
//!
//! Accepts a product book plus the market data to evaluate it against and
//! returns one evaluation result per product. An optional `asOf` timestamp
//! freezes the evaluation clock for historical reruns.

use chrono::{DateTime, Utc};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use valuation_engine::evaluation::EvaluationResult;
use valuation_engine::marketdata::{Clock, CurrentPrice, PriceRecord};
use valuation_engine::{
    EvaluationEngine, FixedClock, InMemoryMarketData, MinorUnitNormalizer, Product, SystemClock,
};

/// One historical series in the request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesInput {
    ticker: String,
    history: Vec<PriceRecord>,
}

/// One live quote in the request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotInput {
    ticker: String,
    price: f64,
    date: DateTime<Utc>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationRequest {
    products: Vec<Product>,
    #[serde(default)]
    history: Vec<SeriesInput>,
    #[serde(default)]
    current_prices: Vec<SpotInput>,
    /// Freeze the evaluation clock for historical reruns
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationResponse {
    product_count: usize,
    results: Vec<EvaluationResult>,
    execution_time_ms: u64,
}

async fn handler(event: LambdaEvent<EvaluationRequest>) -> Result<EvaluationResponse, Error> {
    let start = std::time::Instant::now();
    let request = event.payload;

    let mut store = InMemoryMarketData::new();
    for series in request.history {
        store.insert_series(&series.ticker, series.history);
    }
    for spot in request.current_prices {
        store.insert_current_price(
            &spot.ticker,
            CurrentPrice {
                price: spot.price,
                date: spot.date,
                currency: spot.currency,
            },
        );
    }

    let clock: Box<dyn Clock> = match request.as_of {
        Some(at) => Box::new(FixedClock(at)),
        None => Box::new(SystemClock),
    };
    let normalizer = MinorUnitNormalizer;
    let engine = EvaluationEngine::new(&store, &normalizer, clock.as_ref());

    let results: Vec<EvaluationResult> = request
        .products
        .par_iter()
        .map(|product| engine.evaluate(product))
        .collect();

    Ok(EvaluationResponse {
        product_count: results.len(),
        results,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
