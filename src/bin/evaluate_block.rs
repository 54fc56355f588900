//! Evaluate an entire product book in parallel
//!
//! Outputs one CSV row per product for comparison against the dashboard's
//! figures. Products are evaluated independently so one product's data
//! problem cannot affect another's result.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use valuation_engine::evaluation::{EvaluationResult, Payoff};
use valuation_engine::{
    load_book, EvaluationEngine, InMemoryMarketData, MinorUnitNormalizer, SystemClock,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let book_path = PathBuf::from(args.next().unwrap_or_else(|| "data/book.json".to_string()));
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data/marketdata".to_string()));

    let start = Instant::now();
    println!("Loading market data from {}...", data_dir.display());

    let mut store = InMemoryMarketData::new();
    store.load_history_csv(&data_dir.join("history.csv"))?;
    let spot_path = data_dir.join("spot.csv");
    if spot_path.exists() {
        store.load_spot_csv(&spot_path)?;
    }

    let products = load_book(&book_path)?;
    println!("Loaded {} products in {:?}", products.len(), start.elapsed());

    let normalizer = MinorUnitNormalizer;
    let clock = SystemClock;
    let engine = EvaluationEngine::new(&store, &normalizer, &clock);

    println!("Evaluating...");
    let eval_start = Instant::now();

    // One product per task; failures stay contained in each result
    let results: Vec<EvaluationResult> = products
        .par_iter()
        .map(|product| engine.evaluate(product))
        .collect();

    println!("Evaluation complete in {:?}", eval_start.elapsed());

    let csv_path = "evaluation_output.csv";
    let mut file = File::create(csv_path).expect("Unable to create CSV file");

    writeln!(
        file,
        "ProductId,DisplayName,Family,Status,DaysToMaturity,BasketPerformance,Redemption,UpperBarrierHits,ProtectionApplied,Unresolved"
    )
    .unwrap();

    for result in &results {
        let (hits, protection_applied) = match &result.payoff {
            Payoff::Orion(orion) => (orion.upper_barrier_hits.to_string(), String::new()),
            Payoff::Participation(p) => (String::new(), p.protection_applied.to_string()),
        };
        writeln!(
            file,
            "{},{},{:?},{},{},{},{},{},{},{}",
            result.product_id,
            result.display_name.replace(',', ";"),
            result.family,
            result.status(),
            result
                .lifecycle
                .days_to_maturity
                .map(|d| d.to_string())
                .unwrap_or_default(),
            result
                .basket_performance
                .map(|p| format!("{:.6}", p))
                .unwrap_or_default(),
            result
                .redemption_estimate()
                .map(|r| format!("{:.6}", r))
                .unwrap_or_default(),
            hits,
            protection_applied,
            result.unresolved.len(),
        )
        .unwrap();
    }

    println!("Results written to: {}", csv_path);

    let live = results.iter().filter(|r| !r.lifecycle.is_redeemed()).count();
    let indeterminate = results.iter().filter(|r| r.is_indeterminate()).count();
    println!("\nSummary:");
    println!("  Products: {}", results.len());
    println!("  Live: {}", live);
    println!("  Redeemed/called: {}", results.len() - live);
    println!("  With unresolved data: {}", indeterminate);
    println!("  Total time: {:?}", start.elapsed());

    Ok(())
}
