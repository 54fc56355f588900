//! Valuation Engine CLI
//!
//! Evaluates a product book against a market-data directory and prints the
//! lifecycle, basket, and redemption figures for each product.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::Parser;

use valuation_engine::evaluation::Payoff;
use valuation_engine::marketdata::Clock;
use valuation_engine::{
    load_book, EvaluationEngine, FixedClock, InMemoryMarketData, MinorUnitNormalizer, SystemClock,
};

#[derive(Debug, Parser)]
#[command(name = "valuation_engine", about = "Evaluate structured note products")]
struct Args {
    /// JSON product book to evaluate
    #[arg(long, default_value = "data/book.json")]
    book: PathBuf,

    /// Directory containing history.csv and optionally spot.csv
    #[arg(long, default_value = "data/marketdata")]
    data: PathBuf,

    /// Evaluate as of this date (YYYY-MM-DD) instead of now
    #[arg(long)]
    as_of: Option<String>,

    /// Only evaluate the product with this id
    #[arg(long)]
    product: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut store = InMemoryMarketData::new();
    let history_path = args.data.join("history.csv");
    let records = store
        .load_history_csv(&history_path)
        .with_context(|| format!("loading {}", history_path.display()))?;
    println!(
        "Loaded {} historical records across {} series",
        records,
        store.series_count()
    );

    let spot_path = args.data.join("spot.csv");
    if spot_path.exists() {
        let quotes = store
            .load_spot_csv(&spot_path)
            .with_context(|| format!("loading {}", spot_path.display()))?;
        println!("Loaded {} current prices", quotes);
    }

    let mut products = load_book(&args.book)?;
    if let Some(id) = &args.product {
        products.retain(|p| &p.id == id);
        if products.is_empty() {
            anyhow::bail!("product {} not found in {}", id, args.book.display());
        }
    }
    println!("Evaluating {} products\n", products.len());

    let clock: Box<dyn Clock> = match &args.as_of {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid --as-of date '{}'", raw))?;
            Box::new(FixedClock(date.and_time(NaiveTime::MIN).and_utc()))
        }
        None => Box::new(SystemClock),
    };

    let normalizer = MinorUnitNormalizer;
    let engine = EvaluationEngine::new(&store, &normalizer, clock.as_ref());

    println!(
        "{:<36} {:>8} {:>18} {:>10} {:>12}",
        "Product", "Status", "Maturity", "Basket %", "Redemption %"
    );
    println!("{}", "-".repeat(90));

    let mut live = 0usize;
    let mut redeemed = 0usize;
    let mut indeterminate = 0usize;

    for product in &products {
        let result = engine.evaluate(product);

        println!(
            "{:<36} {:>8} {:>18} {:>10} {:>12}",
            truncate(&result.display_name, 36),
            result.status().to_string(),
            result.lifecycle.maturity_label.as_deref().unwrap_or("-"),
            result
                .basket_performance
                .map(|p| format!("{:+.2}", p))
                .unwrap_or_else(|| "-".to_string()),
            result
                .redemption_estimate()
                .map(|r| format!("{:.2}", r))
                .unwrap_or_else(|| "-".to_string()),
        );

        match &result.payoff {
            Payoff::Orion(orion) => {
                for leg in &orion.underlyings {
                    println!(
                        "    {:<20} perf {:>8} considered {:>8} upper barrier: {}",
                        leg.ticker,
                        format_pct(leg.performance),
                        format_pct(leg.considered_performance),
                        if leg.hit_upper_barrier { "hit" } else { "not hit" },
                    );
                }
            }
            Payoff::Participation(participation) => {
                if let Some(call) = &participation.call {
                    println!(
                        "    called {} at {:.2} + rebate {:.2} = {:.2}",
                        call.call_date.format("%Y-%m-%d"),
                        call.call_price,
                        call.rebate,
                        call.total_received,
                    );
                }
            }
        }

        for gap in &result.unresolved {
            println!("    unresolved: {}", gap);
        }

        if result.is_indeterminate() {
            indeterminate += 1;
        }
        if result.lifecycle.is_redeemed() {
            redeemed += 1;
        } else {
            live += 1;
        }
    }

    println!("\nSummary:");
    println!("  Live: {}", live);
    println!("  Redeemed/called: {}", redeemed);
    println!("  With unresolved data: {}", indeterminate);

    Ok(())
}

fn format_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.2}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let head: String = name.chars().take(width - 3).collect();
        format!("{}...", head)
    }
}
