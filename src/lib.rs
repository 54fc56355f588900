//! Valuation Engine - Product evaluation for structured notes
//!
//! This library provides:
//! - Lifecycle classification (live/matured/called) from product dates
//! - Prioritized price resolution with tagged fallback sources
//! - Historical barrier lookback scanning with currency normalization
//! - Basket aggregation (worst-of/best-of/average)
//! - Payoff calculators for the Orion and participation note families

pub mod error;
pub mod evaluation;
pub mod marketdata;
pub mod product;

// Re-export commonly used types
pub use error::EngineError;
pub use evaluation::{EvaluationEngine, EvaluationResult, LifecycleStatus};
pub use marketdata::{
    FixedClock, InMemoryMarketData, MarketDataStore, MinorUnitNormalizer, SystemClock,
};
pub use product::{load_book, Product, ProductFamily, Underlying};
