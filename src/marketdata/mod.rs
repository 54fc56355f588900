//! Market data the engine consumes: ports, the in-memory reference store,
//! ticker normalization, and minor-unit currency handling

mod currency;
mod history;
mod ports;
pub mod ticker;

pub use currency::MinorUnitNormalizer;
pub use history::{CurrentPrice, HistoricalSeries, InMemoryMarketData, PriceRecord};
pub use ports::{Clock, CurrencyNormalizer, FixedClock, MarketDataStore, SystemClock};
