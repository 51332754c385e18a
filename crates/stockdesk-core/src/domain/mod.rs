//! Canonical domain models shared by every provider.

mod models;
mod ticker;
mod timeframe;
mod timestamp;

pub use models::{FinancialData, FiscalPeriod, MarketStatus, NewsArticle, Ohlcv, Quote};
pub use ticker::Ticker;
pub use timeframe::Timeframe;
pub use timestamp::UtcDateTime;
