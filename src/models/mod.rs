mod asset;
mod price_history;
mod refresh;

pub use asset::{no_history_date, Asset, LatestPrice, NewAsset};
pub(crate) use price_history::PriceHistoryRow;
pub use price_history::PriceHistoryPoint;
pub use refresh::{RefreshOutcome, UpdatePricesResponse};
