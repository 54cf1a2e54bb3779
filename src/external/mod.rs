pub mod coingecko;
pub mod price_provider;
