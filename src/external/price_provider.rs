use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

/// A coin as reported by the upstream market-data provider, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: BigDecimal,
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current market data for the given upstream ids, in one batched call.
    /// Ids unknown to the provider are simply absent from the result.
    async fn fetch_markets(
        &self,
        ids: &[String],
    ) -> Result<Vec<MarketCoin>, PriceProviderError>;

    /// The first `count` coins ordered by market capitalization.
    async fn fetch_top_coins(
        &self,
        count: u32,
    ) -> Result<Vec<MarketCoin>, PriceProviderError>;
}
