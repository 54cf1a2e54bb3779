use crate::config::VS_CURRENCY;
use crate::external::price_provider::{MarketCoin, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, PriceProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_markets(&self, query: &[(&str, String)]) -> Result<Vec<MarketCoin>, PriceProviderError> {
        let url = format!("{}/coins/markets", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PriceProviderError::Status(resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        parse_markets(&body)
    }
}

// Every field is optional here so one malformed entry doesn't sink the whole page.
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    current_price: Option<serde_json::Number>,
    image: Option<String>,
}

impl CoinGeckoMarket {
    fn validate(self) -> Result<MarketCoin, String> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or("missing id")?;
        let symbol = self.symbol.ok_or_else(|| format!("{}: missing symbol", id))?;
        let name = self.name.ok_or_else(|| format!("{}: missing name", id))?;
        let price = self
            .current_price
            .ok_or_else(|| format!("{}: missing current_price", id))?;
        let current_price = BigDecimal::from_str(&price.to_string())
            .map_err(|e| format!("{}: bad current_price {}: {}", id, price, e))?;

        Ok(MarketCoin {
            id,
            symbol,
            name,
            current_price,
            image: self.image.filter(|url| !url.is_empty()),
        })
    }
}

/// Parses a `/coins/markets` payload. The body must be a JSON array; entries
/// failing validation are logged and dropped.
pub(crate) fn parse_markets(body: &str) -> Result<Vec<MarketCoin>, PriceProviderError> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| PriceProviderError::Parse(e.to_string()))?;

    let coins = entries
        .into_iter()
        .filter_map(|entry| {
            match serde_json::from_value::<CoinGeckoMarket>(entry)
                .map_err(|e| e.to_string())
                .and_then(CoinGeckoMarket::validate)
            {
                Ok(coin) => Some(coin),
                Err(reason) => {
                    warn!("Skipping malformed market entry: {}", reason);
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    debug!("Parsed {} market entries", coins.len());
    Ok(coins)
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_markets(
        &self,
        ids: &[String],
    ) -> Result<Vec<MarketCoin>, PriceProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.get_markets(&[
            ("vs_currency", VS_CURRENCY.to_string()),
            ("ids", ids.join(",")),
            ("order", "market_cap_desc".to_string()),
        ])
        .await
    }

    async fn fetch_top_coins(
        &self,
        count: u32,
    ) -> Result<Vec<MarketCoin>, PriceProviderError> {
        self.get_markets(&[
            ("vs_currency", VS_CURRENCY.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", count.to_string()),
            ("page", "1".to_string()),
        ])
        .await
    }
}
