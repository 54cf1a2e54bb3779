#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crypto_price_tracker::db::{self, asset_queries, price_history_queries};
use crypto_price_tracker::external::price_provider::{MarketCoin, PriceProvider, PriceProviderError};
use crypto_price_tracker::models::NewAsset;

pub const TOP_TEN: [(&str, &str, &str, &str); 10] = [
    ("bitcoin", "btc", "Bitcoin", "67321.52"),
    ("ethereum", "eth", "Ethereum", "3456.78"),
    ("tether", "usdt", "Tether", "1.0001"),
    ("binancecoin", "bnb", "BNB", "589.12"),
    ("solana", "sol", "Solana", "145.33"),
    ("usd-coin", "usdc", "USDC", "0.9998"),
    ("ripple", "xrp", "XRP", "0.5231"),
    ("dogecoin", "doge", "Dogecoin", "0.1234"),
    ("cardano", "ada", "Cardano", "0.4512"),
    ("tron", "trx", "TRON", "0.1198"),
];

pub fn coin(id: &str, symbol: &str, name: &str, price: &str) -> MarketCoin {
    MarketCoin {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        current_price: BigDecimal::from_str(price).unwrap(),
        image: Some(format!("https://img.example/{}.png", id)),
    }
}

pub fn top_ten() -> Vec<MarketCoin> {
    TOP_TEN.iter().map(|(id, s, n, p)| coin(id, s, n, p)).collect()
}

/// In-process stand-in for the market-data API.
pub struct StubProvider {
    pub coins: Vec<MarketCoin>,
    pub fail_markets: AtomicBool,
    pub fail_top: AtomicBool,
    pub market_calls: AtomicUsize,
    pub top_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(coins: Vec<MarketCoin>) -> Self {
        Self {
            coins,
            fail_markets: AtomicBool::new(false),
            fail_top: AtomicBool::new(false),
            market_calls: AtomicUsize::new(0),
            top_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let stub = Self::new(top_ten());
        stub.fail_markets.store(true, Ordering::SeqCst);
        stub.fail_top.store(true, Ordering::SeqCst);
        stub
    }
}

#[async_trait]
impl PriceProvider for StubProvider {
    async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<MarketCoin>, PriceProviderError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_markets.load(Ordering::SeqCst) {
            return Err(PriceProviderError::Network("connection refused".into()));
        }
        Ok(self
            .coins
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn fetch_top_coins(&self, count: u32) -> Result<Vec<MarketCoin>, PriceProviderError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_top.load(Ordering::SeqCst) {
            return Err(PriceProviderError::Status(503));
        }
        Ok(self.coins.iter().take(count as usize).cloned().collect())
    }
}

pub async fn memory_pool() -> SqlitePool {
    db::connect_in_memory().await.unwrap()
}

pub async fn add_asset(pool: &SqlitePool, external_id: &str, icon_url: Option<&str>) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    asset_queries::insert(
        &mut conn,
        &NewAsset {
            name: external_id.to_string(),
            symbol: external_id.chars().take(3).collect(),
            external_id: external_id.to_string(),
            icon_url: icon_url.map(String::from),
        },
    )
    .await
    .unwrap()
    .unwrap()
}

pub async fn add_price(pool: &SqlitePool, asset_id: i64, price: &str, date: NaiveDate) {
    let mut conn = pool.acquire().await.unwrap();
    price_history_queries::insert_if_absent(&mut conn, asset_id, &BigDecimal::from_str(price).unwrap(), date)
        .await
        .unwrap();
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
