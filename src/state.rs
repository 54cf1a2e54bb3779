use std::sync::Arc;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use crate::external::price_provider::PriceProvider;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub seed_count: u32,
    // Held for the whole of a refresh so overlapping calls run one after another.
    pub refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, price_provider: Arc<dyn PriceProvider>, seed_count: u32) -> Self {
        Self {
            pool,
            price_provider,
            seed_count,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }
}
