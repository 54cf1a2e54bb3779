use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{LatestPrice, NewAsset, PriceHistoryPoint, RefreshOutcome};

/// Fetches today's prices for every tracked asset and records one history
/// point per asset per day.
///
/// When nothing is tracked yet, the top `seed_count` coins by market cap are
/// seeded first. Seeding is committed on its own, so it survives a failing
/// price fetch. Upstream failures become `RefreshOutcome::UpstreamUnavailable`;
/// only database failures are returned as errors.
pub async fn refresh_prices(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    seed_count: u32,
    today: NaiveDate,
) -> Result<RefreshOutcome, AppError> {
    let mut assets = db::asset_queries::fetch_all(pool).await?;

    if assets.is_empty() {
        info!("No assets tracked, seeding top {} coins", seed_count);
        if let Err(e) = seed_default_assets(pool, provider, seed_count).await {
            return upstream_failure("seeding default coins", e);
        }
        assets = db::asset_queries::fetch_all(pool).await?;
    }

    if assets.is_empty() {
        warn!("Still no assets after seeding, nothing to refresh");
        return Ok(RefreshOutcome::NoAssetsTracked);
    }

    let ids: Vec<String> = assets.iter().map(|a| a.external_id.clone()).collect();
    let market = match provider.fetch_markets(&ids).await {
        Ok(coins) => coins,
        Err(e) => return upstream_failure("fetching prices", e),
    };

    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    let mut skipped = 0;

    for asset in &assets {
        let Some(coin) = market.iter().find(|c| c.id == asset.external_id) else {
            skipped += 1;
            continue;
        };

        if asset.icon_url.as_deref().map_or(true, str::is_empty) {
            if let Some(image) = &coin.image {
                db::asset_queries::backfill_icon(&mut *tx, asset.id, image).await?;
            }
        }

        if db::price_history_queries::exists_for_date(&mut *tx, asset.id, today).await? {
            skipped += 1;
            continue;
        }

        if db::price_history_queries::insert_if_absent(&mut *tx, asset.id, &coin.current_price, today).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit price refresh: {}", e);
        AppError::Db(e)
    })?;

    info!("Price refresh for {}: {} inserted, {} skipped", today, inserted, skipped);
    Ok(RefreshOutcome::Updated { inserted, skipped })
}

/// Seeds the top `count` coins by market cap. Does nothing if any asset is
/// already tracked. Returns the number of assets inserted.
pub async fn seed_default_assets(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    count: u32,
) -> Result<usize, RefreshError> {
    if db::asset_queries::count(pool).await? > 0 {
        return Ok(0);
    }

    let coins = provider.fetch_top_coins(count).await?;

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for coin in coins {
        if db::asset_queries::exists_by_external_id(&mut *tx, &coin.id).await? {
            continue;
        }

        let asset = NewAsset {
            name: coin.name,
            symbol: coin.symbol,
            external_id: coin.id,
            icon_url: coin.image,
        };
        if db::asset_queries::insert(&mut *tx, &asset).await?.is_some() {
            inserted += 1;
        }
    }

    tx.commit().await?;
    info!("Seeded {} default assets", inserted);
    Ok(inserted)
}

/// Latest and previous price of every tracked asset, in asset id order.
pub async fn get_latest_prices(pool: &SqlitePool) -> Result<Vec<LatestPrice>, AppError> {
    let assets = db::asset_queries::fetch_all(pool).await.map_err(|e| {
        error!("Failed to fetch assets: {}", e);
        AppError::Db(e)
    })?;

    let mut history = db::price_history_queries::fetch_latest_two_batch(pool).await.map_err(|e| {
        error!("Failed to fetch latest prices: {}", e);
        AppError::Db(e)
    })?;

    Ok(assets
        .into_iter()
        .map(|asset| {
            let points = history.remove(&asset.id).unwrap_or_default();
            LatestPrice::from_history(asset, &points)
        })
        .collect())
}

/// Full daily history of one asset, newest first.
pub async fn get_price_history(
    pool: &SqlitePool,
    asset_id: i64,
) -> Result<Vec<PriceHistoryPoint>, AppError> {
    if db::asset_queries::fetch_one(pool, asset_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    db::price_history_queries::fetch_for_asset(pool, asset_id).await.map_err(|e| {
        error!("Failed to fetch price history for asset {}: {}", asset_id, e);
        AppError::Db(e)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Upstream(#[from] PriceProviderError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

fn upstream_failure(stage: &str, err: impl Into<RefreshError>) -> Result<RefreshOutcome, AppError> {
    match err.into() {
        RefreshError::Db(e) => Err(AppError::Db(e)),
        RefreshError::Upstream(e) => {
            warn!("Upstream unavailable while {}: {}", stage, e);
            Ok(RefreshOutcome::UpstreamUnavailable)
        }
    }
}
