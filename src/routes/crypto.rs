use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{LatestPrice, PriceHistoryPoint, RefreshOutcome, UpdatePricesResponse};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update-prices", post(update_prices))
        .route("/latest-prices", get(get_latest_prices))
        .route("/:id/history", get(get_price_history))
}

/// Seeds the default coins if needed and records today's price for every asset.
#[utoipa::path(
    post,
    path = "/api/crypto/update-prices",
    tag = "crypto",
    responses(
        (status = 200, description = "Refresh acknowledged; `status` tells what happened", body = UpdatePricesResponse),
        (status = 500, description = "Database failure")
    )
)]
pub async fn update_prices(
    State(state): State<AppState>,
) -> Result<Json<UpdatePricesResponse>, AppError> {
    info!("POST /api/crypto/update-prices - Refreshing prices");
    let _guard = state.refresh_lock.lock().await;

    let today = Utc::now().date_naive();
    let outcome = services::price_service::refresh_prices(
        &state.pool,
        state.price_provider.as_ref(),
        state.seed_count,
        today,
    ).await
        .map_err(|e| {
            error!("Failed to refresh prices: {}", e);
            e
        })?;

    if outcome == RefreshOutcome::UpstreamUnavailable {
        warn!("Price refresh finished without upstream data");
    }
    Ok(Json(UpdatePricesResponse::from(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/crypto/latest-prices",
    tag = "crypto",
    responses(
        (status = 200, description = "Latest and previous price per tracked asset", body = [LatestPrice]),
        (status = 500, description = "Database failure")
    )
)]
pub async fn get_latest_prices(
    State(state): State<AppState>,
) -> Result<Json<Vec<LatestPrice>>, AppError> {
    info!("GET /api/crypto/latest-prices - Getting latest prices");
    let prices = services::price_service::get_latest_prices(&state.pool).await
        .map_err(|e| {
            error!("Failed to get latest prices: {}", e);
            e
        })?;
    Ok(Json(prices))
}

#[utoipa::path(
    get,
    path = "/api/crypto/{id}/history",
    tag = "crypto",
    params(("id" = i64, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Daily prices, newest first", body = [PriceHistoryPoint]),
        (status = 404, description = "Unknown asset")
    )
)]
pub async fn get_price_history(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PriceHistoryPoint>>, AppError> {
    info!("GET /api/crypto/{}/history - Getting price history", id);
    let history = services::price_service::get_price_history(&state.pool, id).await
        .map_err(|e| {
            if !matches!(e, AppError::NotFound) {
                error!("Failed to get price history for asset {}: {}", id, e);
            }
            e
        })?;
    Ok(Json(history))
}
