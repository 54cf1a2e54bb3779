use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models::{LatestPrice, PriceHistoryPoint, UpdatePricesResponse};
use crate::routes::{crypto, health};
use crate::state::AppState;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(crypto::update_prices, crypto::get_latest_prices, crypto::get_price_history),
    components(schemas(LatestPrice, PriceHistoryPoint, UpdatePricesResponse)),
    tags((name = "crypto", description = "Daily crypto price tracking"))
)]
pub struct ApiDoc;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/crypto", crypto::router())
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
