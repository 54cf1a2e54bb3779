use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use tracing::{error, info};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

// Liveness plus a round trip to the database.
async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    info!("GET /health - Health check");
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Health check failed, database unreachable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}
