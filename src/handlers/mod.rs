pub mod products;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::app::AppState;
use crate::database::DatabaseManager;
use crate::error::ApiError;

/// GET /health - pings the database pool
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    let pool = match &state.pool {
        Some(pool) => pool,
        None => return ApiError::service_unavailable("database not configured").into_response(),
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("health - database ping failed: {}", e);
            ApiError::service_unavailable("database unavailable").into_response()
        }
    }
}

pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    tracing::info!(method = %method, path = %uri.path(), query = uri.query().unwrap_or(""), "Route not found");
    ApiError::not_found("Route not found")
}
