use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers;
use crate::services::ProductServices;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub services: ProductServices,
    /// Absent only when the router is built without a database, as in handler tests
    pub pool: Option<PgPool>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(services: ProductServices, pool: Option<PgPool>, config: Arc<AppConfig>) -> Self {
        Self { services, pool, config }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .merge(product_routes())
        .fallback(handlers::fallback)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(&config) {
        app = app.layer(cors);
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn product_routes() -> Router<AppState> {
    use handlers::products;

    Router::new()
        .route("/products", get(products::list_products).post(products::create_product))
        .route(
            "/products/:id",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/shops/:shop_id/products", get(products::list_shop_products))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    let methods = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    Some(CorsLayer::new().allow_origin(origins).allow_methods(methods).allow_headers(tower_http::cors::Any))
}
