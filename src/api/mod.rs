//! HTTP API
//!
//! # Endpoints
//!
//! ## Service
//! - `GET /` - Service banner
//! - `GET /health` - Health check (`degraded` without sales data)
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/dashboard` - Dashboard figures and charts
//! - `POST /api/admin/reload` - Re-read both datasets
//!
//! ## Products
//! - `GET /api/products` - All products
//! - `GET /api/products/search?q=` - Search name, brand, CPU and GPU
//! - `GET /api/products/brands` - Distinct brands
//! - `GET /api/products/brands/{brand}` - Products of a brand
//! - `GET /api/products/low-stock?threshold=` - Products at or below a stock level
//! - `GET /api/products/stats` - Catalogue statistics
//! - `GET /api/products/{product_name}` - Single product lookup
//!
//! ## Sales
//! - `GET /api/sales?limit=` - Sales, newest first
//! - `GET /api/sales/recent?days=` - Sales in the last days
//! - `GET /api/sales/date-range?start_date=&end_date=` - Sales between two dates
//! - `GET /api/sales/summary` - Totals
//! - `GET /api/sales/today` - Today's totals
//! - `GET /api/sales/top-products?limit=` - Best sellers by revenue
//!
//! ## Analytics
//! - `GET /api/analytics/{daily,monthly,weekly,hourly}` - Time rollups
//! - `GET /api/analytics/{brands,cpu,gpu}` - Dimension rollups

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use handlers::AppState;

/// Build the CORS layer; an empty origin list allows any origin
pub fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let products = Router::new()
        .route("/", get(handlers::list_products))
        .route("/search", get(handlers::search_products))
        .route("/brands", get(handlers::list_brands))
        .route("/brands/{brand}", get(handlers::products_by_brand))
        .route("/low-stock", get(handlers::low_stock))
        .route("/stats", get(handlers::product_stats))
        .route("/{product_name}", get(handlers::get_product));

    let sales = Router::new()
        .route("/", get(handlers::list_sales))
        .route("/recent", get(handlers::recent_sales))
        .route("/date-range", get(handlers::sales_by_date_range))
        .route("/summary", get(handlers::sales_summary))
        .route("/today", get(handlers::today_sales))
        .route("/top-products", get(handlers::top_products));

    let analytics = Router::new()
        .route("/daily", get(handlers::daily_analytics))
        .route("/monthly", get(handlers::monthly_analytics))
        .route("/weekly", get(handlers::weekly_analytics))
        .route("/hourly", get(handlers::hourly_analytics))
        .route("/brands", get(handlers::brand_analytics))
        .route("/cpu", get(handlers::cpu_analytics))
        .route("/gpu", get(handlers::gpu_analytics));

    Router::new()
        // Service
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/admin/reload", post(handlers::reload))
        // Queries
        .nest("/api/products", products)
        .nest("/api/sales", sales)
        .nest("/api/analytics", analytics)
        // State, CORS and request tracing
        .with_state(state.clone())
        .layer(build_cors_layer(&state.config.security.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
