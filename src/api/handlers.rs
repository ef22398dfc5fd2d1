//! HTTP handlers for the analytics API
//!
//! Handlers validate parameters, take one snapshot from the store, run a single query
//! operation over it and wrap the result. The wall clock is read here and nowhere
//! else; the query layer receives `now`/`today` as arguments.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use tracing::{debug, error, warn};

use super::types::*;
use crate::aggregation::{
    DailyBucket, DimensionBucket, HourlyBucket, MonthlyBucket, ProductBucket, ProductStats,
    SalesSummary, TodaySales, WeekdayBucket,
};
use crate::config::ApplicationConfig;
use crate::error::Error;
use crate::query::{Dashboard, ProductCatalog, SalesAnalytics, SalesLedger};
use crate::store::TabularStore;
use crate::types::{Product, Sale};

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler
pub struct AppState {
    /// Owner of the product and sales tables
    pub store: Arc<TabularStore>,
    /// Effective configuration (limits, CORS)
    pub config: ApplicationConfig,
}

impl AppState {
    pub fn new(store: Arc<TabularStore>, config: ApplicationConfig) -> Self {
        Self { store, config }
    }

    fn catalog(&self) -> ProductCatalog {
        ProductCatalog::new(self.store.products())
    }

    fn ledger(&self) -> SalesLedger {
        SalesLedger::new(self.store.sales())
    }

    fn analytics(&self) -> SalesAnalytics {
        SalesAnalytics::new(self.store.sales())
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, Error>;

// =============================================================================
// Error Mapping
// =============================================================================

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::StartupFailure(_) | Error::Configuration(_) | Error::Io(_) | Error::Csv(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    params
        .map(|Query(p)| p)
        .map_err(|e| Error::invalid_argument(e.body_text()))
}

/// Validate an optional integer parameter against `min..=max`
fn bounded(
    name: &str,
    value: Option<i64>,
    default: usize,
    min: usize,
    max: usize,
) -> Result<usize, Error> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match usize::try_from(raw) {
        Ok(v) if (min..=max).contains(&v) => Ok(v),
        _ if max == usize::MAX => Err(Error::invalid_argument(format!(
            "{} must be >= {}, got {}",
            name, min, raw
        ))),
        _ => Err(Error::invalid_argument(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, raw
        ))),
    }
}

// =============================================================================
// Service Handlers
// =============================================================================

/// Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "PC Store Analytics API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check; `degraded` when the sales dataset is missing
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    let (status, detail) = match snapshot.sales_status() {
        Ok(()) => ("healthy", None),
        Err(e) => ("degraded", Some(e.to_string())),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        sales_available: snapshot.sales_available(),
        generation: snapshot.generation(),
        detail,
    })
}

/// Prometheus metrics for the store
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.store.stats();

    let metrics = format!(
        "# HELP pcstore_products Products in the current snapshot\n\
         # TYPE pcstore_products gauge\n\
         pcstore_products {}\n\
         # HELP pcstore_sales Sale lines in the current snapshot\n\
         # TYPE pcstore_sales gauge\n\
         pcstore_sales {}\n\
         # HELP pcstore_sales_available Whether the sales dataset was found (1) or not (0)\n\
         # TYPE pcstore_sales_available gauge\n\
         pcstore_sales_available {}\n\
         # HELP pcstore_snapshot_generation Generation of the current snapshot\n\
         # TYPE pcstore_snapshot_generation gauge\n\
         pcstore_snapshot_generation {}\n\
         # HELP pcstore_reloads_total Successful reloads since startup\n\
         # TYPE pcstore_reloads_total counter\n\
         pcstore_reloads_total {}\n\
         # HELP pcstore_reload_failures_total Failed reloads since startup\n\
         # TYPE pcstore_reload_failures_total counter\n\
         pcstore_reload_failures_total {}\n\
         # HELP pcstore_last_load_timestamp_seconds Unix time the current snapshot was loaded\n\
         # TYPE pcstore_last_load_timestamp_seconds gauge\n\
         pcstore_last_load_timestamp_seconds {}\n",
        stats.products,
        stats.sales,
        u8::from(stats.sales_available),
        stats.generation,
        stats.reloads,
        stats.reload_failures,
        stats.loaded_at.timestamp(),
    );
    (StatusCode::OK, [("content-type", "text/plain")], metrics)
}

/// Composite dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Dashboard>> {
    let snapshot = state.store.snapshot();
    let today = Local::now().date_naive();
    Json(ApiResponse::new(Dashboard::build(
        &snapshot,
        today,
        &state.config.limits,
    )))
}

/// Re-read both datasets from disk
pub async fn reload(State(state): State<Arc<AppState>>) -> Response {
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || store.reload()).await {
        Ok(Ok(report)) => (
            StatusCode::OK,
            Json(ReloadResponse {
                success: true,
                data: report,
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "Reload rejected");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Reload task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("reload task failed")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Product Handlers
// =============================================================================

/// All products
pub async fn list_products(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Product>> {
    Ok(Json(ApiResponse::list(state.catalog().list_all())))
}

/// Substring search over name, brand, CPU and GPU
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<Product>> {
    let params = query_params(params)?;
    // blank queries are rejected; otherwise the raw text is matched
    let q = params.q.as_deref().unwrap_or_default();
    if q.trim().is_empty() {
        return Err(Error::invalid_argument("q must not be empty"));
    }
    debug!(q = %q, "Product search");
    Ok(Json(ApiResponse::list(state.catalog().search(q))))
}

/// Distinct brands
pub async fn list_brands(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    Ok(Json(ApiResponse::new(state.catalog().brands())))
}

/// Products of one brand
pub async fn products_by_brand(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(ApiResponse::list(state.catalog().by_brand(&brand))))
}

/// Products at or below a stock threshold
pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ThresholdParams>, QueryRejection>,
) -> ApiResult<Vec<Product>> {
    let params = query_params(params)?;
    let default = state.config.limits.default_low_stock_threshold as usize;
    let threshold = bounded("threshold", params.threshold, default, 0, u32::MAX as usize)?;
    let threshold = u32::try_from(threshold).unwrap_or(u32::MAX);
    Ok(Json(ApiResponse::list(state.catalog().low_stock(threshold))))
}

/// Catalogue statistics
pub async fn product_stats(State(state): State<Arc<AppState>>) -> ApiResult<ProductStats> {
    Ok(Json(ApiResponse::new(state.catalog().stats())))
}

/// First product whose name contains the path segment
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_name): Path<String>,
) -> ApiResult<Product> {
    let product = state.catalog().by_name(&product_name)?;
    Ok(Json(ApiResponse::new(product)))
}

// =============================================================================
// Sales Handlers
// =============================================================================

/// All sales, newest first
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> ApiResult<Vec<Sale>> {
    let params = query_params(params)?;
    let limit = params
        .limit
        .map(|raw| bounded("limit", Some(raw), 0, 1, usize::MAX))
        .transpose()?;
    Ok(Json(ApiResponse::list(state.ledger().sales(limit))))
}

/// Sales in the last `days` days
pub async fn recent_sales(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DaysParams>, QueryRejection>,
) -> ApiResult<Vec<Sale>> {
    let params = query_params(params)?;
    let default = state.config.limits.default_recent_days as usize;
    let days = bounded("days", params.days, default, 1, u32::MAX as usize)?;
    let days = u32::try_from(days).unwrap_or(u32::MAX);
    let now = Local::now().naive_local();
    Ok(Json(ApiResponse::list(state.ledger().recent_sales(days, now))))
}

/// Sales between two dates, both included
pub async fn sales_by_date_range(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DateRangeParams>, QueryRejection>,
) -> ApiResult<Vec<Sale>> {
    let params = query_params(params)?;
    let (Some(start), Some(end)) = (params.start_date, params.end_date) else {
        return Err(Error::invalid_argument(
            "start_date and end_date are required (YYYY-MM-DD)",
        ));
    };
    let rows = state.ledger().sales_by_date_range(&start, &end)?;
    Ok(Json(ApiResponse::list(rows)))
}

/// Whole-table sales summary
pub async fn sales_summary(State(state): State<Arc<AppState>>) -> ApiResult<SalesSummary> {
    Ok(Json(ApiResponse::new(state.ledger().summary())))
}

/// Sales on the current local day
pub async fn today_sales(State(state): State<Arc<AppState>>) -> ApiResult<TodaySales> {
    let today = Local::now().date_naive();
    Ok(Json(ApiResponse::new(state.ledger().today_sales(today))))
}

/// Best-selling products by revenue
pub async fn top_products(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> ApiResult<Vec<ProductBucket>> {
    let params = query_params(params)?;
    let limits = &state.config.limits;
    let limit = bounded(
        "limit",
        params.limit,
        limits.default_top_products,
        1,
        limits.max_top_products,
    )?;
    Ok(Json(ApiResponse::list(
        state.ledger().top_selling_products(limit),
    )))
}

// =============================================================================
// Analytics Handlers
// =============================================================================

/// Per-day rollup of the most recent days
pub async fn daily_analytics(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DaysParams>, QueryRejection>,
) -> ApiResult<Vec<DailyBucket>> {
    let params = query_params(params)?;
    let limits = &state.config.limits;
    let days = bounded(
        "days",
        params.days,
        limits.default_daily_days,
        1,
        limits.max_daily_days,
    )?;
    Ok(Json(ApiResponse::list(state.analytics().daily(days))))
}

/// Per-month rollup
pub async fn monthly_analytics(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<MonthlyBucket>> {
    Ok(Json(ApiResponse::list(state.analytics().monthly())))
}

/// Monday-to-Sunday rollup
pub async fn weekly_analytics(State(state): State<Arc<AppState>>) -> ApiResult<Vec<WeekdayBucket>> {
    Ok(Json(ApiResponse::new(state.analytics().weekly())))
}

/// Hour-of-day rollup
pub async fn hourly_analytics(State(state): State<Arc<AppState>>) -> ApiResult<Vec<HourlyBucket>> {
    Ok(Json(ApiResponse::list(state.analytics().hourly())))
}

/// Brand performance
pub async fn brand_analytics(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<DimensionBucket>> {
    Ok(Json(ApiResponse::list(state.analytics().brands())))
}

/// CPU performance
pub async fn cpu_analytics(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DimensionBucket>> {
    Ok(Json(ApiResponse::list(state.analytics().cpus())))
}

/// GPU performance
pub async fn gpu_analytics(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DimensionBucket>> {
    Ok(Json(ApiResponse::list(state.analytics().gpus())))
}
