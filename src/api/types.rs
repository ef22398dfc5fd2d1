//! Request and response types for the HTTP API
//!
//! Every successful response is wrapped in [`ApiResponse`]; list endpoints also carry
//! the number of items. Failures use [`ErrorResponse`].

use serde::{Deserialize, Serialize};

use crate::store::LoadReport;

// =============================================================================
// Envelopes
// =============================================================================

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// Item count, present for list endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    /// Wrap a single record or summary
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wrap a list and report its length
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            success: true,
            data,
            count: Some(count),
        }
    }
}

/// Failure envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// =============================================================================
// Service endpoints
// =============================================================================

/// Banner returned by `GET /`
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

/// Health check response
///
/// `degraded` means the server is up but the sales dataset was not found.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sales_available: bool,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of a successful reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub data: LoadReport,
}

// =============================================================================
// Query parameters
// =============================================================================
//
// Numeric parameters are taken as signed integers so negative input reaches the
// handler and gets the API's own error message instead of a decode failure.

/// `?q=` for product search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// `?threshold=` for the low-stock filter
#[derive(Debug, Default, Deserialize)]
pub struct ThresholdParams {
    #[serde(default)]
    pub threshold: Option<i64>,
}

/// `?limit=` for listings and rankings
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `?days=` for look-back windows
#[derive(Debug, Default, Deserialize)]
pub struct DaysParams {
    #[serde(default)]
    pub days: Option<i64>,
}

/// `?start_date=&end_date=` for range filters
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}
