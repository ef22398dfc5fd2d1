//! Composite dashboard payload
//!
//! Gathers the headline figures and the three chart series the front page shows into
//! one response, all computed from a single snapshot so the numbers agree.

use chrono::NaiveDate;
use serde::Serialize;

use super::{ProductCatalog, SalesAnalytics, SalesLedger};
use crate::aggregation::{DailyBucket, DimensionBucket, ProductBucket};
use crate::config::QueryLimits;
use crate::store::Snapshot;

/// Headline figures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_products: usize,
    /// Units sold
    pub total_sales: u64,
    /// Lines sold today
    pub today_sales: usize,
    pub today_revenue: f64,
    pub today_profit: f64,
}

/// Chart series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardCharts {
    pub daily_trend: Vec<DailyBucket>,
    pub brand_performance: Vec<DimensionBucket>,
    pub top_products: Vec<ProductBucket>,
}

/// Everything the dashboard page renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub charts: DashboardCharts,
}

impl Dashboard {
    /// Build the dashboard from one snapshot
    ///
    /// `limits` decides how many days the trend covers and how many products are
    /// listed.
    pub fn build(snapshot: &Snapshot, today: NaiveDate, limits: &QueryLimits) -> Self {
        let catalog = ProductCatalog::from_snapshot(snapshot);
        let ledger = SalesLedger::from_snapshot(snapshot);
        let analytics = SalesAnalytics::from_snapshot(snapshot);

        let summary = ledger.summary();
        let today_sales = ledger.today_sales(today);

        Self {
            stats: DashboardStats {
                total_revenue: summary.total_revenue,
                total_profit: summary.total_profit,
                total_products: catalog.len(),
                total_sales: summary.total_sales,
                today_sales: today_sales.count,
                today_revenue: today_sales.revenue,
                today_profit: today_sales.profit,
            },
            charts: DashboardCharts {
                daily_trend: analytics.daily(limits.dashboard_daily_days),
                brand_performance: analytics.brands(),
                top_products: ledger.top_selling_products(limits.dashboard_top_products),
            },
        }
    }
}
