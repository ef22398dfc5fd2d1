//! Query layer over the tabular store
//!
//! Each view wraps one table of a [`crate::store::Snapshot`] and answers read-only
//! questions about it:
//!
//! - **products**: [`ProductCatalog`] search, lookup, low-stock and statistics
//! - **sales**: [`SalesLedger`] listings, windows, summaries, top products
//! - **analytics**: [`SalesAnalytics`] daily/monthly/weekly/hourly and brand/CPU/GPU rollups
//! - **dashboard**: [`Dashboard`] composite of the above
//!
//! Views hold an `Arc` of their table, so they are cheap to build per request and
//! never observe a reload that happens while they are in use.

pub mod analytics;
pub mod dashboard;
pub mod products;
pub mod sales;

pub use analytics::SalesAnalytics;
pub use dashboard::{Dashboard, DashboardCharts, DashboardStats};
pub use products::{ProductCatalog, LOW_STOCK_THRESHOLD};
pub use sales::SalesLedger;
