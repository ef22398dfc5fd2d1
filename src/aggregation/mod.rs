//! Aggregation primitives for the sales and product rollups
//!
//! - **functions**: zero-guarded division, margins, running means
//! - **bucket**: the [`Totals`] accumulator every group-by folds rows into
//! - **data_model**: the flat result records returned to callers

pub mod bucket;
pub mod data_model;
pub mod functions;

pub use bucket::Totals;
pub use data_model::{
    DailyBucket, Dimension, DimensionBucket, HourlyBucket, MonthlyBucket, ProductBucket,
    ProductStats, SalesSummary, TodaySales, WeekdayBucket,
};
pub use functions::{margin_pct, safe_div, Mean};
