//! PC Store Analytics - inventory and sales analytics over flat datasets
//!
//! This library loads a product catalogue and a sales ledger from delimited files
//! into memory and answers read-only questions about them:
//! - Product search, lookup, low-stock filtering and catalogue statistics
//! - Daily, monthly, weekday and hourly sales rollups
//! - Brand, CPU and GPU performance rankings
//! - Sales summaries, time windows and top-selling products
//!
//! Datasets are held by a [`TabularStore`] that publishes immutable snapshots and
//! swaps them atomically on reload.

#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// In-memory tables with copy-then-swap reloads
pub mod store;

/// Zero-guarded arithmetic, bucket accumulators and result records
pub mod aggregation;

/// Product, sales and analytics queries over a snapshot
pub mod query;

/// Listing-title parsing and catalogue export for the scraper
pub mod catalog;

/// axum router and handlers
pub mod api;

// Re-export main types
pub use config::ApplicationConfig;
pub use error::{Error, LoadError, Result};
pub use store::{DataSources, LoadReport, Snapshot, StoreStats, TabularStore};
pub use types::{Product, Sale};
