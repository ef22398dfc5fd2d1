//! In-memory tabular store
//!
//! The [`TabularStore`] owns both datasets. Readers take an [`Arc<Snapshot>`] and work
//! on it without holding any lock; a reload builds the next snapshot entirely off to
//! the side and then swaps the pointer under a short write lock, so in-flight readers
//! keep the table they started with and never observe a partial load.
//!
//! # Failure handling
//!
//! - Product catalogue missing or corrupt: [`Error::StartupFailure`]. On [`TabularStore::open`]
//!   the store is never built; on [`TabularStore::reload`] the previous snapshot stays
//!   published.
//! - Sales file missing: the snapshot carries an empty sales table and
//!   `sales_available == false`; every sales query returns its empty result.

pub mod loader;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{Error, LoadError, Result};
use crate::types::{Product, Sale};
pub use loader::{DataSources, SalesLoad, PRODUCT_COLUMNS, SALES_COLUMNS};

/// Immutable view of both tables at one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    loaded_at: DateTime<Utc>,
    products: Arc<[Product]>,
    sales: Arc<[Sale]>,
    sales_available: bool,
    skipped_sales: usize,
}

impl Snapshot {
    /// Build a snapshot from rows already in memory
    pub fn new(products: Vec<Product>, sales: Vec<Sale>) -> Self {
        Self {
            generation: 0,
            loaded_at: Utc::now(),
            products: products.into(),
            sales: sales.into(),
            sales_available: true,
            skipped_sales: 0,
        }
    }

    /// Monotonic load counter; the first load is generation 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the snapshot was built
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Product rows in file order
    pub fn products(&self) -> Arc<[Product]> {
        Arc::clone(&self.products)
    }

    /// Sale rows in file order
    pub fn sales(&self) -> Arc<[Sale]> {
        Arc::clone(&self.sales)
    }

    /// Whether the sales file was present at load time
    pub fn sales_available(&self) -> bool {
        self.sales_available
    }

    /// `Ok` when sales were loaded, [`Error::DataUnavailable`] otherwise
    pub fn sales_status(&self) -> Result<()> {
        if self.sales_available {
            Ok(())
        } else {
            Err(Error::DataUnavailable(
                "sales dataset not found; sales endpoints return empty data".to_string(),
            ))
        }
    }

    /// Summary of what this snapshot holds
    pub fn report(&self) -> LoadReport {
        LoadReport {
            generation: self.generation,
            products: self.products.len(),
            sales: self.sales.len(),
            skipped_sales: self.skipped_sales,
            sales_available: self.sales_available,
            loaded_at: self.loaded_at,
        }
    }
}

/// Outcome of a (re)load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub generation: u64,
    pub products: usize,
    pub sales: usize,
    pub skipped_sales: usize,
    pub sales_available: bool,
    pub loaded_at: DateTime<Utc>,
}

/// Store counters for the metrics endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub generation: u64,
    pub products: usize,
    pub sales: usize,
    pub sales_available: bool,
    /// Successful reloads since startup (the initial load excluded)
    pub reloads: u64,
    pub reload_failures: u64,
    pub loaded_at: DateTime<Utc>,
}

/// Owner of the product and sales tables
pub struct TabularStore {
    sources: DataSources,
    current: RwLock<Arc<Snapshot>>,
    // Serializes reloads so generations are handed out in order
    reload_lock: Mutex<()>,
    reloads: AtomicU64,
    reload_failures: AtomicU64,
}

impl std::fmt::Debug for TabularStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularStore")
            .field("sources", &self.sources)
            .field("generation", &self.current.read().generation)
            .finish()
    }
}

impl TabularStore {
    /// Load both datasets and build the store
    ///
    /// Fails with [`Error::StartupFailure`] when the product catalogue cannot be loaded.
    pub fn open(sources: DataSources) -> Result<Self> {
        let start = Instant::now();
        let snapshot = build_snapshot(&sources, 1)?;
        info!(
            products = snapshot.products.len(),
            sales = snapshot.sales.len(),
            sales_available = snapshot.sales_available,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Datasets loaded"
        );

        Ok(Self {
            sources,
            current: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
            reloads: AtomicU64::new(0),
            reload_failures: AtomicU64::new(0),
        })
    }

    /// Configured dataset locations
    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    /// Current snapshot; stays valid even if a reload publishes a newer one
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Current product table
    pub fn products(&self) -> Arc<[Product]> {
        self.snapshot().products()
    }

    /// Current sales table
    pub fn sales(&self) -> Arc<[Sale]> {
        self.snapshot().sales()
    }

    /// Re-read both datasets and publish them atomically
    ///
    /// On failure the previous snapshot remains current.
    pub fn reload(&self) -> Result<LoadReport> {
        let _guard = self.reload_lock.lock();
        let start = Instant::now();
        let generation = self.current.read().generation + 1;

        match build_snapshot(&self.sources, generation) {
            Ok(snapshot) => {
                let report = snapshot.report();
                *self.current.write() = Arc::new(snapshot);
                self.reloads.fetch_add(1, Ordering::Relaxed);
                info!(
                    generation,
                    products = report.products,
                    sales = report.sales,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Datasets reloaded"
                );
                Ok(report)
            }
            Err(e) => {
                self.reload_failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Reload failed; keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Counters for monitoring
    pub fn stats(&self) -> StoreStats {
        let snapshot = self.snapshot();
        StoreStats {
            generation: snapshot.generation,
            products: snapshot.products.len(),
            sales: snapshot.sales.len(),
            sales_available: snapshot.sales_available,
            reloads: self.reloads.load(Ordering::Relaxed),
            reload_failures: self.reload_failures.load(Ordering::Relaxed),
            loaded_at: snapshot.loaded_at,
        }
    }
}

fn build_snapshot(sources: &DataSources, generation: u64) -> Result<Snapshot> {
    let products = loader::load_products(&sources.products)?;

    let (sales, sales_available, skipped_sales) = match loader::load_sales(&sources.sales) {
        Ok(load) => (load.rows, true, load.skipped),
        Err(LoadError::MissingFile { path }) => {
            warn!(
                path = %path.display(),
                "Sales file not found; sales endpoints will return empty data"
            );
            (Vec::new(), false, 0)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Snapshot {
        generation,
        loaded_at: Utc::now(),
        products: products.into(),
        sales: sales.into(),
        sales_available,
        skipped_sales,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTS: &str = "product_name,brand,price,buying_price,stock_quantity\n\
                            A,Lenovo,100,80,3\n\
                            B,MSI,200,150,20\n";
    const SALES: &str = "sale_date,product_name,quantity,total_amount,total_cost,total_profit\n\
                         2024-01-01 10:00:00,A,1,100,80,20\n";

    fn sources(dir: &tempfile::TempDir) -> DataSources {
        DataSources::new(dir.path().join("products.csv"), dir.path().join("sales.csv"))
    }

    #[test]
    fn test_open_requires_products() {
        let dir = tempfile::tempdir().unwrap();
        let err = TabularStore::open(sources(&dir)).unwrap_err();
        assert!(matches!(err, Error::StartupFailure(ref e) if e.is_missing_file()));
    }

    #[test]
    fn test_missing_sales_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.csv"), PRODUCTS).unwrap();

        let store = TabularStore::open(sources(&dir)).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.products().len(), 2);
        assert!(snapshot.sales().is_empty());
        assert!(!snapshot.sales_available());
        assert!(matches!(snapshot.sales_status(), Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_reload_swaps_snapshot_and_keeps_old_handles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.csv"), PRODUCTS).unwrap();

        let store = TabularStore::open(sources(&dir)).unwrap();
        let before = store.snapshot();
        assert_eq!(before.generation(), 1);

        std::fs::write(dir.path().join("sales.csv"), SALES).unwrap();
        let report = store.reload().unwrap();
        assert_eq!(report.generation, 2);
        assert_eq!(report.sales, 1);
        assert!(report.sales_available);

        // the handle taken before the reload still sees the old table
        assert!(before.sales().is_empty());
        assert_eq!(store.sales().len(), 1);
        assert_eq!(store.stats().reloads, 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.csv"), PRODUCTS).unwrap();
        let store = TabularStore::open(sources(&dir)).unwrap();

        std::fs::write(dir.path().join("products.csv"), "product_name\nonly-a-name\n").unwrap();
        assert!(matches!(store.reload(), Err(Error::StartupFailure(_))));

        let stats = store.stats();
        assert_eq!(stats.generation, 1);
        assert_eq!(stats.products, 2);
        assert_eq!(stats.reload_failures, 1);
    }
}
