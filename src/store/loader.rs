//! Dataset ingestion from delimited files
//!
//! Reads the product catalogue and the sales transactions with the `csv` crate,
//! checks the header for required columns, and coerces every row into its typed
//! record. Type coercion happens once here so the query layer never re-parses.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::DataConfig;
use crate::error::LoadError;
use crate::types::{Product, ProductRecord, Sale, SaleRecord};

/// Columns the product catalogue must carry
pub const PRODUCT_COLUMNS: &[&str] = &[
    "product_name",
    "brand",
    "price",
    "buying_price",
    "stock_quantity",
];

/// Columns the sales file must carry
pub const SALES_COLUMNS: &[&str] = &[
    "sale_date",
    "product_name",
    "quantity",
    "total_amount",
    "total_profit",
];

/// Where the two datasets live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    /// Product catalogue file
    pub products: PathBuf,
    /// Sales transactions file
    pub sales: PathBuf,
}

impl DataSources {
    /// Create sources from explicit paths
    pub fn new(products: impl Into<PathBuf>, sales: impl Into<PathBuf>) -> Self {
        Self {
            products: products.into(),
            sales: sales.into(),
        }
    }
}

impl From<&DataConfig> for DataSources {
    fn from(config: &DataConfig) -> Self {
        Self::new(config.products_path(), config.sales_path())
    }
}

/// Rows read from the sales file
#[derive(Debug, Default)]
pub struct SalesLoad {
    /// Successfully coerced sales, in file order
    pub rows: Vec<Sale>,
    /// Rows dropped because they could not be coerced
    pub skipped: usize,
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn check_columns(
    reader: &mut csv::Reader<File>,
    path: &Path,
    required: &[&str],
) -> Result<(), LoadError> {
    let headers = reader.headers().map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        })
    }
}

/// Load the product catalogue
///
/// Any structural error (unreadable file, missing columns, ragged rows) fails the
/// whole load. Individual unparsable numbers only blank out that cell.
pub fn load_products(path: &Path) -> Result<Vec<Product>, LoadError> {
    let mut reader = open_reader(path)?;
    check_columns(&mut reader, path, PRODUCT_COLUMNS)?;

    let mut products = Vec::new();
    for result in reader.deserialize::<ProductRecord>() {
        let record = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        products.push(Product::from(record));
    }

    let mut seen = HashSet::with_capacity(products.len());
    let duplicates = products
        .iter()
        .filter(|p| !seen.insert(p.product_name.as_str()))
        .count();
    if duplicates > 0 {
        warn!(
            path = %path.display(),
            duplicates,
            "Product catalogue has duplicate product names; lookups return the first"
        );
    }

    debug!(path = %path.display(), rows = products.len(), "Loaded product catalogue");
    Ok(products)
}

/// Load the sales transactions
///
/// A missing file is reported as [`LoadError::MissingFile`] so the caller can degrade
/// to an empty table. Rows that cannot be coerced are skipped and counted.
pub fn load_sales(path: &Path) -> Result<SalesLoad, LoadError> {
    let mut reader = open_reader(path)?;
    check_columns(&mut reader, path, SALES_COLUMNS)?;

    let mut load = SalesLoad::default();
    for (index, result) in reader.deserialize::<SaleRecord>().enumerate() {
        // header is line 1
        let line = index + 2;
        let outcome = result
            .map_err(|e| e.to_string())
            .and_then(Sale::from_record);
        match outcome {
            Ok(sale) => load.rows.push(sale),
            Err(reason) => {
                debug!(path = %path.display(), line, %reason, "Skipping sales row");
                load.skipped += 1;
            }
        }
    }

    if load.skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = load.skipped,
            loaded = load.rows.len(),
            "Skipped malformed sales rows"
        );
    }
    debug!(path = %path.display(), rows = load.rows.len(), "Loaded sales transactions");
    Ok(load)
}
