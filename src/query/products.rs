//! Product catalogue queries
//!
//! Filters and statistics over one product snapshot. Every operation reads the table
//! it was built with; a reload of the store does not affect a catalogue already in use.

use std::collections::HashSet;
use std::sync::Arc;

use crate::aggregation::functions::Mean;
use crate::aggregation::ProductStats;
use crate::error::{Error, Result};
use crate::store::Snapshot;
use crate::types::Product;

/// Stock level at or below which a product counts as low in [`ProductCatalog::stats`]
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Read-only query view over the product table
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    rows: Arc<[Product]>,
}

impl ProductCatalog {
    /// Wrap an existing product table
    pub fn new(rows: Arc<[Product]>) -> Self {
        Self { rows }
    }

    /// Catalogue over the products of a snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.products())
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the catalogue is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All products in table order
    pub fn list_all(&self) -> Vec<Product> {
        self.rows.to_vec()
    }

    /// Products whose name, brand, CPU or GPU contains `query`, ignoring case
    ///
    /// Callers reject an empty query before getting here.
    pub fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.rows
            .iter()
            .filter(|p| {
                [&p.product_name, &p.brand, &p.cpu, &p.gpu]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// First product whose name contains `name`, ignoring case
    ///
    /// This is a best-effort lookup: when several names match, the earliest row in
    /// table order wins.
    pub fn by_name(&self, name: &str) -> Result<Product> {
        let needle = name.to_lowercase();
        self.rows
            .iter()
            .find(|p| p.product_name.to_lowercase().contains(&needle))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("product '{}'", name)))
    }

    /// Products whose brand equals `brand`, ignoring case
    pub fn by_brand(&self, brand: &str) -> Vec<Product> {
        let wanted = brand.to_lowercase();
        self.rows
            .iter()
            .filter(|p| p.brand.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    /// Products with `stock_quantity <= threshold`
    ///
    /// Rows without a stock figure never match.
    pub fn low_stock(&self, threshold: u32) -> Vec<Product> {
        self.rows
            .iter()
            .filter(|p| is_low_stock(p, threshold))
            .cloned()
            .collect()
    }

    /// Distinct non-empty brands in first-occurrence order
    pub fn brands(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|p| p.brand.as_str())
            .filter(|b| !b.is_empty() && seen.insert(*b))
            .map(str::to_string)
            .collect()
    }

    /// Catalogue-wide statistics; all zeros for an empty table
    pub fn stats(&self) -> ProductStats {
        let mut prices = Mean::default();
        let mut margins = Mean::default();
        for product in self.rows.iter() {
            prices.push_opt(product.price);
            margins.push_opt(product.profit_margin);
        }

        ProductStats {
            total_products: self.rows.len(),
            total_brands: self.brands().len(),
            total_stock_value: prices.sum(),
            average_price: prices.value(),
            average_profit_margin: margins.value(),
            low_stock_count: self
                .rows
                .iter()
                .filter(|p| is_low_stock(p, LOW_STOCK_THRESHOLD))
                .count(),
        }
    }
}

fn is_low_stock(product: &Product, threshold: u32) -> bool {
    product.stock_quantity.is_some_and(|q| q <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ProductCatalog {
        let rows = vec![
            Product::new("Lenovo LOQ 15IRX9", "Lenovo")
                .with_hardware("Intel Core i5-13450HX", "RTX 4050")
                .with_pricing(2500.0, 2000.0, 19.0)
                .with_stock(0),
            Product::new("MSI Thin GF63", "MSI")
                .with_hardware("Intel Core i7-12650H", "GeForce rtx 4060")
                .with_pricing(3000.0, 2500.0, 19.0)
                .with_stock(12),
            Product::new("Lenovo IdeaPad Gaming 3", "LENOVO")
                .with_hardware("AMD Ryzen 5 7535HS", "Radeon 6500M")
                .with_pricing(2000.0, 1600.0, 19.0)
                .with_stock(10),
            Product::new("Unbranded", ""),
        ];
        ProductCatalog::new(rows.into())
    }

    #[test]
    fn test_search_matches_any_column_ignoring_case() {
        let hits = catalog().search("RTX");
        let names: Vec<_> = hits.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["Lenovo LOQ 15IRX9", "MSI Thin GF63"]);

        assert_eq!(catalog().search("ryzen").len(), 1);
        assert!(catalog().search("macbook").is_empty());
    }

    #[test]
    fn test_by_name_returns_first_substring_match() {
        let catalog = catalog();
        let product = catalog.by_name("lenovo").unwrap();
        assert_eq!(product.product_name, "Lenovo LOQ 15IRX9");

        let product = catalog.by_name("ideapad").unwrap();
        assert_eq!(product.brand, "LENOVO");

        assert!(matches!(catalog.by_name("Zenbook"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_by_brand_is_exact_and_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.by_brand("Lenovo").len(), 2);
        assert_eq!(catalog.by_brand("Lenovo"), catalog.by_brand("lenovo"));
        assert!(catalog.by_brand("Len").is_empty());
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        let catalog = catalog();
        let zero = catalog.low_stock(0);
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].stock_quantity, Some(0));

        // 0 and 10 qualify, 12 does not, unknown stock never does
        assert_eq!(catalog.low_stock(10).len(), 2);
    }

    #[test]
    fn test_brands_first_occurrence_skips_empty() {
        assert_eq!(catalog().brands(), vec!["Lenovo", "MSI", "LENOVO"]);
    }

    #[test]
    fn test_stats_skip_missing_values() {
        let stats = catalog().stats();
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.total_brands, 3);
        assert_eq!(stats.total_stock_value, 7500.0);
        assert_eq!(stats.average_price, 2500.0);
        assert_eq!(stats.low_stock_count, 2);
        assert!((stats.average_profit_margin - 23.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_empty_catalog_stats_are_zero() {
        let catalog = ProductCatalog::new(Vec::<Product>::new().into());
        assert!(catalog.is_empty());
        assert_eq!(catalog.stats(), ProductStats::default());
        assert!(catalog.brands().is_empty());
        assert!(catalog.search("x").is_empty());
    }
}
