//! Property Tests for the Sales Rollups
//!
//! Uses property-based testing (proptest) to check the invariants every rollup must
//! hold regardless of the input table: conserved totals, the fixed weekday layout,
//! unpadded daily windows and JSON-safe numbers.

use chrono::{NaiveDate, NaiveDateTime};
use pcstore_analytics::{
    query::{ProductCatalog, SalesAnalytics, SalesLedger},
    Product, Sale,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// =============================================================================
// Test Data Strategies
// =============================================================================

const BRANDS: &[&str] = &["Lenovo", "MSI", "ASUS", "HP", ""];
const GPUS: &[&str] = &["RTX 4050", "RTX 4060", "Radeon 6500M"];

/// Strategy for a timestamp within 2024
fn sale_timestamp() -> impl Strategy<Value = NaiveDateTime> {
    (0u64..366, 0u32..24, 0u32..60).prop_map(|(day, hour, minute)| {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(day))
            .unwrap();
        date.and_hms_opt(hour, minute, 0).unwrap()
    })
}

/// Strategy for one sale line; zero cost and zero quantity are included on purpose
fn sale() -> impl Strategy<Value = Sale> {
    (
        sale_timestamp(),
        0usize..BRANDS.len(),
        0usize..GPUS.len(),
        0u32..5,
        0u32..500_000,
        0u32..500_000,
    )
        .prop_map(|(ts, brand, gpu, qty, amount_cents, cost_cents)| {
            Sale::new(ts, format!("Laptop {}", brand))
                .with_dimensions(BRANDS[brand], "Intel Core i5", GPUS[gpu])
                .with_totals(qty, amount_cents as f64 / 100.0, cost_cents as f64 / 100.0)
        })
}

fn sales_table(max_len: usize) -> impl Strategy<Value = Vec<Sale>> {
    prop::collection::vec(sale(), 0..max_len)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// =============================================================================
// Conservation
// =============================================================================

proptest! {
    #[test]
    fn prop_time_buckets_conserve_totals(rows in sales_table(200)) {
        let total_amount: f64 = rows.iter().map(|s| s.total_amount).sum();
        let total_profit: f64 = rows.iter().map(|s| s.total_profit).sum();
        let quantity: u64 = rows.iter().map(|s| u64::from(s.quantity)).sum();
        let analytics = SalesAnalytics::new(Arc::from(rows));

        let daily = analytics.daily(usize::MAX);
        prop_assert!(close(daily.iter().map(|b| b.total_amount).sum(), total_amount));
        prop_assert_eq!(daily.iter().map(|b| b.quantity).sum::<u64>(), quantity);

        let monthly = analytics.monthly();
        prop_assert!(close(monthly.iter().map(|b| b.total_profit).sum(), total_profit));
        prop_assert_eq!(monthly.iter().map(|b| b.quantity).sum::<u64>(), quantity);

        let weekly = analytics.weekly();
        prop_assert!(close(weekly.iter().map(|b| b.total_amount).sum(), total_amount));
        prop_assert_eq!(weekly.iter().map(|b| b.quantity).sum::<u64>(), quantity);

        let hourly = analytics.hourly();
        prop_assert!(close(hourly.iter().map(|b| b.total_profit).sum(), total_profit));
        prop_assert_eq!(hourly.iter().map(|b| b.quantity).sum::<u64>(), quantity);
    }

    #[test]
    fn prop_dimension_buckets_conserve_totals(rows in sales_table(200)) {
        let total_amount: f64 = rows.iter().map(|s| s.total_amount).sum();
        let quantity: u64 = rows.iter().map(|s| u64::from(s.quantity)).sum();
        let analytics = SalesAnalytics::new(Arc::from(rows));

        for buckets in [analytics.brands(), analytics.cpus(), analytics.gpus()] {
            prop_assert!(close(buckets.iter().map(|b| b.total_amount).sum(), total_amount));
            prop_assert_eq!(buckets.iter().map(|b| b.quantity).sum::<u64>(), quantity);
            prop_assert!(buckets.windows(2).all(|w| w[0].total_profit >= w[1].total_profit));
        }
    }

    #[test]
    fn prop_top_products_cover_everything_without_limit(rows in sales_table(100)) {
        let total_amount: f64 = rows.iter().map(|s| s.total_amount).sum();
        let ledger = SalesLedger::new(Arc::from(rows));
        let top = ledger.top_selling_products(usize::MAX);
        prop_assert!(close(top.iter().map(|p| p.total_amount).sum(), total_amount));
        prop_assert!(top.windows(2).all(|w| w[0].total_amount >= w[1].total_amount));
    }
}

// =============================================================================
// Shape
// =============================================================================

proptest! {
    #[test]
    fn prop_weekly_is_always_monday_to_sunday(rows in sales_table(50)) {
        let weekly = SalesAnalytics::new(Arc::from(rows)).weekly();
        let days: Vec<&str> = weekly.iter().map(|b| b.day.as_str()).collect();
        prop_assert_eq!(
            days,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
    }

    #[test]
    fn prop_daily_never_pads(rows in sales_table(100), days in 1usize..400) {
        let distinct: HashSet<NaiveDate> = rows.iter().map(|s| s.date).collect();
        let daily = SalesAnalytics::new(Arc::from(rows)).daily(days);
        prop_assert_eq!(daily.len(), distinct.len().min(days));
        prop_assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn prop_calendar_fields_follow_sale_date(ts in sale_timestamp()) {
        let sale = Sale::new(ts, "Laptop");
        let expected = ts.format("%A").to_string();
        prop_assert_eq!(&sale.day_of_week, &expected);
        prop_assert_eq!(sale.date, ts.date());
        prop_assert_eq!(sale.hour, ts.format("%H").to_string().parse::<u32>().unwrap());
    }

    #[test]
    fn prop_results_are_json_safe(rows in sales_table(100)) {
        let analytics = SalesAnalytics::new(Arc::from(rows.clone()));
        let ledger = SalesLedger::new(Arc::from(rows));

        let summary = ledger.summary();
        prop_assert!(summary.average_order_value.is_finite());
        prop_assert!(summary.average_profit_margin.is_finite());
        prop_assert!(analytics.daily(400).iter().all(|b| b.profit_margin.is_finite()));
        prop_assert!(analytics.monthly().iter().all(|b| b.profit_margin.is_finite()));
        prop_assert!(analytics.brands().iter().all(|b| b.profit_margin.is_finite()));

        // serde_json refuses nothing here because nothing is NaN or infinite
        let json = serde_json::to_string(&analytics.daily(400)).unwrap();
        prop_assert!(!json.contains("null"));
    }
}

// =============================================================================
// Products
// =============================================================================

fn product() -> impl Strategy<Value = Product> {
    (
        0usize..BRANDS.len(),
        prop::option::of(0u32..30),
        prop::option::of(1u32..5000),
    )
        .prop_map(|(brand, stock, price)| {
            let mut product = Product::new(format!("{} laptop", BRANDS[brand]), BRANDS[brand]);
            if let Some(price) = price {
                product = product.with_pricing(f64::from(price), f64::from(price) * 0.8, 19.0);
            }
            if let Some(stock) = stock {
                product = product.with_stock(stock);
            }
            product
        })
}

proptest! {
    #[test]
    fn prop_low_stock_is_inclusive(rows in prop::collection::vec(product(), 0..50), threshold in 0u32..30) {
        let catalog = ProductCatalog::new(Arc::from(rows.clone()));
        let low = catalog.low_stock(threshold);
        let expected = rows
            .iter()
            .filter(|p| p.stock_quantity.is_some_and(|q| q <= threshold))
            .count();
        prop_assert_eq!(low.len(), expected);
    }

    #[test]
    fn prop_brand_lookup_ignores_case(rows in prop::collection::vec(product(), 0..50)) {
        let catalog = ProductCatalog::new(Arc::from(rows));
        for brand in catalog.brands() {
            prop_assert_eq!(catalog.by_brand(&brand), catalog.by_brand(&brand.to_uppercase()));
            prop_assert_eq!(catalog.by_brand(&brand), catalog.by_brand(&brand.to_lowercase()));
        }
    }

    #[test]
    fn prop_product_stats_are_zero_safe(rows in prop::collection::vec(product(), 0..50)) {
        let stats = ProductCatalog::new(Arc::from(rows)).stats();
        prop_assert!(stats.average_price.is_finite());
        prop_assert!(stats.average_profit_margin.is_finite());
        prop_assert!(stats.total_stock_value >= 0.0);
    }
}
