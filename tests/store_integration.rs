//! Store Integration Tests
//!
//! Loads datasets shaped like the production exports (every column, including the
//! precomputed calendar columns) and checks that query results come from the typed
//! rows. Also exercises reloads racing against concurrent readers.

use pcstore_analytics::{
    config::DataConfig,
    query::{ProductCatalog, SalesAnalytics, SalesLedger},
    DataSources, Error, TabularStore,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

const PRODUCTS_V1: &str = "\
product_name,brand,series,model,screen_size,screen_resolution,screen_type,cpu,gpu,ram,storage,os,price,buying_price,price_with_tva,tva_percentage,stock_quantity,profit_margin,image_url,product_url
Lenovo LOQ,Lenovo,LOQ,15IAX9,15.6,FHD,IPS,i5-12450HX,RTX 2050,16GB,512GB SSD,FreeDos,2500,2000,2975,19,3,25,https://img/1.webp,https://shop/1
MSI Thin,MSI,Thin,GF63,15.6,FHD,IPS,i7-12650H,RTX 4060,16GB,512GB SSD,Windows 11,3000,2500,3570,19,40,20,https://img/2.webp,https://shop/2
";

const PRODUCTS_V2: &str = "\
product_name,brand,series,model,screen_size,screen_resolution,screen_type,cpu,gpu,ram,storage,os,price,buying_price,price_with_tva,tva_percentage,stock_quantity,profit_margin,image_url,product_url
Lenovo LOQ,Lenovo,LOQ,15IAX9,15.6,FHD,IPS,i5-12450HX,RTX 2050,16GB,512GB SSD,FreeDos,2500,2000,2975,19,3,25,https://img/1.webp,https://shop/1
MSI Thin,MSI,Thin,GF63,15.6,FHD,IPS,i7-12650H,RTX 4060,16GB,512GB SSD,Windows 11,3000,2500,3570,19,40,20,https://img/2.webp,https://shop/2
ASUS TUF,ASUS,TUF,A15,15.6,FHD,IPS,Ryzen 7 7735HS,RTX 4050,16GB,1TB SSD,FreeDos,3200,2600,3808,19,0,23.08,https://img/3.webp,https://shop/3
";

// The last row carries stale calendar columns; they must be recomputed
const SALES_FULL: &str = "\
sale_date,product_name,brand,series,cpu,gpu,ram,quantity,buying_price,unit_price,unit_profit,tva_percentage,unit_price_with_tva,total_amount,total_cost,total_profit,profit_margin,date,year,month,week,day_of_week,hour
2024-03-04 11:15:00,Lenovo LOQ,Lenovo,LOQ,i5-12450HX,RTX 2050,16GB,2,2000,2500,500,19,2975,5000,4000,1000,25,2024-03-04,2024,3,10,Monday,11
2024-03-09 18:40:00,MSI Thin,MSI,Thin,i7-12650H,RTX 4060,16GB,1,2500,3000,500,19,3570,3000,2500,500,20,2024-03-09,2024,3,10,Saturday,18
2024-04-01 09:05:00,ASUS TUF,ASUS,TUF,Ryzen 7 7735HS,RTX 4050,16GB,1,2600,3200,600,19,3808,3200,2600,600,23.08,2024-04-01,2024,4,14,Monday,9
2024-03-05 14:00:00,Lenovo LOQ,Lenovo,LOQ,i5-12450HX,RTX 2050,16GB,1,2000,2500,500,19,2975,2500,2000,500,25,2023-01-01,2023,1,1,Sunday,3
";

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

// Rename is atomic, so a concurrent reload never reads a half-written file
fn replace(dir: &Path, name: &str, contents: &str) {
    let staging = dir.join(format!("{}.tmp", name));
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(staging, dir.join(name)).unwrap();
}

fn open_store(dir: &TempDir) -> TabularStore {
    let config = DataConfig {
        data_dir: dir.path().to_path_buf(),
        products_file: "products.csv".to_string(),
        sales_file: "sales.csv".to_string(),
    };
    TabularStore::open(DataSources::from(&config)).unwrap()
}

// =============================================================================
// Full-column datasets
// =============================================================================

#[test]
fn test_full_exports_load_and_query() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "products.csv", PRODUCTS_V2);
    write(dir.path(), "sales.csv", SALES_FULL);
    let store = open_store(&dir);

    let report = store.snapshot().report();
    assert_eq!(report.generation, 1);
    assert_eq!(report.products, 3);
    assert_eq!(report.sales, 4);
    assert_eq!(report.skipped_sales, 0);

    let catalog = ProductCatalog::new(store.products());
    assert_eq!(catalog.by_name("asus tuf").unwrap().model, "A15");
    assert_eq!(catalog.low_stock(10).len(), 2);
    assert_eq!(catalog.brands(), vec!["Lenovo", "MSI", "ASUS"]);

    let ledger = SalesLedger::new(store.sales());
    let summary = ledger.summary();
    assert_eq!(summary.total_sales, 5);
    assert_eq!(summary.total_revenue, 13700.0);
    assert_eq!(summary.total_profit, 2600.0);
    assert_eq!(summary.average_order_value, 3425.0);
}

#[test]
fn test_calendar_columns_are_recomputed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "products.csv", PRODUCTS_V1);
    write(dir.path(), "sales.csv", SALES_FULL);
    let store = open_store(&dir);

    let sales = store.sales();
    let stale = &sales[3];
    assert_eq!(stale.year, 2024);
    assert_eq!(stale.month, 3);
    assert_eq!(stale.day_of_week, "Tuesday");
    assert_eq!(stale.hour, 14);

    let analytics = SalesAnalytics::new(store.sales());
    let monthly = analytics.monthly();
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].period, "2024-03");
    assert_eq!(monthly[0].total_amount, 10500.0);
    assert_eq!(monthly[1].period, "2024-04");

    let weekly = analytics.weekly();
    assert_eq!(weekly[0].day, "Monday");
    assert_eq!(weekly[0].total_amount, 8200.0);
    assert_eq!(weekly[0].quantity, 3);
    assert_eq!(weekly[1].total_amount, 2500.0);
    assert_eq!(weekly[6].total_amount, 0.0);

    let hours: Vec<String> = analytics.hourly().into_iter().map(|b| b.hour).collect();
    assert_eq!(hours, vec!["9h", "11h", "14h", "18h"]);

    let brands: Vec<String> = analytics.brands().into_iter().map(|b| b.key).collect();
    assert_eq!(brands, vec!["Lenovo", "ASUS", "MSI"]);
}

#[test]
fn test_sales_header_missing_required_column() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "products.csv", PRODUCTS_V1);
    write(
        dir.path(),
        "sales.csv",
        "sale_date,product_name,quantity,total_amount\n2024-03-04,Lenovo LOQ,1,2500\n",
    );

    let config = DataConfig {
        data_dir: dir.path().to_path_buf(),
        products_file: "products.csv".to_string(),
        sales_file: "sales.csv".to_string(),
    };
    match TabularStore::open(DataSources::from(&config)) {
        Err(Error::StartupFailure(err)) => {
            assert!(err.to_string().contains("total_profit"));
        }
        other => panic!("expected StartupFailure, got {:?}", other),
    }
}

// =============================================================================
// Reload under concurrent readers
// =============================================================================

#[test]
fn test_readers_never_observe_partial_reload() {
    const RELOADS: u64 = 40;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "products.csv", PRODUCTS_V1);
    write(dir.path(), "sales.csv", SALES_FULL);
    let store = Arc::new(open_store(&dir));
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let mut last_generation = 0;
                while !done.load(Ordering::Acquire) {
                    let snapshot = store.snapshot();
                    let generation = snapshot.generation();
                    assert!(generation >= last_generation);
                    last_generation = generation;

                    // odd generations hold two products, even ones three
                    let expected = if generation % 2 == 1 { 2 } else { 3 };
                    assert_eq!(snapshot.products().len(), expected);
                    assert_eq!(snapshot.sales().len(), 4);
                }
            });
        }

        for i in 0..RELOADS {
            let next = if i % 2 == 0 { PRODUCTS_V2 } else { PRODUCTS_V1 };
            replace(dir.path(), "products.csv", next);
            store.reload().unwrap();
        }
        done.store(true, Ordering::Release);
    });

    let stats = store.stats();
    assert_eq!(stats.generation, RELOADS + 1);
    assert_eq!(stats.reloads, RELOADS);
    assert_eq!(stats.reload_failures, 0);
}

#[test]
fn test_sales_file_appearing_later() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "products.csv", PRODUCTS_V1);
    let store = open_store(&dir);
    assert!(!store.snapshot().sales_available());
    assert!(SalesAnalytics::new(store.sales()).monthly().is_empty());

    write(dir.path(), "sales.csv", SALES_FULL);
    let report = store.reload().unwrap();
    assert!(report.sales_available);
    assert_eq!(SalesAnalytics::new(store.sales()).monthly().len(), 2);
}
