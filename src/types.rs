//! Core data types used throughout the analytics backend
//!
//! # Key Types
//!
//! - **`Product`**: one catalogue item, keyed by `product_name`
//! - **`Sale`**: one transaction line with calendar fields derived from `sale_date`
//! - **`ProductRecord`** / **`SaleRecord`**: loosely-typed rows as they appear in the
//!   delimited source files, coerced into the typed records at load time
//!
//! Numeric product attributes stay `Option` because the catalogue is scraped and
//! routinely has holes; aggregates skip `None` rather than fail. Sale money columns are
//! always concrete, being derived from one another when a cell is missing.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::aggregation::functions::{margin_pct, safe_div};
use crate::error::{Error, Result};

/// Weekdays in reporting order (Monday first)
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// English name of a weekday, as stored in the `day_of_week` column
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Timestamp layouts accepted in the `sale_date` column
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a `sale_date` cell
///
/// Date-only values resolve to midnight. Returns `None` for anything else.
pub fn parse_sale_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a `YYYY-MM-DD` query argument
///
/// Impossible calendar dates such as `2024-02-30` are rejected.
pub fn parse_date_arg(name: &str, raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let well_formed = trimmed.len() == 10
        && trimmed
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(Error::invalid_argument(format!(
            "{} '{}' is not in YYYY-MM-DD format",
            name, raw
        )));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| {
        Error::invalid_argument(format!("{} '{}' is not a valid date: {}", name, raw, e))
    })
}

/// Keep only finite values
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// =============================================================================
// Product
// =============================================================================

/// Catalogue row as it appears in the source file
///
/// Every column is optional at this level; required columns are enforced by the
/// loader's header check, and unparsable numbers become `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub screen_size: String,
    #[serde(default)]
    pub screen_resolution: String,
    #[serde(default)]
    pub screen_type: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub gpu: String,
    #[serde(default)]
    pub ram: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub os: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub buying_price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price_with_tva: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tva_percentage: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub stock_quantity: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
}

/// A catalogue item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Listing title; identity key (case-sensitive)
    pub product_name: String,
    pub brand: String,
    pub series: String,
    pub model: String,
    pub screen_size: String,
    pub screen_resolution: String,
    pub screen_type: String,
    pub cpu: String,
    pub gpu: String,
    pub ram: String,
    pub storage: String,
    pub os: String,
    /// Selling price before tax
    pub price: Option<f64>,
    /// Purchase cost
    pub buying_price: Option<f64>,
    /// Selling price including tax
    pub price_with_tva: Option<f64>,
    /// Tax rate in percent
    pub tva_percentage: Option<f64>,
    /// Units on hand
    pub stock_quantity: Option<u32>,
    /// Markup over buying price in percent
    pub profit_margin: Option<f64>,
    pub image_url: String,
    pub product_url: String,
}

impl Product {
    /// Create a product with only a name and brand set
    pub fn new(product_name: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            brand: brand.into(),
            series: String::new(),
            model: String::new(),
            screen_size: String::new(),
            screen_resolution: String::new(),
            screen_type: String::new(),
            cpu: String::new(),
            gpu: String::new(),
            ram: String::new(),
            storage: String::new(),
            os: String::new(),
            price: None,
            buying_price: None,
            price_with_tva: None,
            tva_percentage: None,
            stock_quantity: None,
            profit_margin: None,
            image_url: String::new(),
            product_url: String::new(),
        }
    }

    /// Set CPU and GPU descriptions
    pub fn with_hardware(mut self, cpu: impl Into<String>, gpu: impl Into<String>) -> Self {
        self.cpu = cpu.into();
        self.gpu = gpu.into();
        self
    }

    /// Set pricing; margin and tax-inclusive price are derived
    pub fn with_pricing(mut self, price: f64, buying_price: f64, tva_percentage: f64) -> Self {
        self.price = finite(Some(price));
        self.buying_price = finite(Some(buying_price));
        self.tva_percentage = finite(Some(tva_percentage));
        self.price_with_tva = derive_price_with_tva(self.price, self.tva_percentage);
        self.profit_margin = derive_product_margin(self.price, self.buying_price);
        self
    }

    /// Set units on hand
    pub fn with_stock(mut self, stock_quantity: u32) -> Self {
        self.stock_quantity = Some(stock_quantity);
        self
    }
}

fn derive_price_with_tva(price: Option<f64>, tva: Option<f64>) -> Option<f64> {
    match (price, tva) {
        (Some(p), Some(t)) => Some(p * (1.0 + t / 100.0)),
        _ => None,
    }
}

fn derive_product_margin(price: Option<f64>, buying_price: Option<f64>) -> Option<f64> {
    match (price, buying_price) {
        (Some(p), Some(b)) => Some(margin_pct(p - b, b)),
        _ => None,
    }
}

impl From<ProductRecord> for Product {
    fn from(rec: ProductRecord) -> Self {
        let price = finite(rec.price);
        let buying_price = finite(rec.buying_price);
        let tva_percentage = finite(rec.tva_percentage);
        let stock_quantity = finite(rec.stock_quantity)
            .filter(|q| *q >= 0.0 && *q <= u32::MAX as f64)
            .map(|q| q.round() as u32);

        Self {
            price_with_tva: finite(rec.price_with_tva)
                .or_else(|| derive_price_with_tva(price, tva_percentage)),
            profit_margin: finite(rec.profit_margin)
                .or_else(|| derive_product_margin(price, buying_price)),
            product_name: rec.product_name,
            brand: rec.brand,
            series: rec.series,
            model: rec.model,
            screen_size: rec.screen_size,
            screen_resolution: rec.screen_resolution,
            screen_type: rec.screen_type,
            cpu: rec.cpu,
            gpu: rec.gpu,
            ram: rec.ram,
            storage: rec.storage,
            os: rec.os,
            price,
            buying_price,
            tva_percentage,
            stock_quantity,
            image_url: rec.image_url,
            product_url: rec.product_url,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Sales row as it appears in the source file
///
/// Calendar columns (`date`, `year`, ...) may be present in the file but are ignored;
/// they are recomputed from `sale_date`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRecord {
    #[serde(default)]
    pub sale_date: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub gpu: String,
    #[serde(default)]
    pub ram: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub buying_price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub unit_profit: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tva_percentage: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub unit_price_with_tva: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_cost: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_profit: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub profit_margin: Option<f64>,
}

/// One transaction line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sale {
    /// Moment of sale (local, naive)
    pub sale_date: NaiveDateTime,
    /// Calendar day of `sale_date`
    pub date: NaiveDate,
    /// Referenced product (not enforced against the catalogue)
    pub product_name: String,
    pub brand: String,
    pub series: String,
    pub cpu: String,
    pub gpu: String,
    pub ram: String,
    pub quantity: u32,
    pub buying_price: f64,
    pub unit_price: f64,
    pub unit_profit: f64,
    pub tva_percentage: f64,
    pub unit_price_with_tva: f64,
    pub total_amount: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    /// `total_profit / total_cost * 100`, 0 when cost is 0
    pub profit_margin: f64,
    pub year: i32,
    pub month: u32,
    /// ISO week number
    pub week: u32,
    /// English weekday name
    pub day_of_week: String,
    pub hour: u32,
}

impl Sale {
    /// Create a zero-valued sale at `sale_date`; calendar fields are derived
    pub fn new(sale_date: NaiveDateTime, product_name: impl Into<String>) -> Self {
        let date = sale_date.date();
        Self {
            sale_date,
            date,
            product_name: product_name.into(),
            brand: String::new(),
            series: String::new(),
            cpu: String::new(),
            gpu: String::new(),
            ram: String::new(),
            quantity: 0,
            buying_price: 0.0,
            unit_price: 0.0,
            unit_profit: 0.0,
            tva_percentage: 0.0,
            unit_price_with_tva: 0.0,
            total_amount: 0.0,
            total_cost: 0.0,
            total_profit: 0.0,
            profit_margin: 0.0,
            year: date.year(),
            month: date.month(),
            week: date.iso_week().week(),
            day_of_week: weekday_name(date.weekday()).to_string(),
            hour: sale_date.hour(),
        }
    }

    /// Set the brand, CPU and GPU dimensions
    pub fn with_dimensions(
        mut self,
        brand: impl Into<String>,
        cpu: impl Into<String>,
        gpu: impl Into<String>,
    ) -> Self {
        self.brand = brand.into();
        self.cpu = cpu.into();
        self.gpu = gpu.into();
        self
    }

    /// Set line totals; unit prices, profit and margin are derived
    pub fn with_totals(mut self, quantity: u32, total_amount: f64, total_cost: f64) -> Self {
        let qty = f64::from(quantity);
        self.quantity = quantity;
        self.total_amount = total_amount;
        self.total_cost = total_cost;
        self.total_profit = total_amount - total_cost;
        self.profit_margin = margin_pct(self.total_profit, total_cost);
        self.unit_price = safe_div(total_amount, qty);
        self.buying_price = safe_div(total_cost, qty);
        self.unit_profit = self.unit_price - self.buying_price;
        self.unit_price_with_tva = self.unit_price;
        self
    }

    /// Coerce a raw row into a typed sale
    ///
    /// Fails with a short reason when `sale_date` is unusable or `quantity` is not a
    /// positive integer; missing money columns are derived from the ones present.
    pub fn from_record(rec: SaleRecord) -> std::result::Result<Self, String> {
        let sale_date = parse_sale_timestamp(&rec.sale_date)
            .ok_or_else(|| format!("unparsable sale_date '{}'", rec.sale_date))?;

        let quantity = match finite(rec.quantity) {
            Some(q) if q >= 1.0 && q.fract() == 0.0 && q <= u32::MAX as f64 => q as u32,
            Some(q) => return Err(format!("invalid quantity {}", q)),
            None => return Err("missing quantity".to_string()),
        };
        let qty = f64::from(quantity);

        let unit_price = finite(rec.unit_price)
            .or_else(|| finite(rec.total_amount).map(|t| safe_div(t, qty)))
            .unwrap_or(0.0);
        let buying_price = finite(rec.buying_price)
            .or_else(|| finite(rec.total_cost).map(|t| safe_div(t, qty)))
            .unwrap_or(0.0);
        let tva_percentage = finite(rec.tva_percentage).unwrap_or(0.0);

        let total_amount = finite(rec.total_amount).unwrap_or(unit_price * qty);
        let total_cost = finite(rec.total_cost).unwrap_or(buying_price * qty);
        let total_profit = finite(rec.total_profit).unwrap_or(total_amount - total_cost);

        let mut sale = Sale::new(sale_date, rec.product_name)
            .with_dimensions(rec.brand, rec.cpu, rec.gpu);
        sale.series = rec.series;
        sale.ram = rec.ram;
        sale.quantity = quantity;
        sale.unit_price = unit_price;
        sale.buying_price = buying_price;
        sale.unit_profit = finite(rec.unit_profit).unwrap_or(unit_price - buying_price);
        sale.tva_percentage = tva_percentage;
        sale.unit_price_with_tva = finite(rec.unit_price_with_tva)
            .unwrap_or(unit_price * (1.0 + tva_percentage / 100.0));
        sale.total_amount = total_amount;
        sale.total_cost = total_cost;
        sale.total_profit = total_profit;
        sale.profit_margin =
            finite(rec.profit_margin).unwrap_or_else(|| margin_pct(total_profit, total_cost));
        Ok(sale)
    }
}
