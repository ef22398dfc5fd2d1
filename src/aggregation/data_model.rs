//! Result records produced by the query layer
//!
//! Every record is flat and holds only JSON-representable primitives. Margins and
//! means have already been zero-guarded by the time a record is built.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::types::Sale;

// =============================================================================
// Time buckets
// =============================================================================

/// One calendar day of sales
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_amount: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub quantity: u64,
    pub profit_margin: f64,
}

/// One calendar month of sales
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM`, month zero-padded
    pub period: String,
    pub total_amount: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub quantity: u64,
    pub profit_margin: f64,
}

/// Sales falling on one weekday, across all weeks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    /// English weekday name
    pub day: String,
    pub total_amount: f64,
    pub total_profit: f64,
    pub quantity: u64,
}

/// Sales falling in one hour of the day, across all days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBucket {
    /// Hour label such as `"14h"`
    pub hour: String,
    pub total_amount: f64,
    pub total_profit: f64,
    pub quantity: u64,
}

// =============================================================================
// Dimension buckets
// =============================================================================

/// Categorical column a sales rollup can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Manufacturer
    Brand,
    /// Processor description
    Cpu,
    /// Graphics description
    Gpu,
}

impl Dimension {
    /// Column name, also used as the key field when serialized
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Brand => "brand",
            Dimension::Cpu => "cpu",
            Dimension::Gpu => "gpu",
        }
    }

    /// The dimension value of a sale
    pub fn key(self, sale: &Sale) -> &str {
        match self {
            Dimension::Brand => &sale.brand,
            Dimension::Cpu => &sale.cpu,
            Dimension::Gpu => &sale.gpu,
        }
    }
}

/// Performance of one brand, CPU or GPU
///
/// Serializes with the dimension's column name as the key field, e.g.
/// `{"brand": "Lenovo", "total_amount": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionBucket {
    pub dimension: Dimension,
    pub key: String,
    pub total_amount: f64,
    pub total_profit: f64,
    pub quantity: u64,
    /// Mean of the per-line profit margins
    pub profit_margin: f64,
}

impl Serialize for DimensionBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(self.dimension.column(), &self.key)?;
        map.serialize_entry("total_amount", &self.total_amount)?;
        map.serialize_entry("total_profit", &self.total_profit)?;
        map.serialize_entry("quantity", &self.quantity)?;
        map.serialize_entry("profit_margin", &self.profit_margin)?;
        map.end()
    }
}

/// Sales of one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductBucket {
    pub product_name: String,
    pub quantity: u64,
    pub total_amount: f64,
    pub total_profit: f64,
}

// =============================================================================
// Summaries
// =============================================================================

/// Whole-table sales totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Units sold
    pub total_sales: u64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_cost: f64,
    /// Mean line amount
    pub average_order_value: f64,
    /// Mean line margin
    pub average_profit_margin: f64,
}

/// Totals for the current calendar day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TodaySales {
    /// Transaction lines
    pub count: usize,
    pub revenue: f64,
    pub profit: f64,
    pub avg_order_value: f64,
}

/// Catalogue-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductStats {
    pub total_products: usize,
    /// Distinct non-empty brand names
    pub total_brands: usize,
    /// Sum of list prices (one unit per product)
    pub total_stock_value: f64,
    pub average_price: f64,
    pub average_profit_margin: f64,
    pub low_stock_count: usize,
}
