//! Sales listing and summary queries
//!
//! Row-level queries over the sales table: ordered listings, time-window filters,
//! whole-table summaries and the top-N product ranking. Operations that depend on the
//! current time take it as an argument; the HTTP layer supplies the wall clock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::aggregation::functions::{desc, Mean};
use crate::aggregation::{ProductBucket, SalesSummary, Totals, TodaySales};
use crate::error::Result;
use crate::store::Snapshot;
use crate::types::{parse_date_arg, Sale};

/// Read-only query view over the sales table
#[derive(Debug, Clone)]
pub struct SalesLedger {
    rows: Arc<[Sale]>,
}

impl SalesLedger {
    /// Wrap an existing sales table
    pub fn new(rows: Arc<[Sale]>) -> Self {
        Self { rows }
    }

    /// Ledger over the sales of a snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.sales())
    }

    /// Number of sale lines
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All sales, newest first, truncated to `limit` when given
    pub fn sales(&self, limit: Option<usize>) -> Vec<Sale> {
        let mut rows = newest_first(self.rows.iter());
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        rows
    }

    /// Sales at or after `now - days`, newest first
    ///
    /// A window reaching past the earliest representable time has no lower bound.
    pub fn recent_sales(&self, days: u32, now: NaiveDateTime) -> Vec<Sale> {
        let cutoff = TimeDelta::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
        newest_first(
            self.rows
                .iter()
                .filter(|s| cutoff.map_or(true, |c| s.sale_date >= c)),
        )
    }

    /// Sales between two `YYYY-MM-DD` dates, both days included, in table order
    ///
    /// A malformed or impossible date is [`crate::Error::InvalidArgument`]. A start
    /// after the end is a valid empty range.
    pub fn sales_by_date_range(&self, start_date: &str, end_date: &str) -> Result<Vec<Sale>> {
        let start = parse_date_arg("start_date", start_date)?;
        let end = parse_date_arg("end_date", end_date)?;
        Ok(self.sales_between(start, end))
    }

    /// Sales from the start of `start` through the end of `end`
    pub fn sales_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Sale> {
        let from = start.and_time(NaiveTime::MIN);
        let until = end.checked_add_days(Days::new(1)).map(|d| d.and_time(NaiveTime::MIN));
        self.rows
            .iter()
            .filter(|s| s.sale_date >= from && until.map_or(true, |u| s.sale_date < u))
            .cloned()
            .collect()
    }

    /// Whole-table totals; all zeros for an empty table
    pub fn summary(&self) -> SalesSummary {
        let totals: Totals = self.rows.iter().collect();
        let orders: Mean = self.rows.iter().map(|s| s.total_amount).collect();

        SalesSummary {
            total_sales: totals.quantity,
            total_revenue: totals.total_amount,
            total_profit: totals.total_profit,
            total_cost: totals.total_cost,
            average_order_value: orders.value(),
            average_profit_margin: totals.mean_margin(),
        }
    }

    /// Totals for the lines sold on `today`
    pub fn today_sales(&self, today: NaiveDate) -> TodaySales {
        let totals: Totals = self.rows.iter().filter(|s| s.date == today).collect();
        let orders: Mean = self
            .rows
            .iter()
            .filter(|s| s.date == today)
            .map(|s| s.total_amount)
            .collect();

        TodaySales {
            count: totals.rows,
            revenue: totals.total_amount,
            profit: totals.total_profit,
            avg_order_value: orders.value(),
        }
    }

    /// Products ranked by revenue, highest first, at most `limit` of them
    ///
    /// Equal revenue is ordered by product name.
    pub fn top_selling_products(&self, limit: usize) -> Vec<ProductBucket> {
        let mut groups: HashMap<&str, Totals> = HashMap::new();
        for sale in self.rows.iter() {
            groups.entry(sale.product_name.as_str()).or_default().add(sale);
        }

        let mut ranked: Vec<ProductBucket> = groups
            .into_iter()
            .map(|(name, t)| ProductBucket {
                product_name: name.to_string(),
                quantity: t.quantity,
                total_amount: t.total_amount,
                total_profit: t.total_profit,
            })
            .collect();
        ranked.sort_by(|a, b| {
            desc(a.total_amount, b.total_amount).then_with(|| a.product_name.cmp(&b.product_name))
        });
        ranked.truncate(limit);
        ranked
    }
}

// Stable sort keeps file order among identical timestamps
fn newest_first<'a>(rows: impl Iterator<Item = &'a Sale>) -> Vec<Sale> {
    let mut rows: Vec<Sale> = rows.cloned().collect();
    rows.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
    rows
}
