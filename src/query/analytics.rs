//! Time- and dimension-bucketed sales rollups
//!
//! Each rollup folds the sales table into a map of [`Totals`] keyed by the bucket,
//! then converts every entry into a flat result record. Time buckets come out in
//! ascending order (the maps are `BTreeMap`s); dimension buckets are ranked by profit.
//!
//! Bucketed metrics are conserved: summing a metric across the buckets of any rollup
//! gives the same value as summing it over the whole table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::aggregation::functions::{desc, tail};
use crate::aggregation::{
    DailyBucket, Dimension, DimensionBucket, HourlyBucket, MonthlyBucket, Totals, WeekdayBucket,
};
use crate::store::Snapshot;
use crate::types::{weekday_name, Sale, WEEKDAYS};

/// Rollups over the sales table
#[derive(Debug, Clone)]
pub struct SalesAnalytics {
    rows: Arc<[Sale]>,
}

impl SalesAnalytics {
    /// Wrap an existing sales table
    pub fn new(rows: Arc<[Sale]>) -> Self {
        Self { rows }
    }

    /// Analytics over the sales of a snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.sales())
    }

    /// Per-day totals for the most recent `days` days present in the data
    ///
    /// Days without sales are not padded in, so fewer than `days` buckets come back
    /// when the data covers fewer dates.
    pub fn daily(&self, days: usize) -> Vec<DailyBucket> {
        let mut groups: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
        for sale in self.rows.iter() {
            groups.entry(sale.date).or_default().add(sale);
        }

        let buckets = groups
            .into_iter()
            .map(|(date, t)| DailyBucket {
                date: date.format("%Y-%m-%d").to_string(),
                total_amount: t.total_amount,
                total_cost: t.total_cost,
                total_profit: t.total_profit,
                quantity: t.quantity,
                profit_margin: t.profit_margin(),
            })
            .collect();
        tail(buckets, days)
    }

    /// Per-month totals, oldest first
    pub fn monthly(&self) -> Vec<MonthlyBucket> {
        let mut groups: BTreeMap<(i32, u32), Totals> = BTreeMap::new();
        for sale in self.rows.iter() {
            groups.entry((sale.year, sale.month)).or_default().add(sale);
        }

        groups
            .into_iter()
            .map(|((year, month), t)| MonthlyBucket {
                year,
                month,
                period: format!("{}-{:02}", year, month),
                total_amount: t.total_amount,
                total_cost: t.total_cost,
                total_profit: t.total_profit,
                quantity: t.quantity,
                profit_margin: t.profit_margin(),
            })
            .collect()
    }

    /// Per-weekday totals, always seven rows from Monday to Sunday
    ///
    /// Weekdays without sales are present with zero values.
    pub fn weekly(&self) -> Vec<WeekdayBucket> {
        let mut groups: HashMap<Weekday, Totals> = HashMap::new();
        for sale in self.rows.iter() {
            groups.entry(sale.date.weekday()).or_default().add(sale);
        }

        WEEKDAYS
            .iter()
            .map(|day| {
                let t = groups.get(day).copied().unwrap_or_default();
                WeekdayBucket {
                    day: weekday_name(*day).to_string(),
                    total_amount: t.total_amount,
                    total_profit: t.total_profit,
                    quantity: t.quantity,
                }
            })
            .collect()
    }

    /// Per-hour-of-day totals for the hours that have sales, earliest first
    pub fn hourly(&self) -> Vec<HourlyBucket> {
        let mut groups: BTreeMap<u32, Totals> = BTreeMap::new();
        for sale in self.rows.iter() {
            groups.entry(sale.hour).or_default().add(sale);
        }

        groups
            .into_iter()
            .map(|(hour, t)| HourlyBucket {
                hour: format!("{}h", hour),
                total_amount: t.total_amount,
                total_profit: t.total_profit,
                quantity: t.quantity,
            })
            .collect()
    }

    /// Totals per dimension value, highest profit first
    ///
    /// `profit_margin` is the mean of the line margins in the bucket. Equal profit is
    /// ordered by the dimension value.
    pub fn by_dimension(&self, dimension: Dimension) -> Vec<DimensionBucket> {
        let mut groups: HashMap<&str, Totals> = HashMap::new();
        for sale in self.rows.iter() {
            groups.entry(dimension.key(sale)).or_default().add(sale);
        }

        let mut buckets: Vec<DimensionBucket> = groups
            .into_iter()
            .map(|(key, t)| DimensionBucket {
                dimension,
                key: key.to_string(),
                total_amount: t.total_amount,
                total_profit: t.total_profit,
                quantity: t.quantity,
                profit_margin: t.mean_margin(),
            })
            .collect();
        buckets.sort_by(|a, b| desc(a.total_profit, b.total_profit).then_with(|| a.key.cmp(&b.key)));
        buckets
    }

    /// Brand performance
    pub fn brands(&self) -> Vec<DimensionBucket> {
        self.by_dimension(Dimension::Brand)
    }

    /// CPU performance
    pub fn cpus(&self) -> Vec<DimensionBucket> {
        self.by_dimension(Dimension::Cpu)
    }

    /// GPU performance
    pub fn gpus(&self) -> Vec<DimensionBucket> {
        self.by_dimension(Dimension::Gpu)
    }
}
