//! Group-by accumulators
//!
//! A [`Totals`] collects the additive metrics of the rows that fall into one bucket.
//! The rollups in [`crate::query::analytics`] key a map of these by date, month, hour,
//! weekday or dimension value and then turn each entry into a result record.

use super::functions::{margin_pct, Mean};
use crate::types::Sale;

/// Additive metrics of one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub total_amount: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub quantity: u64,
    /// Per-line margins, for dimension rollups that report the mean
    pub margins: Mean,
    /// Transaction lines folded in
    pub rows: usize,
}

impl Totals {
    /// Fold one sale into the bucket
    pub fn add(&mut self, sale: &Sale) {
        self.total_amount += sale.total_amount;
        self.total_cost += sale.total_cost;
        self.total_profit += sale.total_profit;
        self.quantity += u64::from(sale.quantity);
        self.margins.push(sale.profit_margin);
        self.rows += 1;
    }

    /// Profit over cost of the bucket as a whole, 0 when cost is 0
    pub fn profit_margin(&self) -> f64 {
        margin_pct(self.total_profit, self.total_cost)
    }

    /// Mean of the per-line margins, 0 for an empty bucket
    pub fn mean_margin(&self) -> f64 {
        self.margins.value()
    }

    /// Whether nothing has been folded in
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

impl<'a> FromIterator<&'a Sale> for Totals {
    fn from_iter<I: IntoIterator<Item = &'a Sale>>(iter: I) -> Self {
        let mut totals = Totals::default();
        for sale in iter {
            totals.add(sale);
        }
        totals
    }
}
