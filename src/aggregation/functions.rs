//! Numeric helpers shared by every rollup
//!
//! Results are serialized as JSON, which has no representation for NaN or infinity,
//! so every ratio here branches on a zero denominator and yields 0 instead.

use std::cmp::Ordering;

/// `numerator / denominator`, or 0 when the denominator is 0 or the result is not finite
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Profit as a percentage of cost, 0 when cost is 0
pub fn margin_pct(profit: f64, cost: f64) -> f64 {
    safe_div(profit, cost) * 100.0
}

/// Running arithmetic mean that skips non-finite samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    /// Add a sample; NaN and infinities are ignored
    pub fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    /// Add an optional sample; `None` is ignored
    pub fn push_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.push(v);
        }
    }

    /// Number of samples taken
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of the samples taken
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the samples, 0 when there are none
    pub fn value(&self) -> f64 {
        safe_div(self.sum, self.count as f64)
    }
}

impl FromIterator<f64> for Mean {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut mean = Mean::default();
        for v in iter {
            mean.push(v);
        }
        mean
    }
}

/// Descending comparison for ranking; NaN compares equal
pub fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Keep the last `n` items of an ascending series
pub fn tail<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    if items.len() > n {
        items.drain(..items.len() - n);
    }
    items
}
