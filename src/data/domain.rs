//! Synthetic order records and the knobs that shape them.
//!
//! Columns and ranges mirror [`OrderContext`](crate::inference::domain::OrderContext)
//! so that a model trained on this data sees the same feature semantics as
//! live traffic.

use crate::common::error::{PrepError, PrepResult};
#[cfg(test)]
use crate::inference::domain::OrderContext;

/// Relative order volume per hour of day, lunch and dinner heavy.
/// Not normalised; see [`hour_probabilities`].
pub const HOUR_WEIGHTS: [f64; 24] = [
    0.01, 0.005, 0.005, 0.005, 0.005, 0.01, 0.02, 0.03, // 0-7
    0.04, 0.04, 0.05, 0.07, 0.09, 0.07, 0.05, 0.04, // 8-15
    0.05, 0.06, 0.08, 0.09, 0.07, 0.05, 0.03, 0.02, // 16-23
];

/// [`HOUR_WEIGHTS`] scaled to sum to one.
pub fn hour_probabilities() -> [f64; 24] {
    let total: f64 = HOUR_WEIGHTS.iter().sum();
    HOUR_WEIGHTS.map(|w| w / total)
}

/// Upper bounds on a single run; both counts are materialised in memory.
pub const MAX_ORDERS: usize = 50_000_000;
pub const MAX_VENDORS: u64 = 10_000_000;

pub const CSV_HEADER: [&str; 7] = [
    "vendor_id",
    "order_hour",
    "day_of_week",
    "item_count",
    "is_peak_hour",
    "historical_delay_avg",
    "prep_time_minutes",
];

/// Generation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthConfig {
    pub n_orders: usize,
    pub n_vendors: u64,
    pub seed: u64,
    /// Mean of the exponential per-vendor base delay, minutes.
    pub mean_vendor_delay: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            n_orders: 10_000,
            n_vendors: 200,
            seed: 42,
            mean_vendor_delay: 3.0,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> PrepResult<()> {
        if !(1..=MAX_ORDERS).contains(&self.n_orders) {
            return Err(PrepError::config(format!(
                "n_orders must be between 1 and {MAX_ORDERS}, got {}",
                self.n_orders
            )));
        }
        if !(1..=MAX_VENDORS).contains(&self.n_vendors) {
            return Err(PrepError::config(format!(
                "n_vendors must be between 1 and {MAX_VENDORS}, got {}",
                self.n_vendors
            )));
        }
        if !(self.mean_vendor_delay.is_finite() && self.mean_vendor_delay > 0.0) {
            return Err(PrepError::config("mean_vendor_delay must be a positive number"));
        }
        Ok(())
    }
}

/// One labelled training row.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticOrderRecord {
    pub vendor_id: u64,
    pub order_hour: u32,
    pub day_of_week: u32,
    pub item_count: u32,
    pub is_peak_hour: bool,
    pub historical_delay_avg: f64,
    pub prep_time_minutes: f64,
}

#[cfg(test)]
impl SyntheticOrderRecord {
    /// The serving-side view of this record, without its label.
    pub fn context(&self) -> OrderContext {
        OrderContext {
            vendor_id: self.vendor_id,
            order_hour: self.order_hour,
            day_of_week: self.day_of_week,
            item_count: self.item_count,
            is_peak_hour: self.is_peak_hour,
            historical_delay_avg: self.historical_delay_avg,
        }
    }
}

/// What a synthesis run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthSummary {
    pub rows: usize,
    pub vendors_seen: usize,
    pub mean_prep_time: f64,
}
