//! The single place where an [`OrderContext`] becomes model input.

use super::domain::{Feature, FeatureVector, OrderContext, N_FEATURES};

/// Project a validated context into the fixed model column order.
///
/// Pure and deterministic. Every field is read by name, so the order of the
/// incoming record has no bearing on the output.
pub fn build(ctx: &OrderContext) -> FeatureVector {
    let mut values = [0.0; N_FEATURES];
    for feature in Feature::ALL {
        values[feature.index()] = column(ctx, feature);
    }
    FeatureVector::from_array(values)
}

fn column(ctx: &OrderContext, feature: Feature) -> f64 {
    match feature {
        Feature::OrderHour => f64::from(ctx.order_hour),
        Feature::DayOfWeek => f64::from(ctx.day_of_week),
        Feature::ItemCount => f64::from(ctx.item_count),
        Feature::IsPeakHour => {
            if ctx.is_peak_hour {
                1.0
            } else {
                0.0
            }
        }
        Feature::HistoricalDelayAvg => ctx.historical_delay_avg,
    }
}
