//! Domain definitions for prediction requests, feature vectors and results.
//!
//! The column layout here is shared by serving, the bootstrap trainer and the
//! offline synthesizer. Changing it invalidates every persisted artifact.

use serde::Serialize;

use crate::common::error::PrepResult;

/// Hours treated as high-demand by both serving and synthesis.
pub const PEAK_HOURS: [u32; 6] = [12, 13, 18, 19, 20, 21];

pub const MAX_ORDER_HOUR: u32 = 23;
pub const MAX_DAY_OF_WEEK: u32 = 6;

/// Placeholder reported until real attribution exists.
pub const FEATURE_IMPORTANCE_PLACEHOLDER: &str = "historical_delay_avg";

pub fn is_peak(order_hour: u32) -> bool {
    PEAK_HOURS.contains(&order_hour)
}

/// Validated order and vendor context. Only `inference::validate` builds
/// these from untrusted input.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderContext {
    pub vendor_id: u64,
    pub order_hour: u32,
    pub day_of_week: u32,
    pub item_count: u32,
    pub is_peak_hour: bool,
    pub historical_delay_avg: f64,
}

/// Model input columns, in the order the model was trained on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Feature {
    OrderHour,
    DayOfWeek,
    ItemCount,
    IsPeakHour,
    HistoricalDelayAvg,
}

pub const N_FEATURES: usize = 5;

impl Feature {
    /// Every column, in model order.
    pub const ALL: [Feature; N_FEATURES] = [
        Feature::OrderHour,
        Feature::DayOfWeek,
        Feature::ItemCount,
        Feature::IsPeakHour,
        Feature::HistoricalDelayAvg,
    ];

    pub const fn index(self) -> usize {
        match self {
            Feature::OrderHour => 0,
            Feature::DayOfWeek => 1,
            Feature::ItemCount => 2,
            Feature::IsPeakHour => 3,
            Feature::HistoricalDelayAvg => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Feature::OrderHour => "order_hour",
            Feature::DayOfWeek => "day_of_week",
            Feature::ItemCount => "item_count",
            Feature::IsPeakHour => "is_peak_hour",
            Feature::HistoricalDelayAvg => "historical_delay_avg",
        }
    }

    /// Column names in model order.
    pub fn names() -> [&'static str; N_FEATURES] {
        Feature::ALL.map(Feature::name)
    }
}

/// Fixed-order numeric encoding of an [`OrderContext`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub const fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_array(self) -> [f64; N_FEATURES] {
        self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Response payload for a single prediction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
    pub vendor_id: u64,
    /// Minutes.
    pub predicted_prep_time: f64,
    pub confidence_interval_95: Option<(f64, f64)>,
    pub feature_importance_top: Option<String>,
}

impl PredictionResult {
    pub fn new(vendor_id: u64, predicted_prep_time: f64) -> Self {
        Self {
            vendor_id,
            predicted_prep_time,
            confidence_interval_95: None,
            feature_importance_top: Some(FEATURE_IMPORTANCE_PLACEHOLDER.to_string()),
        }
    }
}

/// Engine abstraction to decouple orchestration from the concrete model.
///
/// Implementations must be deterministic for a fixed artifact and must score
/// exactly one row per call.
pub trait InferEngine: Send + Sync {
    /// Make sure a model is available, constructing it on first use.
    fn ensure_ready(&self) -> PrepResult<()>;

    /// Score one feature vector.
    fn predict(&self, features: &FeatureVector) -> PrepResult<f64>;
}
