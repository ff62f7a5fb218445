//! Public entry points for transports.

pub mod handler;

pub use handler::{ApiResponse, PredictionService};
