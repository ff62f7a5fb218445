// lib.rs - prep-time prediction core
pub mod api;
pub mod common;
pub mod data;
pub mod inference;
pub mod training;

pub use api::{ApiResponse, PredictionService};
pub use common::{AppCfg, PrepError, PrepResult};
pub use inference::{OrderContext, PredictionResult};
pub use training::ModelCell;
