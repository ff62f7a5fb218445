//! Inference domain: input contract, feature projection and scoring.

pub mod domain;
pub mod features;
pub mod service;
pub mod validate;

pub use domain::{Feature, FeatureVector, InferEngine, OrderContext, PredictionResult};
pub use service::ModelEngine;
