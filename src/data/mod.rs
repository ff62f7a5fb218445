//! Data domain: offline synthesis of labelled order data.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{SynthConfig, SynthSummary, SyntheticOrderRecord};
pub use service::{generate, synthesize};
