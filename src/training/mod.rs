//! Training domain: the model artifact, its trainer and its lifecycle.

pub mod domain;
pub mod gbdt;
pub mod repo_fs;
pub mod service;

pub use domain::{GbdtModel, LoadedModel, ModelOrigin, Node, TrainParams, Tree};
pub use service::ModelCell;
