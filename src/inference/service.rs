//! Model-backed implementation of [`InferEngine`].

use std::sync::Arc;

use crate::common::error::{PrepError, PrepResult};
use crate::training::service::ModelCell;

use super::domain::{FeatureVector, InferEngine};

/// Scores feature vectors against the model held by a [`ModelCell`].
#[derive(Clone, Debug)]
pub struct ModelEngine {
    cell: Arc<ModelCell>,
}

impl ModelEngine {
    pub fn new(cell: Arc<ModelCell>) -> Self {
        Self { cell }
    }

    pub fn cell(&self) -> &Arc<ModelCell> {
        &self.cell
    }
}

impl InferEngine for ModelEngine {
    fn ensure_ready(&self) -> PrepResult<()> {
        self.cell.get_or_load().map(|_| ())
    }

    fn predict(&self, features: &FeatureVector) -> PrepResult<f64> {
        let loaded = self.cell.require()?;
        if !features.is_finite() {
            return Err(PrepError::inference(format!(
                "feature vector contains non-finite values: {:?}",
                features.as_slice()
            )));
        }
        let score = loaded.model.predict(features);
        if !score.is_finite() {
            return Err(PrepError::inference(format!(
                "model {} produced a non-finite score",
                loaded.fingerprint
            )));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::domain::Feature;
    use crate::training::domain::{GbdtModel, Node, Tree};

    fn engine() -> ModelEngine {
        let tree = Tree::new(vec![
            Node::split(Feature::ItemCount, 4.0, 1, 2),
            Node::leaf(2.0),
            Node::leaf(6.0),
        ]);
        let cell = ModelCell::preloaded(GbdtModel::new(10.0, vec![tree])).unwrap();
        ModelEngine::new(Arc::new(cell))
    }

    fn row(item_count: f64) -> FeatureVector {
        FeatureVector::from_array([19.0, 4.0, item_count, 1.0, 5.2])
    }

    #[test]
    fn returns_a_single_scalar() {
        let engine = engine();
        assert_eq!(engine.predict(&row(3.0)).unwrap(), 12.0);
        assert_eq!(engine.predict(&row(8.0)).unwrap(), 16.0);
    }

    #[test]
    fn deterministic_for_fixed_artifact() {
        let engine = engine();
        let first = engine.predict(&row(3.0)).unwrap();
        for _ in 0..50 {
            assert_eq!(engine.predict(&row(3.0)).unwrap(), first);
        }
    }

    #[test]
    fn not_ready_is_model_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let cell = ModelCell::new(dir.path().join("absent.json"), 1);
        let engine = ModelEngine::new(Arc::new(cell));
        assert!(matches!(engine.predict(&row(3.0)), Err(PrepError::ModelNotLoaded)));

        engine.ensure_ready().unwrap();
        assert!(engine.predict(&row(3.0)).unwrap().is_finite());
    }

    #[test]
    fn non_finite_input_is_inference_error() {
        let bad = FeatureVector::from_array([19.0, 4.0, 3.0, 1.0, f64::INFINITY]);
        assert!(matches!(engine().predict(&bad), Err(PrepError::Inference(_))));
    }
}
