//! Model lifecycle: load the persisted artifact or train a bootstrap model,
//! exactly once per [`ModelCell`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{info, warn};

use crate::common::config::AppCfg;
use crate::common::error::{PrepError, PrepResult};
use crate::common::ids;
use crate::inference::domain::{Feature, FeatureVector, N_FEATURES};

use super::domain::{GbdtModel, LoadedModel, ModelOrigin, TrainParams};
use super::{gbdt, repo_fs};

pub const BOOTSTRAP_ROWS: usize = 100;

/// Lazily initialised, process-wide model slot.
///
/// Owned by the composition root and shared behind an `Arc`. Concurrent first
/// callers block on the single in-flight construction and then all observe
/// the same [`LoadedModel`]. Once ready the model is never replaced.
#[derive(Debug)]
pub struct ModelCell {
    model_path: PathBuf,
    bootstrap_seed: u64,
    slot: OnceCell<Arc<LoadedModel>>,
}

impl ModelCell {
    pub fn new(model_path: impl Into<PathBuf>, bootstrap_seed: u64) -> Self {
        Self {
            model_path: model_path.into(),
            bootstrap_seed,
            slot: OnceCell::new(),
        }
    }

    pub fn from_cfg(cfg: &AppCfg) -> Self {
        Self::new(cfg.model_path.clone(), cfg.bootstrap_seed)
    }

    /// A cell that is already READY with `model`.
    pub fn preloaded(model: GbdtModel) -> PrepResult<Self> {
        let fingerprint = ids::fingerprint(&serde_json::to_vec(&model)?);
        let cell = Self::new(PathBuf::new(), 0);
        let loaded = LoadedModel {
            model,
            origin: ModelOrigin::Injected,
            fingerprint,
        };
        // A fresh cell is always empty.
        let _ = cell.slot.set(Arc::new(loaded));
        Ok(cell)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The model, if construction already happened.
    pub fn get(&self) -> Option<Arc<LoadedModel>> {
        self.slot.get().cloned()
    }

    /// Like [`ModelCell::get`] but reports `ModelNotLoaded`.
    pub fn require(&self) -> PrepResult<Arc<LoadedModel>> {
        self.get().ok_or(PrepError::ModelNotLoaded)
    }

    /// Return the model, constructing it on first access.
    ///
    /// A failed load leaves the cell UNLOADED.
    pub fn get_or_load(&self) -> PrepResult<Arc<LoadedModel>> {
        self.slot
            .get_or_try_init(|| {
                load_or_bootstrap(&self.model_path, self.bootstrap_seed).map(Arc::new)
            })
            .cloned()
    }
}

/// Load the artifact at `path`, or train the bootstrap model when nothing
/// exists there. Anything at `path` that cannot be read is fatal, including a
/// dangling or looping symlink and a path whose presence cannot be determined.
pub fn load_or_bootstrap(path: &Path, seed: u64) -> PrepResult<LoadedModel> {
    if artifact_present(path)? {
        return repo_fs::load_model(path);
    }

    warn!(
        path = %path.display(),
        seed,
        "model artifact not found, training bootstrap model"
    );
    let model = train_bootstrap(seed)?;
    let fingerprint = ids::fingerprint(&serde_json::to_vec(&model)?);
    info!(fingerprint = %fingerprint, trees = model.trees.len(), "bootstrap model ready");
    Ok(LoadedModel {
        model,
        origin: ModelOrigin::Bootstrapped { seed },
        fingerprint,
    })
}

fn artifact_present(path: &Path) -> PrepResult<bool> {
    let resolves = path
        .try_exists()
        .map_err(|e| PrepError::model_load(path, e))?;
    Ok(resolves || fs::symlink_metadata(path).is_ok())
}

/// Placeholder dataset: uniform `[0, 1)` features with
/// `y = 2 * item_count + historical_delay_avg + N(0, 1)`.
pub fn bootstrap_dataset(seed: u64, n_rows: usize) -> PrepResult<(Vec<FeatureVector>, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).map_err(|e| PrepError::config(e.to_string()))?;

    let mut rows = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let mut values = [0.0; N_FEATURES];
        for v in values.iter_mut() {
            *v = rng.gen::<f64>();
        }
        rows.push(FeatureVector::from_array(values));
    }
    let labels = rows
        .iter()
        .map(|r| {
            2.0 * r.get(Feature::ItemCount)
                + r.get(Feature::HistoricalDelayAvg)
                + noise.sample(&mut rng)
        })
        .collect();
    Ok((rows, labels))
}

/// Train the bootstrap model with the fixed bootstrap hyper-parameters.
pub fn train_bootstrap(seed: u64) -> PrepResult<GbdtModel> {
    let (rows, labels) = bootstrap_dataset(seed, BOOTSTRAP_ROWS)?;
    gbdt::train(&rows, &labels, &TrainParams::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn bootstrap_dataset_shape_and_range() {
        let (rows, labels) = bootstrap_dataset(1, BOOTSTRAP_ROWS).unwrap();
        assert_eq!(rows.len(), 100);
        assert_eq!(labels.len(), 100);
        assert!(rows
            .iter()
            .flat_map(|r| r.as_slice().iter())
            .all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn bootstrap_is_seeded() {
        assert_eq!(train_bootstrap(9).unwrap(), train_bootstrap(9).unwrap());
    }

    #[test]
    fn missing_file_bootstraps() {
        let dir = tempfile::tempdir().unwrap();
        let cell = ModelCell::new(dir.path().join("absent.json"), 42);
        assert!(!cell.is_ready());
        assert!(matches!(cell.require(), Err(PrepError::ModelNotLoaded)));

        let model = cell.get_or_load().unwrap();
        assert!(cell.is_ready());
        assert_eq!(model.origin, ModelOrigin::Bootstrapped { seed: 42 });
        assert_eq!(model.model.trees.len(), 10);
    }

    #[test]
    fn existing_file_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let saved = GbdtModel::new(12.0, Vec::new());
        repo_fs::save_model(&path, &saved).unwrap();

        let cell = ModelCell::new(&path, 42);
        let model = cell.get_or_load().unwrap();
        assert_eq!(model.model, saved);
        assert_eq!(model.origin, ModelOrigin::Loaded(path));
    }

    #[test]
    fn corrupt_file_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "garbage").unwrap();

        let cell = ModelCell::new(&path, 42);
        assert!(matches!(cell.get_or_load(), Err(PrepError::ModelLoad { .. })));
        assert!(!cell.is_ready());
    }

    #[cfg(unix)]
    #[test]
    fn looping_symlink_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::os::unix::fs::symlink(&path, &path).unwrap();

        let err = load_or_bootstrap(&path, 42).unwrap_err();
        assert!(matches!(err, PrepError::ModelLoad { .. }));

        let cell = ModelCell::new(&path, 42);
        assert!(cell.get_or_load().is_err());
        assert!(!cell.is_ready());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::os::unix::fs::symlink(dir.path().join("gone.json"), &path).unwrap();

        assert!(matches!(
            load_or_bootstrap(&path, 42),
            Err(PrepError::ModelLoad { .. })
        ));
    }

    #[test]
    fn repeated_access_returns_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cell = ModelCell::new(dir.path().join("absent.json"), 42);
        let first = cell.get_or_load().unwrap();
        let second = cell.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &cell.require().unwrap()));
    }

    #[test]
    fn concurrent_first_access_builds_once() {
        let dir = tempfile::tempdir().unwrap();
        let cell = Arc::new(ModelCell::new(dir.path().join("absent.json"), 42));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cell.get_or_load().unwrap()
                })
            })
            .collect();

        let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for m in &models[1..] {
            assert!(Arc::ptr_eq(&models[0], m));
        }
    }

    #[test]
    fn preloaded_cell_is_ready() {
        let cell = ModelCell::preloaded(GbdtModel::new(3.0, Vec::new())).unwrap();
        assert!(cell.is_ready());
        assert_eq!(cell.require().unwrap().model.base_score, 3.0);
    }
}
