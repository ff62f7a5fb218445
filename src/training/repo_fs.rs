//! Filesystem persistence for model artifacts.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::common::error::{PrepError, PrepResult};
use crate::common::ids;

use super::domain::{GbdtModel, LoadedModel, ModelOrigin};

/// Read and check an artifact. Every failure is a `ModelLoad` error; there is
/// no fallback once a file exists at `path`.
pub fn load_model(path: &Path) -> PrepResult<LoadedModel> {
    let bytes = fs::read(path).map_err(|e| PrepError::model_load(path, e))?;
    let model: GbdtModel =
        serde_json::from_slice(&bytes).map_err(|e| PrepError::model_load(path, e))?;
    model.check().map_err(|reason| PrepError::model_load(path, reason))?;

    let fingerprint = ids::fingerprint(&bytes);
    info!(
        path = %path.display(),
        fingerprint = %fingerprint,
        trees = model.trees.len(),
        "loaded model artifact"
    );
    Ok(LoadedModel {
        model,
        origin: ModelOrigin::Loaded(path.to_path_buf()),
        fingerprint,
    })
}

/// Write an artifact as pretty JSON, creating parent directories as needed.
/// Returns the fingerprint of the written bytes.
pub fn save_model(path: &Path, model: &GbdtModel) -> PrepResult<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(model)?;
    fs::write(path, &bytes)?;
    let fingerprint = ids::fingerprint(&bytes);
    info!(path = %path.display(), fingerprint = %fingerprint, "saved model artifact");
    Ok(fingerprint)
}
