use crate::error::ExperimentError;
use spanav_core::StimulusCatalog;
use std::fs;
use std::path::Path;

/// Loads a `{ "easy": [...], "hard": [...], "control": [...] }` catalog.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<StimulusCatalog, ExperimentError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ExperimentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog: StimulusCatalog =
        serde_json::from_str(&text).map_err(|source| ExperimentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        path = %path.display(),
        easy = catalog.easy.len(),
        hard = catalog.hard.len(),
        control = catalog.control.len(),
        "stimulus catalog loaded"
    );
    Ok(catalog)
}
