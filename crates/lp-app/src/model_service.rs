//! Model loading, saving, manifest merging and constant-source expansion.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lp_model::expand::{self, ConstantSources};
use lp_model::{BlockDef, LoopModel, ModelDef, PdArgs, ValueDef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

/// On-disk document format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

pub fn read_text(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::read(path, e))
}

/// Read and deserialize a JSON or YAML document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = read_text(path)?;
    match DocumentFormat::of(path) {
        DocumentFormat::Json => serde_json::from_str(&text).map_err(|source| AppError::Json {
            path: path.to_path_buf(),
            source,
        }),
        DocumentFormat::Yaml => serde_yaml::from_str(&text).map_err(|source| AppError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Serialize `value` in the format implied by `path` and write it.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let text = match DocumentFormat::of(path) {
        DocumentFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|source| AppError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
        DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|source| AppError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
    };
    std::fs::write(path, text).map_err(|e| AppError::write(path, e))
}

pub fn load_model(path: &Path) -> AppResult<ModelDef> {
    read_document(path)
}

pub fn save_model(path: &Path, model: &ModelDef) -> AppResult<()> {
    write_document(path, model)
}

/// Load a model description and resolve its constants.
pub fn open_model(path: &Path) -> AppResult<LoopModel> {
    let def = load_model(path)?;
    let model = LoopModel::new(def)?;
    info!(
        path = %path.display(),
        constants = model.constants().len(),
        controllers = model.def().controllers.len(),
        plants = model.def().plants.len(),
        "model loaded"
    );
    Ok(model)
}

/// A model assembled from per-block files.
///
/// Plant and controller entries name files under `<base>/plants/` and
/// `<base>/controllers/`; constant entries name files under
/// `<base>/constants/` and are merged in order, later keys winning.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub plants: Vec<String>,
    #[serde(default)]
    pub controllers: Vec<String>,
    #[serde(default)]
    pub constants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pd_args: Option<PdArgs>,
}

pub fn load_manifest(path: &Path) -> AppResult<Manifest> {
    read_document(path)
}

pub fn merge_manifest(base_dir: &Path, manifest: &Manifest) -> AppResult<ModelDef> {
    let blocks = |dir: &str, files: &[String]| -> AppResult<Vec<BlockDef>> {
        files
            .iter()
            .map(|f| read_document(&base_dir.join(dir).join(f)))
            .collect()
    };

    let mut constants = BTreeMap::new();
    for file in &manifest.constants {
        let part: BTreeMap<String, ValueDef> =
            read_document(&base_dir.join("constants").join(file))?;
        constants.extend(part);
    }

    let model = ModelDef {
        constants,
        controllers: blocks("controllers", &manifest.controllers)?,
        plants: blocks("plants", &manifest.plants)?,
        pd_args: manifest.pd_args,
    };
    info!(
        base = %base_dir.display(),
        constants = model.constants.len(),
        controllers = model.controllers.len(),
        plants = model.plants.len(),
        "manifest merged"
    );
    Ok(model)
}

pub fn merge_manifest_file(base_dir: &Path, manifest_path: &Path) -> AppResult<ModelDef> {
    merge_manifest(base_dir, &load_manifest(manifest_path)?)
}

/// Files feeding a constant-source expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionInputs {
    /// `KEY value` parameter file.
    pub params: PathBuf,
    /// JSON (or YAML) document addressed by dotted paths.
    pub document: PathBuf,
    /// Mapping of constant name to source specifier.
    pub config: PathBuf,
}

pub fn expand_constant_files(inputs: &ExpansionInputs) -> AppResult<BTreeMap<String, f64>> {
    let params = expand::parse_param_file(&read_text(&inputs.params)?)?;
    let document: serde_json::Value = read_document(&inputs.document)?;
    let config: BTreeMap<String, String> = read_document(&inputs.config)?;

    let expanded = expand::expand_constants(
        &config,
        &ConstantSources {
            params: &params,
            document: &document,
        },
    )?;
    info!(entries = expanded.len(), "constants expanded");
    Ok(expanded)
}
