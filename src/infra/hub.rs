// ============================================================
// Layer 6 — Model & Dataset Registry Access
// ============================================================
// Resolves identifiers to files on local disk.
//
//   HubModelSource   → downloads from the HuggingFace Hub via
//                      hf-hub (cached under ~/.cache/huggingface)
//   LocalModelSource → a directory that already holds the files
//
// A pretrained model is three files:
//   config.json       — architecture hyperparameters
//   tokenizer.json    — vocabulary + merges
//   model.safetensors — weights
//
// Datasets are resolved the same way: a path that exists is used
// as-is; anything else is treated as a hub dataset repo.

use std::path::{Path, PathBuf};

use hf_hub::{
    api::sync::{Api, ApiBuilder},
    Repo, RepoType,
};

use crate::domain::traits::{ModelSource, PretrainedFiles};
use crate::error::{PipelineError, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Files probed, in order, when a dataset comes from the hub.
const DATASET_FILES: [&str; 4] = ["train.jsonl", "train.txt", "data/train.jsonl", "data/train.txt"];

fn build_api() -> Result<Api> {
    let mut builder = ApiBuilder::new().with_progress(false);
    if let Ok(token) = std::env::var("HF_TOKEN") {
        if !token.is_empty() {
            builder = builder.with_token(Some(token));
        }
    }
    builder
        .build()
        .map_err(|e| PipelineError::ResourceFetch(format!("cannot initialise hub client: {e}")))
}

pub struct HubModelSource {
    api: Api,
}

impl HubModelSource {
    pub fn new() -> Result<Self> {
        Ok(Self { api: build_api()? })
    }
}

impl ModelSource for HubModelSource {
    fn fetch(&self, model_id: &str) -> Result<PretrainedFiles> {
        tracing::info!("Fetching pretrained model '{}' from the hub", model_id);
        let repo = self.api.model(model_id.to_string());
        let get = |file: &str| {
            repo.get(file).map_err(|e| {
                PipelineError::ResourceFetch(format!("{model_id}/{file}: {e}"))
            })
        };
        Ok(PretrainedFiles {
            config:    get(CONFIG_FILE)?,
            tokenizer: get(TOKENIZER_FILE)?,
            weights:   get(WEIGHTS_FILE)?,
        })
    }
}

/// Looks for `{root}/{model_id}/` first, then `{root}/` itself.
pub struct LocalModelSource {
    root: PathBuf,
}

impl LocalModelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelSource for LocalModelSource {
    fn fetch(&self, model_id: &str) -> Result<PretrainedFiles> {
        let nested = self.root.join(model_id);
        let dir = if nested.is_dir() { nested } else { self.root.clone() };

        let require = |file: &str| -> Result<PathBuf> {
            let path = dir.join(file);
            if path.is_file() {
                Ok(path)
            } else {
                Err(PipelineError::ResourceFetch(format!(
                    "'{}' not found for model '{model_id}'",
                    path.display()
                )))
            }
        };
        Ok(PretrainedFiles {
            config:    require(CONFIG_FILE)?,
            tokenizer: require(TOKENIZER_FILE)?,
            weights:   require(WEIGHTS_FILE)?,
        })
    }
}

/// Pick the model source for an identifier: an existing directory is
/// read locally, anything else goes to the hub.
pub fn model_source_for(model_id: &str) -> Result<Box<dyn ModelSource>> {
    if Path::new(model_id).is_dir() {
        Ok(Box::new(LocalModelSource::new(model_id)))
    } else {
        Ok(Box::new(HubModelSource::new()?))
    }
}

/// Resolve a dataset identifier to a local text file.
pub fn resolve_dataset(dataset: &str) -> Result<PathBuf> {
    let local = Path::new(dataset);
    if local.is_file() {
        return Ok(local.to_path_buf());
    }

    tracing::info!("Fetching dataset '{}' from the hub", dataset);
    let api  = build_api()?;
    let repo = api.repo(Repo::new(dataset.to_string(), RepoType::Dataset));

    let mut last_err = None;
    for file in DATASET_FILES {
        match repo.get(file) {
            Ok(path) => {
                tracing::info!("Using dataset file '{}'", file);
                return Ok(path);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(PipelineError::ResourceFetch(format!(
        "dataset '{dataset}' has none of {DATASET_FILES:?}: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_source_finds_nested_model_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir  = root.path().join("tiny");
        std::fs::create_dir_all(&dir).unwrap();
        for f in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            std::fs::write(dir.join(f), b"{}").unwrap();
        }
        let files = LocalModelSource::new(root.path()).fetch("tiny").unwrap();
        assert_eq!(files.weights, dir.join(WEIGHTS_FILE));
    }

    #[test]
    fn test_local_source_missing_file_is_fetch_error() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(CONFIG_FILE), b"{}").unwrap();
        let err = LocalModelSource::new(root.path()).fetch("tiny").unwrap_err();
        assert!(matches!(err, PipelineError::ResourceFetch(_)));
    }

    #[test]
    fn test_existing_dataset_path_is_used_directly() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let path = resolve_dataset(f.path().to_str().unwrap()).unwrap();
        assert_eq!(path, f.path());
    }
}
