// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's full-precision
// file recorder.
//
// What gets written to the checkpoint directory:
//   1. {model}-{run_id}-step{N}.mpk.gz — weights at global step N
//   2. latest.json                    — stem of the newest checkpoint
//   3. train_config.json              — the TrainingConfig of the run
//   4. tokenizer.json                 — written by TokenizerStore
//
// Checkpoint files are never overwritten or deleted; each
// step gets its own file.
//
// File naming convention:
//   checkpoints/
//     gpt2-k3j9x0aa-step1000.mpk.gz
//     gpt2-k3j9x0aa-step2000.mpk.gz
//     latest.json
//     train_config.json

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::domain::training_config::TrainingConfig;
use crate::error::{PipelineError, Result};
use crate::ml::model::CausalLm;

const LATEST_FILE: &str = "latest.json";
const CONFIG_FILE: &str = "train_config.json";
const EXTENSION: &str = "mpk.gz";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn recorder() -> NamedMpkGzFileRecorder<FullPrecisionSettings> {
        NamedMpkGzFileRecorder::<FullPrecisionSettings>::new()
    }

    /// Save model weights under `stem` and return the written file.
    ///
    /// The recorder appends its own extension, so dots in the stem
    /// (e.g. from a model name like `gpt2-1.5b`) are replaced first.
    pub fn save_model<B: Backend>(&self, model: &CausalLm<B>, stem: &str) -> Result<PathBuf> {
        let stem = stem.replace('.', "_");
        let base = self.dir.join(&stem);

        Self::recorder()
            .record(model.clone().into_record(), base.clone())
            .map_err(|e| PipelineError::Checkpoint(format!("cannot save '{}': {e}", base.display())))?;

        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&stem)?)?;

        let path = self.dir.join(format!("{stem}.{EXTENSION}"));
        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    /// Restore the weights saved under `stem` into `model`.
    /// The architecture must match the checkpoint.
    pub fn load_model<B: Backend>(
        &self,
        model:  CausalLm<B>,
        stem:   &str,
        device: &B::Device,
    ) -> Result<CausalLm<B>> {
        let base = self.dir.join(stem);
        let record = Self::recorder()
            .load(base.clone(), device)
            .map_err(|e| PipelineError::Checkpoint(format!("cannot load '{}': {e}", base.display())))?;
        Ok(model.load_record(record))
    }

    /// Stem of the most recently saved checkpoint.
    pub fn latest(&self) -> Result<String> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path).map_err(|e| {
            PipelineError::Checkpoint(format!(
                "no '{}' ({e}); has a training run saved a checkpoint here?",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&s)?)
    }

    pub fn load_latest<B: Backend>(&self, model: CausalLm<B>, device: &B::Device) -> Result<CausalLm<B>> {
        let stem = self.latest()?;
        tracing::info!("Loading checkpoint '{}'", stem);
        self.load_model(model, &stem, device)
    }

    /// Write the run's TrainingConfig next to its checkpoints.
    pub fn save_config(&self, cfg: &TrainingConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tiny_model_config;
    use burn::backend::NdArray;

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        let device = Default::default();

        let saved: CausalLm<NdArray> = tiny_model_config().init(&device);
        let path = manager.save_model(&saved, "gpt2-abc-step5").unwrap();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "gpt2-abc-step5.mpk.gz");
        assert_eq!(manager.latest().unwrap(), "gpt2-abc-step5");

        let fresh: CausalLm<NdArray> = tiny_model_config().init(&device);
        let loaded = manager.load_latest(fresh, &device).unwrap();
        let a: Vec<f32> = saved.wte.weight.val().into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.wte.weight.val().into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dots_in_stem_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let model: CausalLm<NdArray> = tiny_model_config().init(&Default::default());
        let path = manager.save_model(&model, "gpt2-1.5b-run-step1").unwrap();
        assert_eq!(path.file_name().unwrap(), "gpt2-1_5b-run-step1.mpk.gz");
        assert!(path.exists());
    }

    #[test]
    fn test_config_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let cfg = TrainingConfig { max_epochs: 3, ..TrainingConfig::default() };
        manager.save_config(&cfg).unwrap();

        let json = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let back: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_latest_without_checkpoints_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        assert!(matches!(manager.latest(), Err(PipelineError::Checkpoint(_))));
    }
}
