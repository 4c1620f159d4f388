// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a fine-tuning run in order:
//
//   Step 1: Load the config file            (Layer 6 - infra)
//   Step 2: Select the compute device       (Layer 5 - ml)
//   Step 3: Build tokenizer + model         (Layer 5 - ml)
//   Step 4: Resolve the dataset             (Layer 6 - infra)
//   Step 5: Save tokenizer next to ckpts    (Layer 6 - infra)
//   Step 6: Build the streaming pipeline    (Layer 4 - data)
//   Step 7: Run the training loop           (Layer 5 - ml)
//
// The backend is picked at runtime, so everything after Step 2
// is generic over it (`train_on`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;

use crate::data::{encoder::SequenceEncoder, source::TextFileSource, stream::DataPipeline};
use crate::domain::{training_config::TrainingConfig, traits::Tracker};
use crate::infra::{
    checkpoint::CheckpointManager,
    config_file::config_from_file,
    hub::{model_source_for, resolve_dataset},
    tokenizer_store::TokenizerStore,
    tracking::LocalTracker,
};
use crate::ml::{
    device::{ComputeDevice, CpuBackend},
    factory::create_model,
    observer::TrackingObserver,
    trainer::{adamw, TrainSummary, Trainer},
};
use crate::util::timed;

pub struct TrainUseCase {
    config_path: PathBuf,
}

impl TrainUseCase {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self { config_path: config_path.into() }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = config_from_file(&self.config_path)
            .with_context(|| format!("Cannot load config '{}'", self.config_path.display()))?;
        tracing::info!(
            "Fine-tuning '{}' on '{}' for {} epoch(s)",
            cfg.model, cfg.dataset, cfg.max_epochs
        );

        apply_worker_setting(cfg.num_workers);
        let tracker = LocalTracker::new(&cfg.tracking_dir);

        let (summary, _) = match ComputeDevice::select(cfg.device) {
            #[cfg(feature = "accelerator")]
            ComputeDevice::Accelerator(device) => {
                train_on::<crate::ml::device::AcceleratorBackend, _>(&cfg, device, tracker)?
            }
            ComputeDevice::Cpu(device) => train_on::<CpuBackend, _>(&cfg, device, tracker)?,
        };
        Ok(summary)
    }
}

/// `num_workers == 0` keeps tokenisation on the calling thread.
pub fn apply_worker_setting(num_workers: usize) {
    tokenizers::utils::parallelism::set_parallelism(num_workers > 0);
}

/// Everything after device selection, for one concrete backend.
/// Returns the tracker so callers can inspect what was recorded.
pub fn train_on<B: AutodiffBackend, T: Tracker>(
    cfg:     &TrainingConfig,
    device:  B::Device,
    tracker: T,
) -> Result<(TrainSummary, T)> {
    let source = model_source_for(&cfg.model)?;
    let pretrained = timed("create_model", || {
        create_model::<B>(source.as_ref(), &cfg.model, cfg.max_seq_len, &device)
    })
    .with_context(|| format!("Cannot create model '{}'", cfg.model))?;

    let dataset = resolve_dataset(&cfg.dataset)
        .with_context(|| format!("Cannot resolve dataset '{}'", cfg.dataset))?;

    let checkpoints = match &cfg.checkpoint_path {
        Some(dir) => {
            let manager = CheckpointManager::new(dir)
                .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
            TokenizerStore::new(dir).save(&pretrained.tokenizer)?;
            Some(manager)
        }
        None => {
            tracing::warn!("No ckpt_path configured; checkpoints will not be written");
            None
        }
    };

    let pipeline = DataPipeline::new(
        TextFileSource::new(dataset),
        SequenceEncoder::new(pretrained.tokenizer, cfg.max_seq_len),
        device,
        cfg.batch_size,
    );

    let mut observer = TrackingObserver::new(tracker, cfg.clone(), checkpoints);
    let mut trainer = Trainer::<B, _>::new(
        adamw::<B>(cfg),
        cfg.learning_rate,
        Some(pretrained.pad_id as usize),
    );

    let (_model, summary) = trainer
        .fit(pretrained.model, &pipeline, cfg.max_epochs, &mut observer)
        .context("Training failed")?;
    Ok((summary, observer.into_tracker()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_tiny_pretrained, RecordingTracker};
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_one_epoch_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let model_dir = root.path().join("tiny-gpt2");
        write_tiny_pretrained(&model_dir);

        let dataset = root.path().join("games.txt");
        std::fs::write(&dataset, "1. e4 e5 2. Nf3 Nc6\n1. d4 d5 2. c4 e6\n1. e4 e5 2. Nf3 Nf6\n1. d4 Nf6 2. c4 e6\n").unwrap();

        let ckpt = root.path().join("ckpt");
        let cfg = TrainingConfig {
            max_epochs: 1,
            batch_size: 2,
            learning_rate: 1e-3,
            checkpoint_every_n: 1,
            log_every_n: 1,
            max_seq_len: 8,
            checkpoint_path: Some(ckpt.clone()),
            model: model_dir.to_string_lossy().into_owned(),
            dataset: dataset.to_string_lossy().into_owned(),
            ..TrainingConfig::default()
        };

        let (summary, tracker) =
            train_on::<Autodiff<NdArray>, _>(&cfg, Default::default(), RecordingTracker::default()).unwrap();

        // 4 examples / batch 2 → exactly two optimiser steps
        assert_eq!(summary.steps, 2);
        assert_eq!(tracker.metric("loss").len(), 2);
        // step 0 is never checkpointed, step 1 is
        assert_eq!(tracker.artifacts.len(), 1);
        assert!(tracker.artifacts[0].2.exists());
        assert!(tracker.finished);

        assert!(ckpt.join("tokenizer.json").exists());
        assert!(ckpt.join("train_config.json").exists());
    }
}
