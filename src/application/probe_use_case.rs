// ============================================================
// Layer 2 — ProbeUseCase
// ============================================================
// Dry run of a config: build the model exactly as training
// would, optionally restore the latest checkpoint, then push a
// single batch through it and report shapes, loss and timing.
// Nothing is written and no tracking run is opened.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;

use crate::data::{encoder::SequenceEncoder, source::TextFileSource, stream::DataPipeline};
use crate::domain::training_config::TrainingConfig;
use crate::infra::{
    checkpoint::CheckpointManager,
    config_file::config_from_file,
    hub::{model_source_for, resolve_dataset},
};
use crate::ml::{
    device::{ComputeDevice, CpuInference},
    factory::create_model,
    probe::{forward_probe, ProbeReport},
};
use crate::util::count_parameters;

pub struct ProbeUseCase {
    config_path:     PathBuf,
    from_checkpoint: bool,
}

impl ProbeUseCase {
    pub fn new(config_path: impl Into<PathBuf>, from_checkpoint: bool) -> Self {
        Self { config_path: config_path.into(), from_checkpoint }
    }

    pub fn execute(&self) -> Result<ProbeReport> {
        let cfg = config_from_file(&self.config_path)
            .with_context(|| format!("Cannot load config '{}'", self.config_path.display()))?;

        match ComputeDevice::select(cfg.device) {
            #[cfg(feature = "accelerator")]
            ComputeDevice::Accelerator(device) => {
                probe_on::<crate::ml::device::AcceleratorInference>(&cfg, device, self.from_checkpoint)
            }
            ComputeDevice::Cpu(device) => probe_on::<CpuInference>(&cfg, device, self.from_checkpoint),
        }
    }
}

pub fn probe_on<B: Backend>(
    cfg:             &TrainingConfig,
    device:          B::Device,
    from_checkpoint: bool,
) -> Result<ProbeReport> {
    let source = model_source_for(&cfg.model)?;
    let pretrained = create_model::<B>(source.as_ref(), &cfg.model, cfg.max_seq_len, &device)
        .with_context(|| format!("Cannot create model '{}'", cfg.model))?;

    let model = if from_checkpoint {
        let Some(dir) = &cfg.checkpoint_path else {
            bail!("--from-checkpoint needs ckpt_path in the config");
        };
        CheckpointManager::new(dir)?
            .load_latest(pretrained.model, &device)
            .with_context(|| format!("Cannot restore latest checkpoint from '{}'", dir.display()))?
    } else {
        pretrained.model
    };
    tracing::info!("Model has {} parameters", count_parameters::<B, _>(&model));

    let dataset = resolve_dataset(&cfg.dataset)
        .with_context(|| format!("Cannot resolve dataset '{}'", cfg.dataset))?;
    let pipeline = DataPipeline::new(
        TextFileSource::new(dataset),
        SequenceEncoder::new(pretrained.tokenizer, cfg.max_seq_len),
        device,
        cfg.batch_size,
    );

    Ok(forward_probe(&model, &pipeline, Some(pretrained.pad_id as usize))?)
}
