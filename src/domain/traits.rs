// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the layers. Each trait has a production
// implementation and can be swapped for a stub in tests.
//
//   TextSource  → data::source::TextFileSource
//   Tracker     → infra::tracking::LocalTracker
//   ModelSource → infra::hub::{HubModelSource, LocalModelSource}

use std::path::{Path, PathBuf};

use crate::domain::training_config::TrainingConfig;
use crate::error::Result;

// ─── TextSource ───────────────────────────────────────────────────────────────
/// A restartable, lazily-read collection of raw training texts
/// (one chess game per item).
///
/// `open()` starts a fresh pass over the data; each epoch calls it
/// once, so the full dataset is never held in memory.
pub trait TextSource {
    fn open(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>>;
}

// ─── Tracker ──────────────────────────────────────────────────────────────────
/// An experiment-tracking service: one run per training job,
/// with metrics and artifacts attached to it.
pub trait Tracker {
    /// Start a run and return its identifier.
    fn init_run(&mut self, project: &str, config: &TrainingConfig) -> Result<String>;

    /// Record named scalar values at a training step.
    fn log_metrics(&mut self, step: usize, metrics: &[(&str, f64)]) -> Result<()>;

    /// Register a file as a named, typed artifact of the current run.
    fn log_artifact(&mut self, name: &str, kind: &str, path: &Path) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

// ─── ModelSource ──────────────────────────────────────────────────────────────
/// Local paths of the files that make up a pretrained model.
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config:    PathBuf,
    pub tokenizer: PathBuf,
    pub weights:   PathBuf,
}

/// Anything that can resolve a model identifier to files on disk.
pub trait ModelSource {
    fn fetch(&self, model_id: &str) -> Result<PretrainedFiles>;
}
