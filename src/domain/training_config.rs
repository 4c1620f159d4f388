// ============================================================
// Layer 3 — Training Configuration
// ============================================================
// Every knob of a fine-tuning run in one flat record.
// Built once at process start (see infra::config_file) and
// never mutated afterwards; the model factory, the data
// pipeline and the training loop all read from it.
//
// Serialisable so the exact configuration of a run can be
// written next to its checkpoints and into the tracker.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Where the model should live. `Auto` picks the accelerator when the
/// binary was built with one, otherwise the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Accelerator,
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "accelerator" | "gpu" | "cuda" | "wgpu" => Ok(Self::Accelerator),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown device '{other}' (expected auto, accelerator or cpu)")),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Accelerator => "accelerator",
            Self::Cpu => "cpu",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub max_epochs:         usize,
    pub batch_size:         usize,
    pub learning_rate:      f64,
    /// AdamW decay coefficients, each in (0, 1)
    pub betas:              (f64, f64),
    pub weight_decay:       f64,
    /// Directory for checkpoints. Unset means checkpoints are skipped.
    pub checkpoint_path:    Option<PathBuf>,
    /// 0 keeps tokenisation on the calling thread
    pub num_workers:        usize,
    pub checkpoint_every_n: usize,
    pub log_every_n:        usize,
    /// Single source of truth for padding, truncation and the
    /// position-embedding check in the model factory
    pub max_seq_len:        usize,
    /// Pretrained model identifier, e.g. `gpt2` or `gpt2-medium`
    pub model:              String,
    /// Dataset identifier on the hub, or a local .txt/.jsonl path
    pub dataset:            String,
    pub device:             DevicePreference,
    pub tracking_dir:       PathBuf,
    pub project:            String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_epochs:         10,
            batch_size:         64,
            learning_rate:      1e-4,
            betas:              (0.9, 0.95),
            weight_decay:       0.1,
            checkpoint_path:    None,
            num_workers:        0,
            checkpoint_every_n: 1000,
            log_every_n:        100,
            max_seq_len:        1024,
            model:              "gpt2".to_string(),
            dataset:            "inwaves/dtchess-standard".to_string(),
            device:             DevicePreference::Auto,
            tracking_dir:       PathBuf::from("runs"),
            project:            "dtchess".to_string(),
        }
    }
}

impl TrainingConfig {
    /// The model name used in checkpoint and artifact names.
    /// `openai-community/gpt2` → `gpt2`.
    pub fn model_name(&self) -> &str {
        self.model.rsplit('/').next().unwrap_or(&self.model)
    }
}
