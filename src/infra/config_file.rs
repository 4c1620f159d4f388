// ============================================================
// Layer 6 — Config File Loader
// ============================================================
// Reads a flat `key: value` text file into a TrainingConfig.
//
//   max_epochs: 1
//   batch_size: 8
//   learning_rate: 3e-4
//   betas: (0.9, 0.95)
//   ckpt_path: checkpoints
//
// Rules:
//   - every line must contain a `:`; the first one separates
//     key from value (so paths and URLs may contain more)
//   - keys not listed below are ignored
//   - keys not present keep the TrainingConfig default

use std::{fs, path::{Path, PathBuf}};

use crate::domain::training_config::{DevicePreference, TrainingConfig};
use crate::error::{PipelineError, Result};

pub fn config_from_file(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let cfg = config_from_str(&text)?;
    tracing::debug!("Loaded training config from '{}': {:?}", path.display(), cfg);
    Ok(cfg)
}

pub fn config_from_str(text: &str) -> Result<TrainingConfig> {
    let mut cfg = TrainingConfig::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| PipelineError::config(line_no, format!("expected 'key: value', got '{line}'")))?;
        let key   = key.trim();
        let value = value.trim();

        match key {
            "max_epochs"         => cfg.max_epochs         = parse_int(line_no, key, value)?,
            "batch_size"         => cfg.batch_size         = parse_int(line_no, key, value)?,
            "num_workers"        => cfg.num_workers        = parse_int(line_no, key, value)?,
            "checkpoint_every_n" => cfg.checkpoint_every_n = parse_int(line_no, key, value)?,
            "log_every_n"        => cfg.log_every_n        = parse_int(line_no, key, value)?,
            "max_seq_len"        => cfg.max_seq_len        = parse_int(line_no, key, value)?,
            "learning_rate"      => cfg.learning_rate      = parse_float(line_no, key, value)?,
            "weight_decay"       => cfg.weight_decay       = parse_float(line_no, key, value)?,
            "betas"              => cfg.betas              = parse_betas(line_no, value)?,
            "ckpt_path" | "checkpoint_path" => cfg.checkpoint_path = Some(PathBuf::from(value)),
            "tracking_dir"       => cfg.tracking_dir       = PathBuf::from(value),
            "model"              => cfg.model              = value.to_string(),
            "dataset"            => cfg.dataset            = value.to_string(),
            "project"            => cfg.project            = value.to_string(),
            "device" => {
                cfg.device = value
                    .parse::<DevicePreference>()
                    .map_err(|e| PipelineError::config(line_no, e))?;
            }
            other => tracing::debug!("Ignoring unknown config key '{}'", other),
        }
    }

    if cfg.batch_size == 0 {
        return Err(PipelineError::InvalidConfig("batch_size must be at least 1".into()));
    }
    if cfg.checkpoint_every_n == 0 || cfg.log_every_n == 0 {
        return Err(PipelineError::InvalidConfig("checkpoint_every_n and log_every_n must be at least 1".into()));
    }
    // next-token targets need at least one shifted position
    if cfg.max_seq_len < 2 {
        return Err(PipelineError::InvalidConfig(format!(
            "max_seq_len must be at least 2, got {}",
            cfg.max_seq_len
        )));
    }

    Ok(cfg)
}

fn parse_int(line: usize, key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|e| PipelineError::config(line, format!("{key}: '{value}' is not an integer ({e})")))
}

fn parse_float(line: usize, key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|e| PipelineError::config(line, format!("{key}: '{value}' is not a float ({e})")))
}

/// `(0.9, 0.95)` or `[0.9, 0.95]` → (0.9, 0.95)
fn parse_betas(line: usize, value: &str) -> Result<(f64, f64)> {
    let (first, second) = value
        .split_once(", ")
        .ok_or_else(|| PipelineError::config(line, format!("betas: expected '(b1, b2)', got '{value}'")))?;

    let first  = first.trim();
    let second = second.trim();
    let first  = first.strip_prefix(['(', '[']).unwrap_or(first);
    let second = second.strip_suffix([')', ']']).unwrap_or(second);

    let b1 = parse_float(line, "betas", first.trim())?;
    let b2 = parse_float(line, "betas", second.trim())?;

    for b in [b1, b2] {
        if !(b > 0.0 && b < 1.0) {
            return Err(PipelineError::config(line, format!("betas: {b} is outside (0, 1)")));
        }
    }
    Ok((b1, b2))
}
