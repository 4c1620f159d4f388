// ============================================================
// Layer 6 — Local Experiment Tracker
// ============================================================
// A file-backed Tracker. Each run gets its own directory:
//
//   {tracking_dir}/{project}/{run_id}/
//     run.json        — id, project, status, timestamps, config
//     metrics.csv     — every logged scalar (see infra::metrics)
//     artifacts.json  — registered files, versioned per name
//
// Artifacts are referenced by path, not copied. Logging the
// same artifact name again creates the next version (v0, v1, …).

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{training_config::TrainingConfig, traits::Tracker};
use crate::error::{PipelineError, Result};
use crate::infra::metrics::{MetricRecord, MetricsLogger};

const RUN_ID_LEN: usize = 8;
const RUN_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id:      String,
    pub project:     String,
    pub status:      RunStatus,
    pub started_at:  u64,
    pub finished_at: Option<u64>,
    pub config:      TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name:       String,
    #[serde(rename = "type")]
    pub kind:       String,
    pub version:    usize,
    pub path:       PathBuf,
    pub size_bytes: u64,
    pub logged_at:  u64,
}

struct ActiveRun {
    dir:       PathBuf,
    info:      RunInfo,
    metrics:   MetricsLogger,
    artifacts: Vec<ArtifactRecord>,
}

pub struct LocalTracker {
    root: PathBuf,
    run:  Option<ActiveRun>,
}

/// Random 8-character lowercase alphanumeric id.
pub fn generate_run_id() -> String {
    let mut rng = rand::thread_rng();
    (0..RUN_ID_LEN)
        .map(|_| RUN_ID_CHARS[rng.gen_range(0..RUN_ID_CHARS.len())] as char)
        .collect()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl LocalTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), run: None }
    }

    /// Directory of the active run, if one was started.
    pub fn run_dir(&self) -> Option<&Path> {
        self.run.as_ref().map(|r| r.dir.as_path())
    }

    fn active(&mut self) -> Result<&mut ActiveRun> {
        self.run
            .as_mut()
            .ok_or_else(|| PipelineError::Tracking("no active run; call init_run first".into()))
    }

    fn write_info(run: &ActiveRun) -> Result<()> {
        fs::write(run.dir.join("run.json"), serde_json::to_string_pretty(&run.info)?)?;
        Ok(())
    }

    fn write_artifacts(run: &ActiveRun) -> Result<()> {
        fs::write(run.dir.join("artifacts.json"), serde_json::to_string_pretty(&run.artifacts)?)?;
        Ok(())
    }
}

impl Tracker for LocalTracker {
    fn init_run(&mut self, project: &str, config: &TrainingConfig) -> Result<String> {
        if self.run.is_some() {
            return Err(PipelineError::Tracking("a run is already active".into()));
        }

        let run_id = generate_run_id();
        let dir = self.root.join(project).join(&run_id);
        fs::create_dir_all(&dir)?;

        let run = ActiveRun {
            metrics: MetricsLogger::new(&dir)?,
            info: RunInfo {
                run_id:      run_id.clone(),
                project:     project.to_string(),
                status:      RunStatus::Running,
                started_at:  unix_now(),
                finished_at: None,
                config:      config.clone(),
            },
            artifacts: Vec::new(),
            dir,
        };
        Self::write_info(&run)?;
        Self::write_artifacts(&run)?;
        tracing::debug!("Tracking run directory '{}'", run.dir.display());

        self.run = Some(run);
        Ok(run_id)
    }

    fn log_metrics(&mut self, step: usize, metrics: &[(&str, f64)]) -> Result<()> {
        let run = self.active()?;
        let records: Vec<MetricRecord> = metrics
            .iter()
            .map(|(name, value)| MetricRecord::new(step, *name, *value))
            .collect();
        run.metrics.log(&records)
    }

    fn log_artifact(&mut self, name: &str, kind: &str, path: &Path) -> Result<()> {
        let run = self.active()?;
        let size_bytes = fs::metadata(path)
            .map_err(|e| PipelineError::Tracking(format!("artifact '{}': {e}", path.display())))?
            .len();
        let version = run.artifacts.iter().filter(|a| a.name == name).count();

        run.artifacts.push(ArtifactRecord {
            name: name.to_string(),
            kind: kind.to_string(),
            version,
            path: path.to_path_buf(),
            size_bytes,
            logged_at: unix_now(),
        });
        Self::write_artifacts(run)?;
        tracing::debug!("Registered artifact {}:v{} ({})", name, version, kind);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let run = self.active()?;
        run.info.status = RunStatus::Finished;
        run.info.finished_at = Some(unix_now());
        Self::write_info(run)?;
        self.run = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_shape() {
        let id = generate_run_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_writes_run_metrics_and_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let mut tracker = LocalTracker::new(root.path());
        let run_id = tracker.init_run("dtchess", &TrainingConfig::default()).unwrap();
        let dir = tracker.run_dir().unwrap().to_path_buf();
        assert_eq!(dir, root.path().join("dtchess").join(&run_id));

        tracker.log_metrics(0, &[("loss", 4.0)]).unwrap();
        tracker.log_metrics(10, &[("loss", 3.0), ("norm/wte", 1.0)]).unwrap();

        let file = dir.join("weights.mpk.gz");
        fs::write(&file, b"abcd").unwrap();
        tracker.log_artifact("gpt2-run", "model", &file).unwrap();
        tracker.log_artifact("gpt2-run", "model", &file).unwrap();
        tracker.finish().unwrap();

        let metrics = MetricsLogger::new(&dir).unwrap().read_all().unwrap();
        assert_eq!(metrics.len(), 3);

        let artifacts: Vec<ArtifactRecord> =
            serde_json::from_str(&fs::read_to_string(dir.join("artifacts.json")).unwrap()).unwrap();
        assert_eq!(artifacts.iter().map(|a| a.version).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(artifacts[0].size_bytes, 4);

        let info: RunInfo = serde_json::from_str(&fs::read_to_string(dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(info.status, RunStatus::Finished);
        assert!(info.finished_at.is_some());
    }

    #[test]
    fn test_logging_without_run_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut tracker = LocalTracker::new(root.path());
        assert!(matches!(tracker.log_metrics(0, &[("loss", 1.0)]), Err(PipelineError::Tracking(_))));
    }

    #[test]
    fn test_missing_artifact_file_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut tracker = LocalTracker::new(root.path());
        tracker.init_run("p", &TrainingConfig::default()).unwrap();
        let err = tracker.log_artifact("x", "model", Path::new("/no/such/file")).unwrap_err();
        assert!(matches!(err, PipelineError::Tracking(_)));
    }
}
