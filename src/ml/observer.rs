// ============================================================
// Layer 5 — Training Observers
// ============================================================
// Hooks the training loop calls at fixed points. Everything
// that touches the outside world during training goes through
// one of these:
//
//   on_train_start → tracker run, parameter count, config copy
//   on_step_end    → every log_every_n:        loss + weight norms
//                    every checkpoint_every_n: save + register
//                    (global step 0 never checkpoints)
//   on_epoch_end   → mean epoch loss
//   on_train_end   → close the run

use burn::prelude::*;

use crate::domain::{training_config::TrainingConfig, traits::Tracker};
use crate::error::{PipelineError, Result};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    model::CausalLm,
    trainer::{StepReport, TrainSummary},
};
use crate::util::count_parameters;

pub trait TrainingObserver<B: Backend> {
    fn on_train_start(&mut self, _model: &CausalLm<B>) -> Result<()> {
        Ok(())
    }

    fn on_step_end(&mut self, report: &StepReport, model: &CausalLm<B>) -> Result<()>;

    fn on_epoch_end(&mut self, _epoch: usize, _mean_loss: f64, _model: &CausalLm<B>) -> Result<()> {
        Ok(())
    }

    fn on_train_end(&mut self, _summary: &TrainSummary, _model: &CausalLm<B>) -> Result<()> {
        Ok(())
    }
}

/// Observer that does nothing; used where only the loop matters.
pub struct NoopObserver;

impl<B: Backend> TrainingObserver<B> for NoopObserver {
    fn on_step_end(&mut self, _report: &StepReport, _model: &CausalLm<B>) -> Result<()> {
        Ok(())
    }
}

/// Forwards metrics to a Tracker and writes periodic checkpoints.
pub struct TrackingObserver<T: Tracker> {
    tracker:     T,
    config:      TrainingConfig,
    checkpoints: Option<CheckpointManager>,
    run_id:      Option<String>,
    last_step:   usize,
}

impl<T: Tracker> TrackingObserver<T> {
    /// `checkpoints = None` disables checkpointing; metrics are still tracked.
    pub fn new(tracker: T, config: TrainingConfig, checkpoints: Option<CheckpointManager>) -> Self {
        Self { tracker, config, checkpoints, run_id: None, last_step: 0 }
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn into_tracker(self) -> T {
        self.tracker
    }

    fn require_run(&self) -> Result<&str> {
        self.run_id
            .as_deref()
            .ok_or_else(|| PipelineError::Tracking("training step before the run was started".into()))
    }

    fn checkpoint<B: Backend>(&mut self, step: usize, model: &CausalLm<B>) -> Result<()> {
        let Some(manager) = &self.checkpoints else {
            return Ok(());
        };
        let model_name = self.config.model_name();
        let run_id = self.require_run()?.to_string();

        let path = manager.save_model(model, &format!("{model_name}-{run_id}-step{step}"))?;
        self.tracker
            .log_artifact(&format!("{model_name}-{run_id}"), "model", &path)?;
        tracing::info!("Checkpoint at step {} → '{}'", step, path.display());
        Ok(())
    }
}

impl<B: Backend, T: Tracker> TrainingObserver<B> for TrackingObserver<T> {
    fn on_train_start(&mut self, model: &CausalLm<B>) -> Result<()> {
        let run_id = self.tracker.init_run(&self.config.project, &self.config)?;
        tracing::info!("Tracking run '{}' in project '{}'", run_id, self.config.project);
        self.run_id = Some(run_id);

        let params = count_parameters(model);
        tracing::info!("Model has {} parameters", params);
        self.tracker.log_metrics(0, &[("num_parameters", params as f64)])?;

        if let Some(manager) = &self.checkpoints {
            manager.save_config(&self.config)?;
        }
        Ok(())
    }

    fn on_step_end(&mut self, report: &StepReport, model: &CausalLm<B>) -> Result<()> {
        self.require_run()?;
        self.last_step = report.step;

        if report.step % self.config.log_every_n == 0 {
            let norms: Vec<(String, f64)> = model
                .parameter_norms()
                .into_iter()
                .map(|(name, norm)| (format!("norm/{name}"), norm))
                .collect();
            let mut metrics: Vec<(&str, f64)> = vec![
                ("loss", report.loss),
                ("epoch", report.epoch as f64),
                ("tokens", report.tokens as f64),
            ];
            metrics.extend(norms.iter().map(|(n, v)| (n.as_str(), *v)));
            self.tracker.log_metrics(report.step, &metrics)?;
            tracing::info!("step {:>6} | epoch {} | loss {:.4}", report.step, report.epoch, report.loss);
        }

        if report.step > 0 && report.step % self.config.checkpoint_every_n == 0 {
            self.checkpoint(report.step, model)?;
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, mean_loss: f64, _model: &CausalLm<B>) -> Result<()> {
        if mean_loss.is_finite() {
            self.tracker
                .log_metrics(self.last_step, &[("epoch", epoch as f64), ("epoch_mean_loss", mean_loss)])?;
        }
        Ok(())
    }

    fn on_train_end(&mut self, summary: &TrainSummary, _model: &CausalLm<B>) -> Result<()> {
        tracing::info!("Run '{}' finished after {} steps", self.run_id().unwrap_or("-"), summary.steps);
        self.tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tiny_model_config, RecordingTracker};
    use burn::backend::NdArray;

    fn report(step: usize) -> StepReport {
        StepReport { step, epoch: 0, loss: 1.5, tokens: 10 }
    }

    fn config(dir: &std::path::Path) -> TrainingConfig {
        TrainingConfig {
            log_every_n: 2,
            checkpoint_every_n: 3,
            checkpoint_path: Some(dir.to_path_buf()),
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_logs_and_checkpoints_on_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let mut obs = TrackingObserver::new(RecordingTracker::default(), cfg, Some(manager));
        let model: CausalLm<NdArray> = tiny_model_config().init(&Default::default());

        obs.on_train_start(&model).unwrap();
        for step in 0..7 {
            obs.on_step_end(&report(step), &model).unwrap();
        }
        obs.on_train_end(&TrainSummary { steps: 7, epochs: 1, last_loss: Some(1.5) }, &model).unwrap();

        let tracker = obs.into_tracker();
        let loss_steps: Vec<usize> = tracker.metric("loss").into_iter().map(|(s, _)| s).collect();
        assert_eq!(loss_steps, vec![0, 2, 4, 6]);

        // step 0 is skipped even though 0 % 3 == 0
        assert_eq!(tracker.artifacts.len(), 2);
        assert!(tracker.artifacts[0].2.to_string_lossy().contains("gpt2-testrun1-step3"));
        assert!(tracker.artifacts[1].2.to_string_lossy().contains("gpt2-testrun1-step6"));
        assert!(tracker.artifacts.iter().all(|(name, kind, path)| {
            name == "gpt2-testrun1" && kind == "model" && path.exists()
        }));
        assert!(tracker.finished);
        assert_eq!(tracker.metric("num_parameters").len(), 1);
    }

    #[test]
    fn test_without_checkpoint_dir_only_tracks() {
        let cfg = TrainingConfig { log_every_n: 1, checkpoint_every_n: 1, ..TrainingConfig::default() };
        let mut obs = TrackingObserver::new(RecordingTracker::default(), cfg, None);
        let model: CausalLm<NdArray> = tiny_model_config().init(&Default::default());

        obs.on_train_start(&model).unwrap();
        obs.on_step_end(&report(1), &model).unwrap();
        let tracker = obs.into_tracker();
        assert!(tracker.artifacts.is_empty());
        assert_eq!(tracker.metric("loss").len(), 1);
    }

    #[test]
    fn test_step_before_start_is_an_error() {
        let mut obs = TrackingObserver::new(RecordingTracker::default(), TrainingConfig::default(), None);
        let model: CausalLm<NdArray> = tiny_model_config().init(&Default::default());
        assert!(matches!(obs.on_step_end(&report(0), &model), Err(PipelineError::Tracking(_))));
    }
}
