// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epochs over a streaming pipeline, one AdamW step per batch.
//
//   for epoch in 0..max_epochs:
//       for batch in pipeline.stream():       ← fresh pass each epoch
//           (model, loss) = trainer.step(model, batch)
//           observer.on_step_end(report, &model)
//
// The loop itself has no side effects: logging, tracking and
// checkpointing all live in TrainingObserver implementations.
// The model is moved through every optimiser step; gradients
// come fresh out of each backward pass and are never summed
// across steps.
//
// Reference: Loshchilov & Hutter (2019) Decoupled Weight Decay

use std::marker::PhantomData;

use burn::{
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::LmBatch, stream::DataPipeline};
use crate::domain::{training_config::TrainingConfig, traits::TextSource};
use crate::error::Result;
use crate::ml::{model::CausalLm, observer::TrainingObserver};

/// What happened in one optimiser step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Global step, 0-based, counted across epochs
    pub step:   usize,
    pub epoch:  usize,
    pub loss:   f64,
    /// Non-padding tokens in the batch
    pub tokens: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub steps:     usize,
    pub epochs:    usize,
    pub last_loss: Option<f64>,
}

/// AdamW with the run's learning-rate-independent settings.
pub fn adamw<B: AutodiffBackend>(cfg: &TrainingConfig) -> impl Optimizer<CausalLm<B>, B> {
    AdamWConfig::new()
        .with_beta_1(cfg.betas.0 as f32)
        .with_beta_2(cfg.betas.1 as f32)
        .with_weight_decay(cfg.weight_decay as f32)
        .init()
}

pub struct Trainer<B: AutodiffBackend, O: Optimizer<CausalLm<B>, B>> {
    optim:         O,
    learning_rate: f64,
    pad_id:        Option<usize>,
    _backend:      PhantomData<B>,
}

impl<B: AutodiffBackend, O: Optimizer<CausalLm<B>, B>> Trainer<B, O> {
    pub fn new(optim: O, learning_rate: f64, pad_id: Option<usize>) -> Self {
        Self { optim, learning_rate, pad_id, _backend: PhantomData }
    }

    /// One forward/backward/update. Returns the updated model and the
    /// batch loss.
    pub fn step(&mut self, model: CausalLm<B>, batch: LmBatch<B>) -> (CausalLm<B>, f64) {
        let loss = model.forward_loss(batch.input_ids, self.pad_id);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let model = self.optim.step(self.learning_rate, model, grads);
        (model, loss_val)
    }

    pub fn fit<S: TextSource>(
        &mut self,
        mut model:  CausalLm<B>,
        pipeline:   &DataPipeline<S, B>,
        max_epochs: usize,
        observer:   &mut dyn TrainingObserver<B>,
    ) -> Result<(CausalLm<B>, TrainSummary)> {
        observer.on_train_start(&model)?;

        let mut step = 0usize;
        let mut last_loss = None;
        for epoch in 0..max_epochs {
            let mut epoch_loss = 0.0f64;
            let mut epoch_steps = 0usize;

            for batch in pipeline.stream()? {
                let batch = batch?;
                let tokens = batch.attention_mask.clone().sum().into_scalar().elem::<i64>() as usize;

                let (updated, loss) = self.step(model, batch);
                model = updated;

                let report = StepReport { step, epoch, loss, tokens };
                observer.on_step_end(&report, &model)?;

                epoch_loss += loss;
                epoch_steps += 1;
                last_loss = Some(loss);
                step += 1;
            }

            let mean = if epoch_steps > 0 { epoch_loss / epoch_steps as f64 } else { f64::NAN };
            tracing::info!(
                "Epoch {:>3}/{} | steps={} | mean_loss={:.4}",
                epoch + 1, max_epochs, epoch_steps, mean
            );
            observer.on_epoch_end(epoch, mean, &model)?;
        }

        let summary = TrainSummary { steps: step, epochs: max_epochs, last_loss };
        observer.on_train_end(&summary, &model)?;
        tracing::info!("Training complete after {} steps", step);
        Ok((model, summary))
    }
}
