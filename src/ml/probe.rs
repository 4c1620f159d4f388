// ============================================================
// Layer 5 — Forward Probe
// ============================================================
// Pull one batch through the pipeline and the model without
// autodiff. Used to check that a config, a tokenizer and a
// model fit together before committing to a long run.

use std::time::Instant;

use burn::prelude::*;

use crate::data::stream::DataPipeline;
use crate::domain::traits::TextSource;
use crate::error::{PipelineError, Result};
use crate::ml::model::CausalLm;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// [batch, seq, vocab]
    pub logits_shape: [usize; 3],
    pub loss:         f64,
    pub elapsed_secs: f64,
}

pub fn forward_probe<B: Backend, S: TextSource>(
    model:    &CausalLm<B>,
    pipeline: &DataPipeline<S, B>,
    pad_id:   Option<usize>,
) -> Result<ProbeReport> {
    let batch = pipeline
        .stream()?
        .next()
        .ok_or_else(|| PipelineError::ResourceFetch("dataset yielded no examples".into()))??;

    let start = Instant::now();
    let logits_shape = model.forward(batch.input_ids.clone()).dims();
    let loss = model
        .forward_loss(batch.input_ids, pad_id)
        .into_scalar()
        .elem::<f64>();
    let elapsed_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Forward probe: logits {:?}, loss {:.4}, {:.3}s",
        logits_shape, loss, elapsed_secs
    );
    Ok(ProbeReport { logits_shape, loss, elapsed_secs })
}
