// ============================================================
// Layer 5 — Model Factory
// ============================================================
// Builds the (tokenizer, model) pair a fine-tuning run starts
// from:
//
//   1. fetch config.json / tokenizer.json / model.safetensors
//   2. build the CausalLm and load the pretrained weights
//   3. register `[PAD]`        → vocabulary grows by one
//   4. resize wte to the new vocabulary (old rows kept)
//   5. fix the tokenizer to pad/truncate at max_seq_len
//
// The model is created directly on the device it will train on.

use std::fs;

use burn::prelude::*;
use tokenizers::{AddedToken, Tokenizer};

use crate::data::encoder::configure_fixed_length;
use crate::domain::traits::ModelSource;
use crate::error::{PipelineError, Result};
use crate::ml::{
    model::{CausalLm, CausalLmConfig},
    weights::load_pretrained,
};

pub const PAD_TOKEN: &str = "[PAD]";

pub struct PretrainedModel<B: Backend> {
    pub tokenizer: Tokenizer,
    pub model:     CausalLm<B>,
    pub config:    CausalLmConfig,
    pub pad_id:    u32,
}

pub fn create_model<B: Backend>(
    source:      &dyn ModelSource,
    model_id:    &str,
    max_seq_len: usize,
    device:      &B::Device,
) -> Result<PretrainedModel<B>> {
    let files = source.fetch(model_id)?;

    let config_json = fs::read_to_string(&files.config)?;
    let config = CausalLmConfig::from_hf_json(&config_json).map_err(|e| {
        PipelineError::ResourceFetch(format!("bad model config '{}': {e}", files.config.display()))
    })?;
    if max_seq_len < 2 || max_seq_len > config.n_positions {
        return Err(PipelineError::InvalidConfig(format!(
            "max_seq_len {max_seq_len} outside 2..={} for '{model_id}'",
            config.n_positions
        )));
    }

    let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| {
        PipelineError::ResourceFetch(format!("cannot load tokenizer '{}': {e}", files.tokenizer.display()))
    })?;
    let original_vocab = tokenizer.get_vocab_size(true);
    tokenizer.add_special_tokens(&[AddedToken::from(PAD_TOKEN, true)]);
    let vocab = tokenizer.get_vocab_size(true);
    if vocab != original_vocab + 1 {
        tracing::warn!("Tokenizer for '{}' already defined {}", model_id, PAD_TOKEN);
    }
    let pad_id = tokenizer
        .token_to_id(PAD_TOKEN)
        .ok_or_else(|| PipelineError::Tokenizer(format!("{PAD_TOKEN} was not registered")))?;
    configure_fixed_length(&mut tokenizer, pad_id, PAD_TOKEN, max_seq_len)?;

    let model = config.init::<B>(device);
    let model = load_pretrained(model, &files.weights, device)?;
    let model = model.resize_token_embeddings(vocab.max(pad_id as usize + 1));

    tracing::info!(
        "Model '{}' ready: vocab {} → {}, pad id {}, max_seq_len {}",
        model_id, original_vocab, model.vocab_size(), pad_id, max_seq_len
    );
    Ok(PretrainedModel { tokenizer, model, config, pad_id })
}
