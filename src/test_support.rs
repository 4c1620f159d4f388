// Shared fixtures for unit tests: a small word-level tokenizer over
// chess moves, an in-memory text source, a tiny pretrained model
// directory and a tracker that records instead of writing.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use burn::prelude::*;
use safetensors::{tensor::TensorView, Dtype};
use tokenizers::{AddedToken, Tokenizer};

use crate::data::encoder::{configure_fixed_length, SequenceEncoder};
use crate::domain::training_config::TrainingConfig;
use crate::domain::traits::{TextSource, Tracker};
use crate::error::Result;
use crate::infra::hub::{CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE};
use crate::ml::model::{CausalLm, CausalLmConfig};

pub const PAD: &str = "[PAD]";

const MOVES: [&str; 24] = [
    "[UNK]", ".", "1", "2", "3", "4", "5", "-", "+", "O",
    "e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6",
    "d4", "d5", "c4", "e6", "Nc3", "Be7",
];

pub fn move_tokenizer_json() -> String {
    let vocab: serde_json::Map<String, serde_json::Value> = MOVES
        .iter()
        .enumerate()
        .map(|(i, m)| (m.to_string(), serde_json::json!(i)))
        .collect();
    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    })
    .to_string()
}

/// Word-level tokenizer without a pad token.
pub fn move_tokenizer() -> Tokenizer {
    Tokenizer::from_str(&move_tokenizer_json()).unwrap()
}

/// Tokenizer with `[PAD]` registered, padded and truncated to `max_len`.
pub fn fixed_length_encoder(max_len: usize) -> SequenceEncoder {
    let mut tok = move_tokenizer();
    tok.add_special_tokens(&[AddedToken::from(PAD, true)]);
    let pad_id = tok.token_to_id(PAD).unwrap();
    configure_fixed_length(&mut tok, pad_id, PAD, max_len).unwrap();
    SequenceEncoder::new(tok, max_len)
}

pub struct VecSource(pub Vec<String>);

impl TextSource for VecSource {
    fn open(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
        Ok(Box::new(self.0.iter().cloned().map(Ok)))
    }
}

pub fn tiny_model_config() -> CausalLmConfig {
    CausalLmConfig::new(MOVES.len(), 16, 8, 2, 1).with_dropout(0.0)
}

fn raw<B: Backend, const D: usize>(name: String, t: Tensor<B, D>) -> (String, Vec<usize>, Vec<u8>) {
    let shape = t.dims().to_vec();
    let bytes = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .unwrap()
        .into_iter()
        .flat_map(f32::to_le_bytes)
        .collect();
    (name, shape, bytes)
}

/// Write `model` in the GPT-2 safetensors layout.
pub fn export_pretrained<B: Backend>(model: &CausalLm<B>, path: &Path) {
    let mut tensors = vec![
        raw("wte.weight".into(), model.wte.weight.val()),
        raw("wpe.weight".into(), model.wpe.weight.val()),
        raw("ln_f.weight".into(), model.ln_f.gamma.val()),
        raw("ln_f.bias".into(), model.ln_f.beta.val()),
    ];
    for (i, block) in model.h.iter().enumerate() {
        for (name, ln) in [("ln_1", &block.ln_1), ("ln_2", &block.ln_2)] {
            tensors.push(raw(format!("h.{i}.{name}.weight"), ln.gamma.val()));
            tensors.push(raw(format!("h.{i}.{name}.bias"), ln.beta.val()));
        }
        for (name, lin) in [
            ("attn.c_attn", &block.attn.c_attn),
            ("attn.c_proj", &block.attn.c_proj),
            ("mlp.c_fc", &block.mlp.c_fc),
            ("mlp.c_proj", &block.mlp.c_proj),
        ] {
            tensors.push(raw(format!("h.{i}.{name}.weight"), lin.weight.val()));
            tensors.push(raw(format!("h.{i}.{name}.bias"), lin.bias.as_ref().unwrap().val()));
        }
    }

    let views: HashMap<String, TensorView<'_>> = tensors
        .iter()
        .map(|(name, shape, bytes)| {
            (name.clone(), TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap())
        })
        .collect();
    let out = safetensors::serialize(&views, &None).unwrap();
    std::fs::write(path, out).unwrap();
}

/// A complete pretrained directory (config.json, tokenizer.json,
/// model.safetensors) for the tiny move vocabulary.
pub fn write_tiny_pretrained(dir: &Path) -> CausalLmConfig {
    let cfg = tiny_model_config();
    let hf = serde_json::json!({
        "model_type":  "gpt2",
        "vocab_size":  cfg.vocab_size,
        "n_positions": cfg.n_positions,
        "n_embd":      cfg.n_embd,
        "n_head":      cfg.n_head,
        "n_layer":     cfg.n_layer,
        "resid_pdrop": 0.0,
    });
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(CONFIG_FILE), hf.to_string()).unwrap();
    std::fs::write(dir.join(TOKENIZER_FILE), move_tokenizer_json()).unwrap();

    let model: CausalLm<burn::backend::NdArray> = cfg.init(&Default::default());
    export_pretrained(&model, &dir.join(WEIGHTS_FILE));
    cfg
}

/// Tracker that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    pub run_id:    Option<String>,
    pub metrics:   Vec<(usize, String, f64)>,
    pub artifacts: Vec<(String, String, PathBuf)>,
    pub finished:  bool,
}

impl RecordingTracker {
    pub fn metric(&self, name: &str) -> Vec<(usize, f64)> {
        self.metrics
            .iter()
            .filter(|(_, n, _)| n == name)
            .map(|(s, _, v)| (*s, *v))
            .collect()
    }
}

impl Tracker for RecordingTracker {
    fn init_run(&mut self, _project: &str, _config: &TrainingConfig) -> Result<String> {
        let id = "testrun1".to_string();
        self.run_id = Some(id.clone());
        Ok(id)
    }

    fn log_metrics(&mut self, step: usize, metrics: &[(&str, f64)]) -> Result<()> {
        self.metrics
            .extend(metrics.iter().map(|(n, v)| (step, n.to_string(), *v)));
        Ok(())
    }

    fn log_artifact(&mut self, name: &str, kind: &str, path: &Path) -> Result<()> {
        self.artifacts.push((name.to_string(), kind.to_string(), path.to_path_buf()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
