// ============================================================
// Layer 5 — Causal Language Model (GPT-2 layout)
// ============================================================
// A decoder-only transformer assembled from Burn building
// blocks, with field names that mirror the GPT-2 checkpoint
// layout so pretrained tensors map one-to-one:
//
//   wte  [vocab, n_embd]        token embedding (also the LM head)
//   wpe  [n_positions, n_embd]  learned positions
//   h.N  ln_1 → attn → +res → ln_2 → mlp → +res
//   ln_f final layer norm
//
// logits = ln_f(h(wte(ids) + wpe(pos))) · wteᵀ

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    module::Param,
    prelude::*,
    tensor::activation::{gelu, log_softmax, softmax},
};
use burn::nn::attention::generate_autoregressive_mask;
use serde::Deserialize;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct CausalLmConfig {
    pub vocab_size:  usize,
    pub n_positions: usize,
    pub n_embd:      usize,
    pub n_head:      usize,
    pub n_layer:     usize,
    #[config(default = 1e-5)]
    pub layer_norm_epsilon: f64,
    #[config(default = 0.1)]
    pub dropout: f64,
}

/// The subset of a HuggingFace GPT-2 `config.json` we read.
#[derive(Debug, Deserialize)]
struct HfGpt2Config {
    vocab_size:  usize,
    n_positions: usize,
    n_embd:      usize,
    n_head:      usize,
    n_layer:     usize,
    #[serde(default = "default_epsilon")]
    layer_norm_epsilon: f64,
    #[serde(default = "default_pdrop")]
    resid_pdrop: f64,
}

fn default_epsilon() -> f64 { 1e-5 }
fn default_pdrop() -> f64 { 0.1 }

impl CausalLmConfig {
    /// Parse a HuggingFace `config.json`.
    pub fn from_hf_json(json: &str) -> serde_json::Result<Self> {
        let hf: HfGpt2Config = serde_json::from_str(json)?;
        Ok(Self::new(hf.vocab_size, hf.n_positions, hf.n_embd, hf.n_head, hf.n_layer)
            .with_layer_norm_epsilon(hf.layer_norm_epsilon)
            .with_dropout(hf.resid_pdrop))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CausalLm<B> {
        let init = Initializer::Normal { mean: 0.0, std: 0.02 };
        let wte = EmbeddingConfig::new(self.vocab_size, self.n_embd)
            .with_initializer(init.clone())
            .init(device);
        let wpe = EmbeddingConfig::new(self.n_positions, self.n_embd)
            .with_initializer(init)
            .init(device);
        let h = (0..self.n_layer).map(|_| self.build_block(device)).collect();
        let ln_f = LayerNormConfig::new(self.n_embd)
            .with_epsilon(self.layer_norm_epsilon)
            .init(device);
        CausalLm {
            wte, wpe, h, ln_f,
            drop: DropoutConfig::new(self.dropout).init(),
            n_positions: self.n_positions,
        }
    }

    fn build_block<B: Backend>(&self, device: &B::Device) -> Block<B> {
        let e = self.n_embd;
        let ln = || LayerNormConfig::new(e).with_epsilon(self.layer_norm_epsilon).init(device);
        Block {
            ln_1: ln(),
            attn: CausalSelfAttention {
                c_attn:  LinearConfig::new(e, 3 * e).init(device),
                c_proj:  LinearConfig::new(e, e).init(device),
                dropout: DropoutConfig::new(self.dropout).init(),
                n_head:  self.n_head,
            },
            ln_2: ln(),
            mlp: Mlp {
                c_fc:    LinearConfig::new(e, 4 * e).init(device),
                c_proj:  LinearConfig::new(4 * e, e).init(device),
                dropout: DropoutConfig::new(self.dropout).init(),
            },
        }
    }
}

// ─── Attention ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CausalSelfAttention<B: Backend> {
    /// Fused q/k/v projection: n_embd → 3·n_embd
    pub c_attn:  Linear<B>,
    pub c_proj:  Linear<B>,
    pub dropout: Dropout,
    pub n_head:  usize,
}

impl<B: Backend> CausalSelfAttention<B> {
    /// x: [batch, seq, n_embd] → [batch, seq, n_embd]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, embd] = x.dims();
        let head_dim = embd / self.n_head;

        let qkv = self.c_attn.forward(x);
        let heads = |t: Tensor<B, 3>| {
            t.reshape([batch, seq, self.n_head, head_dim]).swap_dims(1, 2)
        };
        let q = heads(qkv.clone().slice([0..batch, 0..seq, 0..embd]));
        let k = heads(qkv.clone().slice([0..batch, 0..seq, embd..2 * embd]));
        let v = heads(qkv.slice([0..batch, 0..seq, 2 * embd..3 * embd]));

        // [batch, n_head, seq, seq]
        let scores = q.matmul(k.transpose()).div_scalar((head_dim as f64).sqrt());
        let mask = generate_autoregressive_mask::<B>(batch, seq, &scores.device())
            .unsqueeze_dim::<4>(1)
            .expand([batch, self.n_head, seq, seq]);
        let weights = softmax(scores.mask_fill(mask, -1.0e4), 3);
        let weights = self.dropout.forward(weights);

        let context = weights
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, seq, embd]);
        self.dropout.forward(self.c_proj.forward(context))
    }
}

// ─── Feed-forward ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub c_fc:    Linear<B>,
    pub c_proj:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Mlp<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.dropout.forward(self.c_proj.forward(gelu(self.c_fc.forward(x))))
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    pub ln_1: LayerNorm<B>,
    pub attn: CausalSelfAttention<B>,
    pub ln_2: LayerNorm<B>,
    pub mlp:  Mlp<B>,
}

impl<B: Backend> Block<B> {
    /// Pre-norm residual block.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = x.clone() + self.attn.forward(self.ln_1.forward(x));
        x.clone() + self.mlp.forward(self.ln_2.forward(x))
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CausalLm<B: Backend> {
    pub wte:  Embedding<B>,
    pub wpe:  Embedding<B>,
    pub drop: Dropout,
    pub h:    Vec<Block<B>>,
    pub ln_f: LayerNorm<B>,
    pub n_positions: usize,
}

impl<B: Backend> CausalLm<B> {
    /// Rows in the token embedding table.
    pub fn vocab_size(&self) -> usize {
        self.wte.weight.val().dims()[0]
    }

    pub fn embedding_dim(&self) -> usize {
        self.wte.weight.val().dims()[1]
    }

    /// input_ids: [batch, seq] → logits: [batch, seq, vocab]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, seq] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq as i64, &device)
            .unsqueeze::<2>()
            .expand([batch, seq]);
        let mut x = self.drop.forward(self.wte.forward(input_ids) + self.wpe.forward(positions));
        for block in &self.h {
            x = block.forward(x);
        }
        let x = self.ln_f.forward(x);

        // Tied head: project onto the token embedding table.
        let [_, _, embd] = x.dims();
        let table = self.wte.weight.val();
        let vocab = table.dims()[0];
        x.reshape([batch * seq, embd])
            .matmul(table.transpose())
            .reshape([batch, seq, vocab])
    }

    /// Next-token cross-entropy with the input as its own target:
    /// logits at position t are scored against token t+1. Targets equal
    /// to `pad_id` are excluded from both the sum and the count, so the
    /// loss of a sequence does not depend on how much padding follows it.
    pub fn forward_loss(&self, input_ids: Tensor<B, 2, Int>, pad_id: Option<usize>) -> Tensor<B, 1> {
        let [batch, seq] = input_ids.dims();
        assert!(seq >= 2, "causal LM loss needs at least two positions, got {seq}");

        let logits = self.forward(input_ids.clone());
        let vocab = logits.dims()[2];
        let n = batch * (seq - 1);
        let logits = logits
            .slice([0..batch, 0..seq - 1, 0..vocab])
            .reshape([n, vocab]);
        let targets = input_ids
            .slice([0..batch, 1..seq])
            .reshape([n]);

        let Some(pad_id) = pad_id else {
            return CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits, targets);
        };

        let log_probs = log_softmax(logits, 1);
        let target_log_probs = log_probs
            .gather(1, targets.clone().reshape([n, 1]))
            .reshape([n]);
        let keep = targets.equal_elem(pad_id as i64).bool_not().float();
        let count = keep.clone().sum().clamp_min(1.0);

        (target_log_probs * keep).sum().neg() / count
    }

    /// Grow or shrink the token table to `new_vocab` rows. Existing rows
    /// are kept; added rows are drawn from N(0, 0.02).
    pub fn resize_token_embeddings(mut self, new_vocab: usize) -> Self {
        let old = self.wte.weight.val();
        let [old_vocab, embd] = old.dims();
        if new_vocab == old_vocab {
            return self;
        }

        let weight = if new_vocab > old_vocab {
            let fresh = EmbeddingConfig::new(new_vocab - old_vocab, embd)
                .with_initializer(Initializer::Normal { mean: 0.0, std: 0.02 })
                .init::<B>(&old.device())
                .weight
                .val();
            Tensor::cat(vec![old, fresh], 0)
        } else {
            old.slice([0..new_vocab, 0..embd])
        };
        tracing::debug!("Resized token embeddings {} → {}", old_vocab, new_vocab);

        // The concatenation is not a leaf under autodiff; start a new one.
        self.wte.weight = Param::from_tensor(weight.detach());
        self
    }

    /// L2 norm of each top-level weight group, for tracking.
    pub fn parameter_norms(&self) -> Vec<(String, f64)> {
        let norm2 = |t: Tensor<B, 2>| t.detach().powf_scalar(2.0).sum().sqrt().into_scalar().elem::<f64>();
        let mut norms = vec![
            ("wte".to_string(), norm2(self.wte.weight.val())),
            ("wpe".to_string(), norm2(self.wpe.weight.val())),
        ];
        for (i, block) in self.h.iter().enumerate() {
            norms.push((format!("h.{i}.attn"), norm2(block.attn.c_attn.weight.val())));
            norms.push((format!("h.{i}.mlp"), norm2(block.mlp.c_fc.weight.val())));
        }
        norms
    }
}
