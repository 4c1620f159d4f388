// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and optimiser code lives here.
//
//   model.rs    — GPT-2 style decoder: token + position
//                 embeddings, pre-norm blocks with causal
//                 self-attention and a GELU MLP, tied LM head
//
//   weights.rs  — copies a pretrained safetensors checkpoint
//                 into the Burn module
//
//   factory.rs  — tokenizer + pretrained model, with the
//                 [PAD] token added and embeddings resized
//
//   device.rs   — backend aliases and device selection
//
//   trainer.rs  — AdamW training loop over a BatchStream
//
//   observer.rs — per-step hooks: metrics and checkpoints
//
//   probe.rs    — single forward pass for a quick check

/// Causal transformer language model
pub mod model;

/// Pretrained weight loading
pub mod weights;

/// Model factory
pub mod factory;

/// Compute device selection
pub mod device;

/// Training loop
pub mod trainer;

/// Training hooks: tracking and checkpointing
pub mod observer;

/// Forward-only sanity check
pub mod probe;
