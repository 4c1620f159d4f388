// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the lower layers together for one
// command. No model math and no printing happens here.
//
// Errors are reported with anyhow and a line of context per
// step; the layers below return PipelineError.

// Fine-tune a pretrained causal LM on a text dataset
pub mod train_use_case;

// One forward pass over one batch, as a sanity check
pub mod probe_use_case;

// PGN file → line-per-game text dataset
pub mod prepare_use_case;
