// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network:
//
//   config_file.rs     — parses the key/value config file
//                        into a TrainingConfig
//
//   hub.rs             — fetches pretrained models and
//                        datasets from the Hugging Face Hub,
//                        or uses local paths as-is
//
//   checkpoint.rs      — saves and loads model weights with
//                        Burn's NamedMpkGzFileRecorder, plus the
//                        run's TrainingConfig as JSON
//
//   tokenizer_store.rs — persists the extended tokenizer next
//                        to the checkpoints
//
//   metrics.rs         — append-only metrics CSV
//
//   tracking.rs        — file-backed experiment tracker

/// Config file parsing
pub mod config_file;

/// Hugging Face Hub access
pub mod hub;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer saving and loading
pub mod tokenizer_store;

/// Metrics CSV logger
pub mod metrics;

/// Local experiment tracker
pub mod tracking;
