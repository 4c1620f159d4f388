// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From text on disk to fixed-length tensor batches:
//
//   text file (.txt / .jsonl)
//       │
//       ▼
//   TextFileSource    → one game per item, read lazily
//       │
//       ▼
//   SequenceEncoder   → token ids padded/truncated to max_seq_len
//       │
//       ▼
//   LmBatcher         → stacks sequences into [batch, seq] tensors
//       │
//       ▼
//   BatchStream       → iterator the training loop consumes,
//                       restarted for every epoch
//
// PGN files are turned into text datasets by the pgn module
// (see the `prepare` command).

/// Streaming line / JSON-lines text source
pub mod source;

/// PGN splitting and movetext cleaning
pub mod pgn;

/// A tokenised, fixed-length sequence
pub mod dataset;

/// Tokenizer wrapper enforcing the fixed sequence length
pub mod encoder;

/// Implements Burn's Batcher trait for LM batches
pub mod batcher;

/// Lazy, restartable batch iterator
pub mod stream;
