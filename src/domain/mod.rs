// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe the problem:
// a run's configuration, chess games and positions, and the
// seams (text sources, trackers, model sources) the outer
// layers plug into.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO network calls
//   - Only structs, enums, traits and pure functions

// Every knob of a fine-tuning run
pub mod training_config;

// A position as piece placement, FEN in and out
pub mod board;

// One PGN game: tag pairs and movetext
pub mod game;

// Core abstractions that other layers implement
pub mod traits;
