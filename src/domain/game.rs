// ============================================================
// Layer 3 — Game Domain Type
// ============================================================
// One game as read from a PGN file: its tag pairs
// ([Event "..."], [White "..."], ...) and its movetext.
// The movetext is what ends up in a training sequence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::board::Board;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Tag pairs keyed by tag name
    pub tags: BTreeMap<String, String>,

    /// Movetext with comments removed and whitespace collapsed,
    /// e.g. "1. e4 e5 2. Nf3 Nc6 1-0"
    pub movetext: String,
}

impl Game {
    pub fn new(tags: BTreeMap<String, String>, movetext: impl Into<String>) -> Self {
        Self { tags, movetext: movetext.into() }
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Result token from the `Result` tag, falling back to `*`.
    pub fn result(&self) -> &str {
        self.tag("Result").unwrap_or("*")
    }

    /// Position the game starts from: the `FEN` tag when present,
    /// the standard starting position otherwise.
    pub fn start_board(&self) -> Result<Board> {
        match self.tag("FEN") {
            Some(fen) => Board::from_fen(fen),
            None => Ok(Board::starting_position()),
        }
    }
}
