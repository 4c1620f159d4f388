// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Persists the extended tokenizer (pretrained vocabulary plus
// `[PAD]`, with padding and truncation settings) next to the
// checkpoints, so a checkpoint can always be paired with the
// exact vocabulary its embedding table was sized for.
//
// The file is the standard HuggingFace `tokenizer.json`.

use std::path::PathBuf;

use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn save(&self, tokenizer: &Tokenizer) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| PipelineError::Tokenizer(format!("cannot save '{}': {e}", path.display())))?;
        tracing::info!(
            "Tokenizer ({} tokens) saved to '{}'",
            tokenizer.get_vocab_size(true),
            path.display()
        );
        Ok(path)
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| PipelineError::Tokenizer(format!("cannot load '{}': {e}", path.display())))
    }
}
