// ============================================================
// Layer 4 — Streaming Text Source
// ============================================================
// Reads training texts lazily from a file, one game per item.
//
// Two formats are understood, chosen by extension:
//   .txt   → every non-empty line is one game
//   .jsonl → every line is a JSON object; its "text" field
//            is one game (the layout of hub text datasets)
//
// Nothing is buffered beyond the current line. Each call to
// open() re-opens the file, which is what makes an epoch
// restartable.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::traits::TextSource;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Lines,
    JsonLines,
}

impl TextFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("json") => Self::JsonLines,
            _ => Self::Lines,
        }
    }
}

pub struct TextFileSource {
    path:   PathBuf,
    format: TextFormat,
    field:  String,
}

impl TextFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path   = path.into();
        let format = TextFormat::from_path(&path);
        Self { path, format, field: "text".to_string() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for TextFileSource {
    fn open(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::ResourceFetch(format!("cannot open dataset '{}': {e}", self.path.display()))
        })?;
        tracing::debug!("Streaming {:?} records from '{}'", self.format, self.path.display());

        let lines = BufReader::new(file)
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()));

        let iter: Box<dyn Iterator<Item = Result<String>> + '_> = match self.format {
            TextFormat::Lines => Box::new(lines.map(|l| l.map_err(PipelineError::from))),
            TextFormat::JsonLines => Box::new(lines.map(move |l| {
                let l = l?;
                let value: serde_json::Value = serde_json::from_str(&l)?;
                value
                    .get(&self.field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        PipelineError::ResourceFetch(format!("record has no string field '{}'", self.field))
                    })
            })),
        };
        Ok(iter)
    }
}
