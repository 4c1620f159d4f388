// ============================================================
// Pipeline Errors
// ============================================================
// One error type shared by the data, ml and infra layers.
// The application and CLI layers wrap these in anyhow with
// extra context; nothing below them is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A config line without a `:` separator, or a value that does not
    /// parse to its declared type
    #[error("config line {line}: {message}")]
    ConfigParse { line: usize, message: String },

    /// Values that parse but do not fit together, e.g. a sequence
    /// length longer than the model's position table
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pretrained model, tokenizer or dataset could not be fetched/loaded
    #[error("cannot fetch resource: {0}")]
    ResourceFetch(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("tracking error: {0}")]
    Tracking(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// Tag extraction asked for a tag the input does not contain
    #[error("tag <{0}> not present in input string")]
    MissingTag(String),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(line: usize, message: impl Into<String>) -> Self {
        Self::ConfigParse { line, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
