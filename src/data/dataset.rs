use serde::{Deserialize, Serialize};

/// One game, tokenised, padded and truncated to the configured length.
/// Layout: [game tokens ...][PAD][PAD]...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedSequence {
    pub input_ids:      Vec<u32>,
    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,
}

impl TokenizedSequence {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of non-padding tokens
    pub fn content_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}
