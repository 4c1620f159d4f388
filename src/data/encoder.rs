// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Turns raw game texts into fixed-length token sequences.
//
// The tokenizer itself does the padding and truncation; this
// module configures it once and then checks the result:
//
//   "1. e4 e5 2. Nf3"  ──encode──▶  [16, 13, 304, 68, ...]
//                        pad/trunc  [16, 13, 304, 68, ..., PAD, PAD]
//                                   └──────── max_seq_len ────────┘
//
// Overflow is cut from the right: the opening of a game is
// kept, the tail is dropped.

use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};

use crate::data::dataset::TokenizedSequence;
use crate::error::{PipelineError, Result};

/// Make every encoding exactly `max_len` tokens long.
pub fn configure_fixed_length(
    tokenizer: &mut Tokenizer,
    pad_id:    u32,
    pad_token: &str,
    max_len:   usize,
) -> Result<()> {
    tokenizer.with_padding(Some(PaddingParams {
        strategy:           PaddingStrategy::Fixed(max_len),
        direction:          PaddingDirection::Right,
        pad_to_multiple_of: None,
        pad_id,
        pad_type_id:        0,
        pad_token:          pad_token.to_string(),
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            strategy:   TruncationStrategy::LongestFirst,
            stride:     0,
            direction:  TruncationDirection::Right,
        }))
        .map_err(|e| PipelineError::Tokenizer(format!("cannot enable truncation: {e}")))?;
    Ok(())
}

pub struct SequenceEncoder {
    tokenizer:   Tokenizer,
    max_seq_len: usize,
}

impl SequenceEncoder {
    /// `tokenizer` must already be configured with
    /// [`configure_fixed_length`] for `max_seq_len`.
    pub fn new(tokenizer: Tokenizer, max_seq_len: usize) -> Self {
        Self { tokenizer, max_seq_len }
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenise a group of texts in one call.
    pub fn encode_batch(&self, texts: Vec<String>) -> Result<Vec<TokenizedSequence>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts, false)
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))?;

        encodings
            .into_iter()
            .map(|enc| {
                let seq = TokenizedSequence {
                    input_ids:      enc.get_ids().to_vec(),
                    attention_mask: enc.get_attention_mask().to_vec(),
                };
                if seq.len() != self.max_seq_len {
                    return Err(PipelineError::Tokenizer(format!(
                        "encoded length {} != max_seq_len {}; tokenizer padding is not configured",
                        seq.len(),
                        self.max_seq_len
                    )));
                }
                Ok(seq)
            })
            .collect()
    }

    pub fn encode(&self, text: &str) -> Result<TokenizedSequence> {
        self.encode_batch(vec![text.to_string()])?
            .pop()
            .ok_or_else(|| PipelineError::Tokenizer("empty encoding batch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{move_tokenizer, PAD};

    fn encoder(max_len: usize) -> (SequenceEncoder, u32) {
        let mut tok = move_tokenizer();
        tok.add_special_tokens(&[tokenizers::AddedToken::from(PAD, true)]);
        let pad_id = tok.token_to_id(PAD).unwrap();
        configure_fixed_length(&mut tok, pad_id, PAD, max_len).unwrap();
        (SequenceEncoder::new(tok, max_len), pad_id)
    }

    #[test]
    fn test_short_text_is_padded() {
        let (enc, pad_id) = encoder(8);
        let seq = enc.encode("e4 e5 Nf3").unwrap();
        assert_eq!(seq.len(), 8);
        assert_eq!(seq.content_len(), 3);
        assert!(seq.input_ids[3..].iter().all(|&id| id == pad_id));
        assert_eq!(&seq.attention_mask[..4], &[1, 1, 1, 0]);
    }

    #[test]
    fn test_long_text_is_truncated_from_the_right() {
        let (enc, _) = encoder(3);
        let full  = encoder(16).0.encode("e4 e5 Nf3 Nc6 Bb5").unwrap();
        let short = enc.encode("e4 e5 Nf3 Nc6 Bb5").unwrap();
        assert_eq!(short.len(), 3);
        assert_eq!(short.input_ids, full.input_ids[..3].to_vec());
    }

    #[test]
    fn test_batch_has_uniform_length() {
        let (enc, _) = encoder(6);
        let seqs = enc
            .encode_batch(vec!["e4".into(), "e4 e5 Nf3 Nc6 Bb5 a6 Ba4".into(), "d4 d5".into()])
            .unwrap();
        assert!(seqs.iter().all(|s| s.len() == 6));
    }

    #[test]
    fn test_unconfigured_tokenizer_is_rejected() {
        let enc = SequenceEncoder::new(move_tokenizer(), 8);
        assert!(enc.encode("e4 e5").is_err());
    }
}
