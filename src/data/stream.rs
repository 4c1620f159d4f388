// ============================================================
// Layer 4 — Batch Stream
// ============================================================
// Lazily turns a TextSource into tensor batches.
//
//   TextSource::open()  ──▶  take batch_size texts
//                       ──▶  SequenceEncoder::encode_batch
//                       ──▶  LmBatcher::batch
//                       ──▶  LmBatch<B>
//
// Only one batch of text is in memory at a time. Pulling the
// next batch may block on disk I/O. The last batch of a pass may
// be shorter than batch_size.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{
    batcher::{LmBatch, LmBatcher},
    encoder::SequenceEncoder,
};
use crate::domain::traits::TextSource;
use crate::error::Result;

/// Everything needed to stream batches, bundled so the trainer can
/// start a fresh pass every epoch.
pub struct DataPipeline<S: TextSource, B: Backend> {
    source:     S,
    encoder:    SequenceEncoder,
    batcher:    LmBatcher<B>,
    batch_size: usize,
}

impl<S: TextSource, B: Backend> DataPipeline<S, B> {
    pub fn new(source: S, encoder: SequenceEncoder, device: B::Device, batch_size: usize) -> Self {
        Self {
            source,
            encoder,
            batcher: LmBatcher::new(device),
            batch_size: batch_size.max(1),
        }
    }

    pub fn encoder(&self) -> &SequenceEncoder {
        &self.encoder
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start a new pass over the source.
    pub fn stream(&self) -> Result<BatchStream<'_, B>> {
        Ok(BatchStream {
            texts:      self.source.open()?,
            encoder:    &self.encoder,
            batcher:    &self.batcher,
            batch_size: self.batch_size,
        })
    }
}

pub struct BatchStream<'a, B: Backend> {
    texts:      Box<dyn Iterator<Item = Result<String>> + 'a>,
    encoder:    &'a SequenceEncoder,
    batcher:    &'a LmBatcher<B>,
    batch_size: usize,
}

impl<'a, B: Backend> Iterator for BatchStream<'a, B> {
    type Item = Result<LmBatch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut texts = Vec::with_capacity(self.batch_size);
        for text in self.texts.by_ref().take(self.batch_size) {
            match text {
                Ok(t) => texts.push(t),
                Err(e) => return Some(Err(e)),
            }
        }
        if texts.is_empty() {
            return None;
        }

        Some(
            self.encoder
                .encode_batch(texts)
                .map(|seqs| self.batcher.batch(seqs)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_length_encoder, VecSource};
    use burn::backend::NdArray;

    fn pipeline(n: usize, batch_size: usize) -> DataPipeline<VecSource, NdArray> {
        let games = (0..n).map(|i| if i % 2 == 0 { "e4 e5 Nf3" } else { "d4 d5" }.to_string()).collect();
        DataPipeline::new(VecSource(games), fixed_length_encoder(6), Default::default(), batch_size)
    }

    #[test]
    fn test_yields_ceil_n_over_batch_size_batches() {
        let p = pipeline(5, 2);
        let sizes: Vec<usize> = p.stream().unwrap().map(|b| b.unwrap().batch_size()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_batches_have_configured_length() {
        let p = pipeline(4, 4);
        let batch = p.stream().unwrap().next().unwrap().unwrap();
        assert_eq!(batch.input_ids.dims(), [4, 6]);
    }

    #[test]
    fn test_stream_restarts() {
        let p = pipeline(3, 2);
        assert_eq!(p.stream().unwrap().count(), 2);
        assert_eq!(p.stream().unwrap().count(), 2);
    }

    #[test]
    fn test_empty_source_yields_nothing() {
        let p = pipeline(0, 2);
        assert_eq!(p.stream().unwrap().count(), 0);
    }
}
