// ============================================================
// Layer 4 — LM Batcher
// ============================================================
// Implements Burn's Batcher trait to stack TokenizedSequences
// into tensors on the training device.
//
//   Input:  N sequences, each of length S (already padded)
//   Output: LmBatch with input_ids / attention_mask of shape [N, S]
//
// The same tensor is both input and target for causal language
// modelling; the shift by one position happens in the model.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TokenizedSequence;

#[derive(Debug, Clone)]
pub struct LmBatch<B: Backend> {
    /// Token ids — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding — shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,
}

impl<B: Backend> LmBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.input_ids.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct LmBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> LmBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TokenizedSequence, LmBatch<B>> for LmBatcher<B> {
    fn batch(&self, items: Vec<TokenizedSequence>) -> LmBatch<B> {
        let batch_size = items.len();
        // Uniform length is guaranteed by the encoder
        let seq_len = items.first().map(TokenizedSequence::len).unwrap_or(0);

        // Burn Int tensors are built from i32 here, not u32
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();
        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        LmBatch { input_ids, attention_mask }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shape_and_values() {
        let items = vec![
            TokenizedSequence { input_ids: vec![5, 6, 0], attention_mask: vec![1, 1, 0] },
            TokenizedSequence { input_ids: vec![7, 0, 0], attention_mask: vec![1, 0, 0] },
        ];
        let batcher = LmBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(items);

        assert_eq!(batch.input_ids.dims(), [2, 3]);
        assert_eq!(batch.batch_size(), 2);
        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![5, 6, 0, 7, 0, 0]);
        let mask_sum: i64 = batch.attention_mask.sum().into_scalar().elem::<i64>();
        assert_eq!(mask_sum, 3);
    }
}
