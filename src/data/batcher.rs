// ============================================================
// Layer 4 — SMS Batcher
// ============================================================
// Implements Burn's Batcher trait to stack EncodedSamples into
// tensors:
//
//   Input:  Vec of N samples, each with max_length ids
//   Output: SmsBatch { input_ids: [N, max_length], labels: [N] }
//
// Samples are pre-padded, so flattening row by row and
// reshaping is enough.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::EncodedSample;

#[derive(Debug, Clone)]
pub struct SmsBatch<B: Backend> {
    /// Token ids — shape: [batch_size, max_length]
    pub input_ids: Tensor<B, 2, Int>,

    /// Risk tier index per sample — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SmsBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SmsBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<EncodedSample, SmsBatch<B>> for SmsBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> SmsBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.input_ids.len());

        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            ids_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels.as_slice(), &self.device
        );

        SmsBatch { input_ids, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device  = Default::default();
        let batcher = SmsBatcher::<NdArray>::new(device);
        let batch   = batcher.batch(vec![
            EncodedSample { input_ids: vec![2, 3, 0, 0], label: 1 },
            EncodedSample { input_ids: vec![5, 0, 0, 0], label: 2 },
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![2, 3, 0, 0, 5, 0, 0, 0]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 2]);
    }
}
