// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<SeqSample>
// into tensors the LSTM can consume.
//
//   Input:  N samples, each a flat Vec of cap_len * F values
//   Output: sequences [N, cap_len, F], labels [N]
//
// Samples are already padded to the same length by the
// preprocessor, so batching is a flatten + reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::SeqSample;

/// A batch of cascades ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SeqBatch<B: Backend> {
    /// Feature sequences — shape: [batch_size, cap_len, num_features]
    pub sequences: Tensor<B, 3>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

/// Holds the target device and the per-sample shape.
#[derive(Clone, Debug)]
pub struct SeqBatcher<B: Backend> {
    pub device:       B::Device,
    pub cap_len:      usize,
    pub num_features: usize,
}

impl<B: Backend> SeqBatcher<B> {
    pub fn new(device: B::Device, cap_len: usize, num_features: usize) -> Self {
        Self { device, cap_len, num_features }
    }
}

impl<B: Backend> Batcher<SeqSample, SeqBatch<B>> for SeqBatcher<B> {
    fn batch(&self, items: Vec<SeqSample>) -> SeqBatch<B> {
        let batch_size = items.len();

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.sequence.iter().copied())
            .collect();
        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let sequences = Tensor::<B, 3>::from_data(
            TensorData::new(flat, [batch_size, self.cap_len, self.num_features]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        SeqBatch { sequences, labels }
    }
}
