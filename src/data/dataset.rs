use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::{preprocess_sequences_to_fixed_len, standardize};
use crate::domain::cascade::CascadeSequence;

/// One padded cascade, flattened to `cap_len * num_features` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeqSample {
    pub sequence: Vec<f32>,
    pub label:    u8,
}

#[derive(Debug, Clone)]
pub struct SeqDataset {
    samples:      Vec<SeqSample>,
    cap_len:      usize,
    num_features: usize,
}

impl SeqDataset {
    pub fn new(samples: Vec<SeqSample>, cap_len: usize, num_features: usize) -> Self {
        Self { samples, cap_len, num_features }
    }

    pub fn cap_len(&self) -> usize { self.cap_len }

    pub fn num_features(&self) -> usize { self.num_features }

    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Accuracy of always predicting the majority class.
    pub fn baseline_accuracy(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let positive = self.samples.iter().filter(|s| s.label == 1).count() as f64;
        let p = positive / self.samples.len() as f64;
        p.max(1.0 - p)
    }
}

impl Dataset<SeqSample> for SeqDataset {
    fn get(&self, index: usize) -> Option<SeqSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Pad/truncate, optionally standardise, and pair rows with their labels.
pub fn seq_data_to_dataset(
    seq_data:     &[CascadeSequence],
    cap_len:      usize,
    num_features: usize,
    standardize_features: bool,
) -> Result<SeqDataset> {
    if num_features == 0 {
        bail!("num_features must be at least 1");
    }
    let mut fixed = preprocess_sequences_to_fixed_len(seq_data, cap_len, num_features)?;
    standardize(&mut fixed, num_features, standardize_features);

    // `removed` is ascending, so one merge walk keeps X and Y aligned
    let mut removed = fixed.removed.iter().peekable();
    let labels: Vec<u8> = seq_data
        .iter()
        .enumerate()
        .filter_map(|(ix, seq)| {
            if removed.peek() == Some(&&ix) {
                removed.next();
                None
            } else {
                Some(seq.label)
            }
        })
        .collect();

    let samples: Vec<SeqSample> = fixed
        .rows
        .into_iter()
        .zip(labels)
        .map(|(sequence, label)| SeqSample { sequence, label })
        .collect();

    tracing::info!(
        "Generated tensor dataset of size: X[{}, {}, {}], Y[{}]",
        samples.len(),
        cap_len,
        num_features,
        samples.len()
    );
    Ok(SeqDataset::new(samples, cap_len, num_features))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cascade(len: usize, label: u8) -> CascadeSequence {
        CascadeSequence::new(vec![vec![len as f32, 1.0]; len], label)
    }

    #[test]
    fn test_labels_follow_removed_rows() {
        let input = vec![cascade(2, 1), cascade(0, 0), cascade(1, 0), cascade(0, 1)];
        let ds = seq_data_to_dataset(&input, 4, 2, false).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), vec![1, 0]);
        assert_eq!(ds.get(1).unwrap().sequence[0], 1.0);
    }

    #[test]
    fn test_baseline_accuracy_is_majority_share() {
        let input = vec![cascade(1, 1), cascade(1, 0), cascade(1, 0), cascade(1, 0)];
        let ds = seq_data_to_dataset(&input, 2, 2, true).unwrap();
        assert!((ds.baseline_accuracy() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset_baseline() {
        let ds = SeqDataset::new(Vec::new(), 4, 2);
        assert_eq!(ds.baseline_accuracy(), 0.0);
        assert!(ds.get(0).is_none());
    }
}
