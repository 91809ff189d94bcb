// ============================================================
// Layer 4 — Fixed-Length Preprocessor
// ============================================================
// The LSTM is fed dense [batch, cap_len, num_features] tensors,
// so every cascade must be brought to exactly cap_len steps:
//
//   len > cap_len   →  keep the first cap_len tweets
//   len < cap_len   →  append zero vectors
//   len == 0        →  removed (nothing to classify)
//   bad width       →  removed
//
// Example (cap_len = 3, num_features = 2):
//   [[1,2]]               → [1,2, 0,0, 0,0]
//   [[1,2],[3,4],[5,6],[7,8]] → [1,2, 3,4, 5,6]
//
// Standardisation then rescales each feature to zero mean and
// unit variance, computed over real steps only. Padding stays 0.

use anyhow::{bail, Result};

use crate::domain::cascade::CascadeSequence;

/// Output of `preprocess_sequences_to_fixed_len`.
#[derive(Debug, Clone, Default)]
pub struct FixedLenSequences {
    /// Flattened rows of `cap_len * num_features` values
    pub rows:    Vec<Vec<f32>>,
    /// Number of real (unpadded) steps in each row
    pub lengths: Vec<usize>,
    /// Indices into the input of sequences that were dropped, ascending
    pub removed: Vec<usize>,
}

/// Truncate or zero-pad every sequence to `cap_len` steps.
pub fn preprocess_sequences_to_fixed_len(
    sequences:    &[CascadeSequence],
    cap_len:      usize,
    num_features: usize,
) -> Result<FixedLenSequences> {
    if cap_len == 0 {
        bail!("cap_len must be at least 1");
    }
    if num_features == 0 {
        bail!("num_features must be at least 1");
    }

    let mut out = FixedLenSequences::default();
    for (ix, seq) in sequences.iter().enumerate() {
        if seq.is_empty() || !seq.has_width(num_features) {
            out.removed.push(ix);
            continue;
        }

        let len     = seq.len().min(cap_len);
        let mut row = Vec::with_capacity(cap_len * num_features);
        for step in &seq.features[..len] {
            row.extend_from_slice(step);
        }
        row.resize(cap_len * num_features, 0.0);

        out.rows.push(row);
        out.lengths.push(len);
    }

    if !out.removed.is_empty() {
        tracing::debug!(
            "Removed {} of {} sequences (empty or wrong width)",
            out.removed.len(),
            sequences.len()
        );
    }
    Ok(out)
}

// ─── Standardizer ─────────────────────────────────────────────────────────────
/// Per-feature z-score statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub mean: Vec<f32>,
    pub std:  Vec<f32>,
}

impl Standardizer {
    /// Fit mean and standard deviation over the real steps of `seqs`.
    pub fn fit(seqs: &FixedLenSequences, num_features: usize) -> Self {
        let mut sum   = vec![0.0f64; num_features];
        let mut sq    = vec![0.0f64; num_features];
        let mut count = 0usize;

        for (row, &len) in seqs.rows.iter().zip(&seqs.lengths) {
            for step in row.chunks_exact(num_features).take(len) {
                for (f, &x) in step.iter().enumerate() {
                    sum[f] += x as f64;
                    sq[f]  += (x as f64) * (x as f64);
                }
            }
            count += len;
        }

        let n = count.max(1) as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sq
            .iter()
            .zip(&mean)
            .map(|(s, m)| {
                let var = (s / n - m * m).max(0.0);
                let sd  = var.sqrt() as f32;
                // constant feature: leave it centred, not blown up
                if sd > f32::EPSILON { sd } else { 1.0 }
            })
            .collect();

        Self { mean: mean.into_iter().map(|m| m as f32).collect(), std }
    }

    /// Rescale the real steps in place. Padding is left at zero.
    pub fn transform(&self, seqs: &mut FixedLenSequences) {
        let num_features = self.mean.len();
        for (row, &len) in seqs.rows.iter_mut().zip(&seqs.lengths) {
            for step in row.chunks_exact_mut(num_features).take(len) {
                for (f, x) in step.iter_mut().enumerate() {
                    *x = (*x - self.mean[f]) / self.std[f];
                }
            }
        }
    }
}

/// Fit on `seqs` and transform them, or pass through unchanged.
pub fn standardize(seqs: &mut FixedLenSequences, num_features: usize, enabled: bool) {
    if !enabled {
        return;
    }
    let scaler = Standardizer::fit(seqs, num_features);
    tracing::debug!("Standardised with mean={:?} std={:?}", scaler.mean, scaler.std);
    scaler.transform(seqs);
}
