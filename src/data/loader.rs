// ============================================================
// Layer 4 — Sequence Loader
// ============================================================
// Reads pre-extracted cascade features from JSON files:
//
//   {data_dir}/
//     twitter15/
//       train.json   ← required
//       val.json     ← optional, carved from train when missing
//       test.json    ← optional
//
// Each file is an array of objects:
//   [{ "features": [[f32; 11], ...], "label": 0 }, ...]
//
// Turning raw tweet trees into these vectors is the job of an
// upstream dataset builder and is not done here.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::splitter::split_train_val;
use crate::domain::cascade::{CascadeSequence, DatasetName, Split, SplitSequences};
use crate::domain::traits::SequenceSource;

/// Fraction of train kept for training when val.json is absent
const FALLBACK_TRAIN_FRACTION: f64 = 0.8;

/// Seed for the fallback train/val split so every run sees the same split
const FALLBACK_SPLIT_SEED: u64 = 1500;

/// Loads cascades from `{data_dir}/{dataset}/{split}.json`.
pub struct JsonSequenceSource {
    data_dir:    PathBuf,
    /// Drop tweets posted more than this many minutes after the root
    time_cutoff: Option<f32>,
}

impl JsonSequenceSource {
    pub fn new(data_dir: impl Into<PathBuf>, time_cutoff: Option<f32>) -> Self {
        Self { data_dir: data_dir.into(), time_cutoff }
    }

    fn split_path(&self, dataset: DatasetName, split: Split) -> PathBuf {
        self.data_dir
            .join(dataset.as_str())
            .join(format!("{}.json", split.file_stem()))
    }

    /// Read one split, applying the binary-label check and the time cutoff.
    fn read_split(&self, path: &Path) -> Result<Vec<CascadeSequence>> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read split file '{}'", path.display()))?;
        let sequences: Vec<CascadeSequence> = serde_json::from_str(&json)
            .with_context(|| format!("Malformed split file '{}'", path.display()))?;

        for (ix, seq) in sequences.iter().enumerate() {
            if seq.label > 1 {
                bail!(
                    "'{}': cascade {} has label {}, only binary labels are supported",
                    path.display(),
                    ix,
                    seq.label
                );
            }
        }

        Ok(sequences
            .into_iter()
            .map(|seq| apply_time_cutoff(seq, self.time_cutoff))
            .collect())
    }
}

impl SequenceSource for JsonSequenceSource {
    fn load(&self, dataset: DatasetName) -> Result<SplitSequences> {
        let train_path = self.split_path(dataset, Split::Train);
        let train = self.read_split(&train_path)?;
        tracing::info!("Loaded {} training cascades from '{}'", train.len(), train_path.display());

        let val_path = self.split_path(dataset, Split::Val);
        let (train, val) = if val_path.exists() {
            (train, self.read_split(&val_path)?)
        } else {
            tracing::warn!(
                "'{}' not found, holding out {:.0}% of train for validation",
                val_path.display(),
                (1.0 - FALLBACK_TRAIN_FRACTION) * 100.0
            );
            split_train_val(train, FALLBACK_TRAIN_FRACTION, FALLBACK_SPLIT_SEED)
        };

        let test_path = self.split_path(dataset, Split::Test);
        let test = if test_path.exists() {
            self.read_split(&test_path)?
        } else {
            Vec::new()
        };

        tracing::info!(
            "{}: {} train, {} val, {} test cascades",
            dataset,
            train.len(),
            val.len(),
            test.len()
        );
        Ok(SplitSequences { train, val, test })
    }
}

/// Keep only the tweets whose delay (feature 0, minutes) is within the cutoff.
/// Steps without any features are left for the preprocessor to reject.
fn apply_time_cutoff(seq: CascadeSequence, cutoff: Option<f32>) -> CascadeSequence {
    let Some(cutoff) = cutoff else { return seq };
    let features = seq
        .features
        .into_iter()
        .filter(|step| step.first().map_or(true, |&delay| delay <= cutoff))
        .collect();
    CascadeSequence::new(features, seq.label)
}
