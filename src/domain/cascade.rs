// ============================================================
// Layer 3 — Cascade Domain Types
// ============================================================
// A propagation cascade is the time-ordered list of tweets that
// spread one story. Each tweet is described by a small vector
// of numeric features (delay since the root tweet, user stats,
// ...). A cascade carries one binary label: rumour or not.
//
//   CascadeSequence
//     ├── features: [[f32; num_features]; len]   (len varies)
//     └── label:    0 | 1
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Number of per-tweet features produced by the dataset builder.
pub const NUM_FEATURES: usize = 11;

/// Which benchmark the cascades come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetName {
    Twitter15,
    Twitter16,
}

impl DatasetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::Twitter15 => "twitter15",
            DatasetName::Twitter16 => "twitter16",
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "twitter15" => Ok(DatasetName::Twitter15),
            "twitter16" => Ok(DatasetName::Twitter16),
            other => bail!("unknown dataset '{other}', expected twitter15 or twitter16"),
        }
    }
}

/// One of the three partitions a source provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val   => "val",
            Split::Test  => "test",
        }
    }
}

/// A single labelled cascade of variable length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeSequence {
    /// One feature vector per tweet, in posting order
    pub features: Vec<Vec<f32>>,

    /// Binary class: 0 = non-rumour, 1 = rumour
    pub label: u8,
}

impl CascadeSequence {
    pub fn new(features: Vec<Vec<f32>>, label: u8) -> Self {
        Self { features, label }
    }

    /// Number of tweets in the cascade
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// True when every step has exactly `num_features` values.
    pub fn has_width(&self, num_features: usize) -> bool {
        self.features.iter().all(|step| step.len() == num_features)
    }
}

/// Train / validation / test partitions of one dataset.
#[derive(Debug, Clone, Default)]
pub struct SplitSequences {
    pub train: Vec<CascadeSequence>,
    pub val:   Vec<CascadeSequence>,
    pub test:  Vec<CascadeSequence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_round_trips_through_str() {
        assert_eq!("twitter16".parse::<DatasetName>().unwrap(), DatasetName::Twitter16);
        assert_eq!(DatasetName::Twitter15.to_string(), "twitter15");
        assert!("pheme".parse::<DatasetName>().is_err());
    }

    #[test]
    fn test_width_check() {
        let seq = CascadeSequence::new(vec![vec![0.0; 3], vec![1.0; 3]], 1);
        assert!(seq.has_width(3));
        assert!(!seq.has_width(4));
        assert_eq!(seq.len(), 2);
    }
}
