// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer never parses raw tweet data itself.
// It asks a SequenceSource for ready-made feature sequences,
// so the dataset builder can be swapped without touching the
// training code.
//
// Implementations:
//   - JsonSequenceSource → pre-extracted JSON splits on disk
//   - InMemorySource     → fixed vectors, used by the use-case tests
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::cascade::{DatasetName, SplitSequences};

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce the train/val/test cascades of a dataset.
pub trait SequenceSource {
    /// Load every split of `dataset`. Only binary labels are allowed.
    fn load(&self, dataset: DatasetName) -> Result<SplitSequences>;
}
