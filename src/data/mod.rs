// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From pre-extracted cascade features to tensor batches:
//
//   {split}.json files
//       │
//       ▼
//   JsonSequenceSource  → reads splits, time cutoff, binary labels
//       │
//       ▼
//   Preprocessor        → truncate / zero-pad to cap_len, standardise
//       │
//       ▼
//   SeqDataset          → implements Burn's Dataset trait
//       │
//       ▼
//   SeqBatcher          → stacks samples into [B, cap_len, F]
//       │
//       ▼
//   DataLoader          → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads cascade splits from JSON files
pub mod loader;

/// Fixed-length truncation/padding and standardisation
pub mod preprocessor;

/// Implements Burn's Dataset trait for padded cascades
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
