// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem side effects of a run:
//
//   checkpoint.rs — checkpoints/{exp}/: model weights
//                   (model.mpk.gz) and train_config.json
//
//   metrics.rs    — logs/{exp}/: step scalars, epoch rows,
//                   and the sweep table + best params
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// CSV/JSON run logs
pub mod metrics;
