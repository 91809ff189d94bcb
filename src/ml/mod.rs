// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every piece of Burn model and optimiser code lives here.
//
//   model.rs    — stacked LSTM + mean pooling + MLP head
//   tracker.rs  — running loss and rolling accuracy window
//   trainer.rs  — training loop with periodic evaluation
//                 and checkpointing
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

/// LSTM sequence classifier
pub mod model;

/// Running loss and rolling accuracy statistics
pub mod tracker;

/// Training loop with evaluation every few steps
pub mod trainer;
