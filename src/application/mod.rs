// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers; no tensor code and no
// printing here.
//
//   train_use_case — one run with fixed hyperparameters
//   sweep_use_case — grid search repeating that run
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// A single training run and the shared data preparation
pub mod train_use_case;

// The hyperparameter grid search
pub mod sweep_use_case;
