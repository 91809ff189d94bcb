// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the core
// concepts: cascades, dataset splits, hyperparameters.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled tweet cascades and dataset splits
pub mod cascade;

// One point of the hyperparameter grid
pub mod hyper_params;

// Abstractions other layers implement
pub mod traits;
