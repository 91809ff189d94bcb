// ============================================================
// Layer 3 — Hyperparameter Grid Point
// ============================================================
// The three knobs the sweep varies. Everything else (epochs,
// layers, dropout, cap length) is fixed for the whole sweep.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the learning-rate × batch-size × hidden-size grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub lr:          f64,
    pub batch_size:  usize,
    pub hidden_size: usize,
}

impl HyperParams {
    pub fn new(lr: f64, batch_size: usize, hidden_size: usize) -> Self {
        Self { lr, batch_size, hidden_size }
    }

    /// Directory-safe name, e.g. `lr0.01_bs32_h12`.
    pub fn run_name(&self) -> String {
        format!("lr{}_bs{}_h{}", self.lr, self.batch_size, self.hidden_size)
    }
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lr={} batch_size={} hidden_size={}",
            self.lr, self.batch_size, self.hidden_size
        )
    }
}
