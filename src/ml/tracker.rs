// ============================================================
// Layer 5 — Rolling Training Statistics
// ============================================================
// Two small accumulators used by the training loop:
//
//   RunningLoss     — exponential average of batch losses,
//                     running = 0.5 * running + 0.5 * loss
//   RollingAccuracy — last k evaluation accuracies (FIFO),
//                     zero-initialised, plus the best mean seen
//
// The window starts full of zeros, so the first k-1
// evaluations are pulled down towards 0.

use anyhow::{bail, Result};
use std::collections::VecDeque;

/// Exponential moving average with factor 0.5, reset every epoch.
#[derive(Debug, Clone, Default)]
pub struct RunningLoss {
    value: Option<f64>,
}

impl RunningLoss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one batch loss and return the new running value.
    pub fn update(&mut self, loss: f64) -> f64 {
        let next = match self.value {
            None          => loss,
            Some(running) => running * 0.5 + loss * 0.5,
        };
        self.value = Some(next);
        next
    }
}

/// Fixed-size window of recent accuracies.
#[derive(Debug, Clone)]
pub struct RollingAccuracy {
    window: VecDeque<f64>,
    best:   f64,
}

impl RollingAccuracy {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            bail!("accuracy window must hold at least one value");
        }
        Ok(Self {
            window: std::iter::repeat(0.0).take(size).collect(),
            best:   0.0,
        })
    }

    /// Push an accuracy, evicting the oldest. Returns true when the
    /// window mean beats every previous mean.
    pub fn push(&mut self, accuracy: f64) -> bool {
        self.window.pop_front();
        self.window.push_back(accuracy);

        let mean = self.mean();
        if mean > self.best {
            self.best = mean;
            true
        } else {
            false
        }
    }

    pub fn mean(&self) -> f64 {
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Highest window mean observed so far (0.0 before any improvement).
    pub fn best(&self) -> f64 {
        self.best
    }
}
