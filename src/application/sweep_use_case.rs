// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// Grid search over learning rate × batch size × hidden size.
//
//   for lr in lrs                      (outer)
//     for batch_size in batch_sizes
//       for hidden_size in hidden_sizes (inner)
//         fresh loaders, model, optimiser → train → perf
//
// Data is loaded and preprocessed once and shared by all runs.
// Each run gets its own experiment directory
// {exp_name}/{run_name} so checkpoints never collide.
// The best run is the first one reaching the highest perf.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::application::train_use_case::{prepare_data, TrainConfig};
use crate::data::loader::JsonSequenceSource;
use crate::domain::hyper_params::HyperParams;
use crate::domain::traits::SequenceSource;
use crate::infra::metrics::{SweepLog, SweepRow, SweepSummary};
use crate::ml::trainer::train;

// ─── Grid ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub lrs:          Vec<f64>,
    pub batch_sizes:  Vec<usize>,
    pub hidden_sizes: Vec<usize>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            // 10^-1 .. 10^-3
            lrs:          vec![0.1, 0.01, 0.001],
            batch_sizes:  vec![32, 64],
            hidden_sizes: vec![12, 24, 48, 64],
        }
    }
}

impl SweepGrid {
    pub fn total(&self) -> usize {
        self.lrs.len() * self.batch_sizes.len() * self.hidden_sizes.len()
    }

    /// All grid points, lr outermost, hidden size innermost.
    pub fn points(&self) -> Vec<HyperParams> {
        let mut points = Vec::with_capacity(self.total());
        for &lr in &self.lrs {
            for &batch_size in &self.batch_sizes {
                for &hidden_size in &self.hidden_sizes {
                    points.push(HyperParams::new(lr, batch_size, hidden_size));
                }
            }
        }
        points
    }

    pub fn validate(&self) -> Result<()> {
        if self.lrs.is_empty() || self.batch_sizes.is_empty() || self.hidden_sizes.is_empty() {
            bail!("every grid dimension needs at least one value");
        }
        if self.batch_sizes.contains(&0) || self.hidden_sizes.contains(&0) {
            bail!("batch and hidden sizes must be positive");
        }
        if self.lrs.iter().any(|lr| !lr.is_finite() || *lr <= 0.0) {
            bail!("learning rates must be positive");
        }
        Ok(())
    }
}

// ─── Best tracking ────────────────────────────────────────────────────────────
/// Keeps the first grid point with the strictly highest perf.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    max_perf: f64,
    best:     Option<HyperParams>,
}

impl BestTracker {
    pub fn observe(&mut self, hp: HyperParams, perf: f64) -> bool {
        if perf > self.max_perf {
            self.max_perf = perf;
            self.best     = Some(hp);
            true
        } else {
            false
        }
    }

    pub fn max_perf(&self) -> f64 {
        self.max_perf
    }

    pub fn best(&self) -> Option<HyperParams> {
        self.best
    }
}

// ─── SweepUseCase ─────────────────────────────────────────────────────────────
pub struct SweepUseCase {
    config: TrainConfig,
    grid:   SweepGrid,
}

impl SweepUseCase {
    pub fn new(config: TrainConfig, grid: SweepGrid) -> Self {
        Self { config, grid }
    }

    pub fn execute(&self) -> Result<SweepSummary> {
        let source = JsonSequenceSource::new(&self.config.data_dir, self.config.time_cutoff);
        self.execute_with(&source)
    }

    pub fn execute_with(&self, source: &dyn SequenceSource) -> Result<SweepSummary> {
        let base = &self.config;
        self.grid.validate()?;
        base.validate()?;

        let data  = prepare_data(base, source)?;
        let log   = SweepLog::new(base.log_dir())?;
        let total = self.grid.total();
        let mut best = BestTracker::default();

        for (ix, hp) in self.grid.points().into_iter().enumerate() {
            let start = Instant::now();
            let run_cfg = TrainConfig {
                exp_name: format!("{}/{}", base.exp_name, hp.run_name()),
                ..base.with_hyper_params(hp)
            };
            run_cfg.validate()?;

            let outcome = train(&run_cfg, data.train.clone(), data.eval.clone())?;
            let perf    = outcome.max_running_mean;
            let seconds = start.elapsed().as_secs_f64();

            tracing::info!("Done {} / {}, perf is {:.3} ({})", ix + 1, total, perf, hp);
            tracing::info!(
                "It took {:.3}s, we expect the experiment to take {:.3}s overall.",
                seconds,
                total as f64 * seconds
            );

            log.record(&SweepRow { hyper_params: hp, perf, seconds })?;
            best.observe(hp, perf);
        }

        let summary = SweepSummary {
            max_perf:    best.max_perf(),
            best_params: best.best(),
            total_runs:  total,
        };
        match summary.best_params {
            Some(hp) => tracing::info!("max perf is {:.3}, with params: {}", summary.max_perf, hp),
            None     => tracing::warn!("no run beat an accuracy of 0.0"),
        }
        log.write_summary(&summary)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::tests::{toy_config, toy_source};

    #[test]
    fn test_default_grid_has_24_points() {
        let grid = SweepGrid::default();
        assert_eq!(grid.total(), 24);
        assert_eq!(grid.points().len(), 24);
        assert!((grid.lrs[2] - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_iteration_order_lr_outermost() {
        let grid = SweepGrid {
            lrs:          vec![0.1, 0.01],
            batch_sizes:  vec![32, 64],
            hidden_sizes: vec![12, 24],
        };
        let points = grid.points();
        assert_eq!(points[0], HyperParams::new(0.1, 32, 12));
        assert_eq!(points[1], HyperParams::new(0.1, 32, 24));
        assert_eq!(points[2], HyperParams::new(0.1, 64, 12));
        assert_eq!(points[4], HyperParams::new(0.01, 32, 12));
    }

    #[test]
    fn test_empty_dimension_rejected() {
        let grid = SweepGrid { batch_sizes: Vec::new(), ..SweepGrid::default() };
        assert!(grid.validate().is_err());
        assert!(SweepGrid::default().validate().is_ok());
    }

    #[test]
    fn test_ties_keep_the_earliest() {
        let mut best = BestTracker::default();
        assert!(!best.observe(HyperParams::new(0.1, 32, 12), 0.0));
        assert!(best.best().is_none());
        assert!(best.observe(HyperParams::new(0.1, 32, 24), 0.6));
        assert!(!best.observe(HyperParams::new(0.01, 32, 12), 0.6));
        assert!(best.observe(HyperParams::new(0.001, 64, 64), 0.7));
        assert_eq!(best.best(), Some(HyperParams::new(0.001, 64, 64)));
        assert_eq!(best.max_perf(), 0.7);
    }

    #[test]
    fn test_small_sweep_writes_one_dir_per_run() {
        let tmp  = tempfile::tempdir().unwrap();
        let cfg  = toy_config(tmp.path());
        let grid = SweepGrid {
            lrs:          vec![0.01],
            batch_sizes:  vec![2, 4],
            hidden_sizes: vec![4],
        };
        let summary = SweepUseCase::new(cfg.clone(), grid).execute_with(&toy_source(8, 3)).unwrap();

        assert_eq!(summary.total_runs, 2);
        let sweep_csv = std::fs::read_to_string(cfg.log_dir().join("sweep.csv")).unwrap();
        assert_eq!(sweep_csv.lines().count(), 3);
        assert!(cfg.checkpoint_dir().join("lr0.01_bs2_h4").join("train_config.json").exists());
        assert!(cfg.checkpoint_dir().join("lr0.01_bs4_h4").join("train_config.json").exists());
        assert!(cfg.log_dir().join("best.json").exists());
    }
}
