// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One run = one model + one Adam optimiser trained for
// num_epochs over the training loader.
//
//   every step      : forward → CE loss → backward → Adam step
//                     log "loss" at global_step
//   every 5 steps   : accuracy on the eval loader (inner backend,
//                     dropout off) → 5-slot rolling window
//                     → checkpoint when the window mean improves
//   every epoch     : mean epoch loss to the log and epochs.csv
//   end of run      : reload the best checkpoint and score it
//
// The run's score is the best rolling-mean accuracy.
//
// Burn notes:
//   - Training uses TrainBackend (Autodiff<NdArray>)
//   - model.valid() returns the model on EvalBackend (NdArray)
//   - argmax(1) returns [batch, 1], flattened before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{SeqBatch, SeqBatcher};
use crate::data::dataset::SeqDataset;
use crate::domain::hyper_params::HyperParams;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger, ScalarWriter};
use crate::ml::model::LstmClassifier;
use crate::ml::tracker::{RollingAccuracy, RunningLoss};

pub type EvalBackend  = NdArray;
pub type TrainBackend = Autodiff<EvalBackend>;

/// Evaluate every this many optimiser steps
pub const EVAL_EVERY: usize = 5;

/// Number of evaluations averaged into the running accuracy
pub const ACCURACY_WINDOW: usize = 5;

/// Summary of one finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub hyper_params:        HyperParams,
    /// Best rolling-mean eval accuracy; 0.0 if never evaluated
    pub max_running_mean:    f64,
    /// Accuracy of the reloaded best checkpoint; None if none was saved
    pub checkpoint_accuracy: Option<f64>,
    pub final_epoch_loss:    f64,
    pub global_steps:        usize,
    pub elapsed:             Duration,
}

/// Train one model as described by `cfg` and return its best running accuracy.
pub fn train(cfg: &TrainConfig, train_dataset: SeqDataset, eval_dataset: SeqDataset) -> Result<RunOutcome> {
    if cfg.batch_size == 0 {
        bail!("batch_size must be at least 1");
    }
    let started = Instant::now();
    let hp      = cfg.hyper_params();
    let device  = NdArrayDevice::default();
    TrainBackend::seed(cfg.seed);

    // ── Run directories ───────────────────────────────────────────────────────
    let log_dir     = cfg.log_dir().join("train");
    let mut scalars = ScalarWriter::new(&log_dir)?;
    let epochs_log  = MetricsLogger::new(&log_dir)?;
    let ckpt        = CheckpointManager::new(cfg.checkpoint_dir())?;
    ckpt.save_config(cfg)?;

    // ── Model + optimiser ─────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    model_cfg.validate()?;
    let mut model: LstmClassifier<TrainBackend> = model_cfg.init(&device);
    let mut optim = AdamConfig::new().init();
    tracing::debug!("Model ready: {} parameters, {}", model.num_params(), hp);

    // ── Loaders ───────────────────────────────────────────────────────────────
    let (train_loader, eval_loader) = build_loaders(cfg, &device, train_dataset, eval_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut global_step      = 0usize;
    let mut accuracies       = RollingAccuracy::new(ACCURACY_WINDOW)?;
    let mut final_epoch_loss = f64::NAN;
    let mut saved_checkpoint = false;

    for epoch in 0..cfg.num_epochs {
        let mut epoch_loss = 0.0f64;
        let mut n_batches  = 0usize;
        let mut running    = RunningLoss::new();

        for (ix, batch) in train_loader.iter().enumerate() {
            let (loss, _) = model.forward_loss(batch.sequences, batch.labels);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(hp.lr, model, grads);

            scalars.add_scalar("loss", loss_val, global_step)?;
            global_step += 1;

            epoch_loss += loss_val;
            n_batches  += 1;
            let running_loss = running.update(loss_val);
            if cfg.verbose {
                tracing::info!("Step {}, running loss: {:.4}", ix + 1, running_loss);
            }

            if global_step % EVAL_EVERY == 0 {
                let valid = model.valid();
                let acc   = evaluate(&valid, eval_loader.as_ref());
                if accuracies.push(acc) {
                    ckpt.save_model(&valid)?;
                    saved_checkpoint = true;
                }
                scalars.add_scalar("Accuracy", acc, global_step)?;
                tracing::debug!(
                    "step {}: accuracy {:.4}, running mean {:.4}",
                    global_step,
                    acc,
                    accuracies.mean()
                );
            }
        }

        final_epoch_loss = if n_batches > 0 { epoch_loss / n_batches as f64 } else { f64::NAN };
        tracing::info!("epoch {} loss: {:.4}", epoch, final_epoch_loss);
        epochs_log.log(&EpochMetrics::new(epoch, final_epoch_loss, accuracies.best()))?;
    }
    scalars.flush()?;
    tracing::debug!("Epoch rows written to '{}'", epochs_log.csv_path().display());

    // ── Best checkpoint ───────────────────────────────────────────────────────
    let checkpoint_accuracy = if saved_checkpoint {
        let best = restore_checkpoint(&ckpt, &device)?;
        let acc  = evaluate(&best, eval_loader.as_ref());
        tracing::info!("Best checkpoint in '{}': accuracy {:.4}", ckpt.dir().display(), acc);
        Some(acc)
    } else {
        None
    };

    Ok(RunOutcome {
        hyper_params: hp,
        max_running_mean: accuracies.best(),
        checkpoint_accuracy,
        final_epoch_loss,
        global_steps: global_step,
        elapsed: started.elapsed(),
    })
}

/// Train and eval loaders for one run.
///
/// The training loader is always single-threaded: burn's multi-threaded
/// loader splits the dataset per worker, which leaves partial batches and
/// an unordered stream. Evaluation only sums hits over every sample, so
/// `num_workers` is applied there.
fn build_loaders(
    cfg:           &TrainConfig,
    device:        &NdArrayDevice,
    train_dataset: SeqDataset,
    eval_dataset:  SeqDataset,
) -> (Arc<dyn DataLoader<SeqBatch<TrainBackend>>>, Arc<dyn DataLoader<SeqBatch<EvalBackend>>>) {
    let train_batcher = SeqBatcher::<TrainBackend>::new(
        device.clone(),
        train_dataset.cap_len(),
        train_dataset.num_features(),
    );
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train_dataset);

    let eval_batcher = SeqBatcher::<EvalBackend>::new(
        device.clone(),
        eval_dataset.cap_len(),
        eval_dataset.num_features(),
    );
    let mut eval_builder = DataLoaderBuilder::new(eval_batcher).batch_size(cfg.batch_size);
    if cfg.num_workers > 0 {
        eval_builder = eval_builder.num_workers(cfg.num_workers);
    }
    (train_loader, eval_builder.build(eval_dataset))
}

/// Rebuild the run's architecture from its saved config and load the best weights.
pub fn restore_checkpoint(
    ckpt:   &CheckpointManager,
    device: &NdArrayDevice,
) -> Result<LstmClassifier<EvalBackend>> {
    let cfg = ckpt.load_config()?;
    let model: LstmClassifier<EvalBackend> = cfg.model_config().init(device);
    ckpt.load_model(model, device)
}

/// Fraction of correctly classified samples; 0.0 for an empty loader.
pub fn evaluate<B: Backend>(model: &LstmClassifier<B>, loader: &dyn DataLoader<SeqBatch<B>>) -> f64 {
    let mut correct   = 0usize;
    let mut n_samples = 0usize;

    for batch in loader.iter() {
        let pred = model.forward(batch.sequences).argmax(1).flatten::<1>(0, 1);
        n_samples += batch.labels.dims()[0];
        let hits: i64 = pred.equal(batch.labels).int().sum().into_scalar().elem::<i64>();
        correct += hits as usize;
    }

    if n_samples == 0 { 0.0 } else { correct as f64 / n_samples as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SeqSample;

    fn separable(n: usize, cap_len: usize, num_features: usize) -> SeqDataset {
        let samples = (0..n)
            .map(|i| {
                let label = (i % 2) as u8;
                let value = if label == 1 { 1.0 } else { -1.0 };
                SeqSample { sequence: vec![value; cap_len * num_features], label }
            })
            .collect();
        SeqDataset::new(samples, cap_len, num_features)
    }

    fn config(root: &std::path::Path) -> TrainConfig {
        TrainConfig {
            num_epochs:      5,
            num_lstm_layers: 1,
            hidden_size:     8,
            batch_size:      4,
            cap_len:         3,
            num_features:    2,
            dropout:         0.0,
            lr:              0.05,
            num_workers:     0,
            logs_dir:        root.join("logs"),
            checkpoints_dir: root.join("checkpoints"),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_step_count_and_eval_cadence() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let out = train(&cfg, separable(8, 3, 2), separable(8, 3, 2)).unwrap();

        // 8 samples / batch 4 = 2 steps per epoch
        assert_eq!(out.global_steps, 10);
        assert!(out.final_epoch_loss.is_finite());

        let scalars = std::fs::read_to_string(cfg.log_dir().join("train").join("scalars.csv")).unwrap();
        assert_eq!(scalars.lines().filter(|l| l.starts_with("loss,")).count(), 10);
        assert_eq!(scalars.lines().filter(|l| l.starts_with("Accuracy,")).count(), 2);
    }

    #[test]
    fn test_learns_separable_data() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { num_epochs: 40, ..config(tmp.path()) };
        let out = train(&cfg, separable(8, 3, 2), separable(8, 3, 2)).unwrap();

        // 16 evaluations; the 5-slot mean tops out at 1.0 once all slots are perfect
        assert!(out.max_running_mean > 0.5, "perf {}", out.max_running_mean);
        assert!(cfg.checkpoint_dir().join("model.mpk.gz").exists());
        let acc = out.checkpoint_accuracy.expect("a checkpoint was saved");
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_worker_threads_keep_full_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { num_workers: 3, ..config(tmp.path()) };
        let out = train(&cfg, separable(8, 3, 2), separable(8, 3, 2)).unwrap();

        // 5 epochs * ceil(8 / 4)
        assert_eq!(out.global_steps, 10);
        let scalars = std::fs::read_to_string(cfg.log_dir().join("train").join("scalars.csv")).unwrap();
        assert_eq!(scalars.lines().filter(|l| l.starts_with("Accuracy,")).count(), 2);
    }

    #[test]
    fn test_train_loader_batches_ignore_num_workers() {
        let cfg = TrainConfig { num_workers: 3, ..config(std::path::Path::new(".")) };
        let (train_loader, eval_loader) =
            build_loaders(&cfg, &NdArrayDevice::default(), separable(10, 3, 2), separable(10, 3, 2));

        let sizes: Vec<usize> = train_loader.iter().map(|b| b.labels.dims()[0]).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        let eval_total: usize = eval_loader.iter().map(|b| b.labels.dims()[0]).sum();
        assert_eq!(eval_total, 10);
    }

    #[test]
    fn test_eval_workers_do_not_change_accuracy() {
        let device = NdArrayDevice::default();
        let cfg    = config(std::path::Path::new("."));
        let model: LstmClassifier<EvalBackend> = cfg.model_config().init(&device);

        let (_, single) = build_loaders(&cfg, &device, separable(9, 3, 2), separable(9, 3, 2));
        let threaded_cfg = TrainConfig { num_workers: 3, ..cfg.clone() };
        let (_, threaded) = build_loaders(&threaded_cfg, &device, separable(9, 3, 2), separable(9, 3, 2));

        assert_eq!(evaluate(&model, single.as_ref()), evaluate(&model, threaded.as_ref()));
    }

    #[test]
    fn test_restored_checkpoint_scores_like_the_saved_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let cfg    = config(tmp.path());
        let device = NdArrayDevice::default();
        let ckpt   = CheckpointManager::new(cfg.checkpoint_dir()).unwrap();
        ckpt.save_config(&cfg).unwrap();

        let model: LstmClassifier<EvalBackend> = cfg.model_config().init(&device);
        ckpt.save_model(&model).unwrap();
        let restored = restore_checkpoint(&ckpt, &device).unwrap();

        let (_, loader) = build_loaders(&cfg, &device, separable(8, 3, 2), separable(8, 3, 2));
        assert_eq!(evaluate(&model, loader.as_ref()), evaluate(&restored, loader.as_ref()));
    }

    #[test]
    fn test_no_evaluation_means_no_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { num_epochs: 1, ..config(tmp.path()) };
        let out = train(&cfg, separable(8, 3, 2), separable(8, 3, 2)).unwrap();
        assert_eq!(out.global_steps, 2);
        assert_eq!(out.max_running_mean, 0.0);
        assert!(out.checkpoint_accuracy.is_none());
    }

    #[test]
    fn test_evaluate_empty_loader_is_zero() {
        let device = NdArrayDevice::default();
        let model: LstmClassifier<EvalBackend> = config(std::path::Path::new(".")).model_config().init(&device);
        let loader = DataLoaderBuilder::new(SeqBatcher::<EvalBackend>::new(device, 3, 2))
            .batch_size(4)
            .build(SeqDataset::new(Vec::new(), 3, 2));
        assert_eq!(evaluate(&model, loader.as_ref()), 0.0);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { batch_size: 0, ..config(tmp.path()) };
        assert!(train(&cfg, separable(4, 3, 2), separable(4, 3, 2)).is_err());
    }
}
