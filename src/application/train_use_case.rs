// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// One training run with a single hyperparameter setting:
//
//   Step 1: Load cascades              (Layer 4 - data)
//   Step 2: Pick the training split    (debug → val)
//   Step 3: Pad/truncate + standardise (Layer 4 - data)
//   Step 4: Pick the evaluation set    (test_on_train → train)
//   Step 5: Train with periodic eval   (Layer 5 - ml)
//
// The sweep reuses steps 1-4 once and repeats step 5 per
// grid point.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::dataset::{seq_data_to_dataset, SeqDataset};
use crate::data::loader::JsonSequenceSource;
use crate::domain::cascade::{DatasetName, NUM_FEATURES};
use crate::domain::hyper_params::HyperParams;
use crate::domain::traits::SequenceSource;
use crate::ml::model::LstmClassifierConfig;
use crate::ml::trainer::{train, RunOutcome};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a run. Serialisable so each checkpoint dir
// records exactly what produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:           DatasetName,
    pub data_dir:          PathBuf,
    pub lr:                f64,
    pub num_epochs:        usize,
    pub num_lstm_layers:   usize,
    /// Head depth including the output layer
    pub num_linear_layers: usize,
    pub hidden_size:       usize,
    pub dropout:           f64,
    pub batch_size:        usize,
    /// Train on the validation split
    pub debug:             bool,
    /// Evaluate on the training loader instead of validation
    pub test_on_train:     bool,
    pub verbose:           bool,
    pub cap_len:           usize,
    pub exp_name:          String,
    pub num_features:      usize,
    pub time_cutoff:       Option<f32>,
    pub standardize:       bool,
    pub num_workers:       usize,
    pub seed:              u64,
    pub logs_dir:          PathBuf,
    pub checkpoints_dir:   PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:           DatasetName::Twitter15,
            data_dir:          PathBuf::from("data"),
            lr:                0.01,
            num_epochs:        150,
            num_lstm_layers:   2,
            num_linear_layers: 1,
            hidden_size:       12,
            dropout:           0.5,
            batch_size:        32,
            debug:             true,
            test_on_train:     true,
            verbose:           false,
            cap_len:           40,
            exp_name:          "LSTM_default".to_string(),
            num_features:      NUM_FEATURES,
            time_cutoff:       Some(1500.0),
            standardize:       true,
            num_workers:       3,
            seed:              42,
            logs_dir:          PathBuf::from("logs"),
            checkpoints_dir:   PathBuf::from("checkpoints"),
        }
    }
}

impl TrainConfig {
    pub fn hyper_params(&self) -> HyperParams {
        HyperParams::new(self.lr, self.batch_size, self.hidden_size)
    }

    /// Copy of this config with one grid point applied.
    pub fn with_hyper_params(&self, hp: HyperParams) -> Self {
        Self {
            lr:          hp.lr,
            batch_size:  hp.batch_size,
            hidden_size: hp.hidden_size,
            ..self.clone()
        }
    }

    pub fn model_config(&self) -> LstmClassifierConfig {
        LstmClassifierConfig::new(self.num_features, self.cap_len, self.hidden_size)
            .with_n_lstm_layers(self.num_lstm_layers)
            .with_n_linear_layers_hidden(self.num_linear_layers.saturating_sub(1))
            .with_dropout(self.dropout)
    }

    /// logs/{exp_name}
    pub fn log_dir(&self) -> PathBuf {
        self.logs_dir.join(&self.exp_name)
    }

    /// checkpoints/{exp_name}
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoints_dir.join(&self.exp_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.cap_len == 0 {
            bail!("cap_len must be at least 1");
        }
        if self.exp_name.is_empty() {
            bail!("exp_name must not be empty");
        }
        self.model_config().validate()
    }
}

// ─── Prepared data ───────────────────────────────────────────────────────────
/// Datasets shared by every run of a sweep.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train:             SeqDataset,
    pub eval:              SeqDataset,
    pub baseline_accuracy: f64,
}

/// Load, convert to fixed length, and choose the train/eval datasets.
pub fn prepare_data(cfg: &TrainConfig, source: &dyn SequenceSource) -> Result<PreparedData> {
    let splits = source.load(cfg.dataset)?;
    tracing::debug!("{} test cascades held out", splits.test.len());

    let train_raw = if cfg.debug {
        tracing::info!("Debug mode: training on the validation split");
        &splits.val
    } else {
        &splits.train
    };

    let train = seq_data_to_dataset(train_raw, cfg.cap_len, cfg.num_features, cfg.standardize)?;
    let val   = seq_data_to_dataset(&splits.val, cfg.cap_len, cfg.num_features, cfg.standardize)?;
    if train.labels().is_empty() {
        bail!("training set is empty after preprocessing");
    }

    let baseline_accuracy = train.baseline_accuracy();
    tracing::info!("Baseline accuracy on train is: {:.2}", baseline_accuracy);

    let eval = if cfg.test_on_train { train.clone() } else { val };
    Ok(PreparedData { train, eval, baseline_accuracy })
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunOutcome> {
        let source = JsonSequenceSource::new(&self.config.data_dir, self.config.time_cutoff);
        self.execute_with(&source)
    }

    /// Run against any sequence source.
    pub fn execute_with(&self, source: &dyn SequenceSource) -> Result<RunOutcome> {
        let cfg = &self.config;
        cfg.validate()?;
        let data = prepare_data(cfg, source)?;
        let outcome = train(cfg, data.train, data.eval)?;
        tracing::info!(
            "Run {} finished: perf {:.3} (baseline {:.3})",
            outcome.hyper_params,
            outcome.max_running_mean,
            data.baseline_accuracy
        );
        Ok(outcome)
    }
}
