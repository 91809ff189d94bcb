// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands sharing one flag set:
//   train — one run with --lr / --batch-size / --hidden-size
//   sweep — grid search over --lrs × --batch-sizes × --hidden-sizes
//
// Switches such as --debug and --verbose take 0 or 1.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::sweep_use_case::SweepGrid;
use crate::application::train_use_case::TrainConfig;
use crate::domain::cascade::{DatasetName, NUM_FEATURES};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a single LSTM classifier
    Train(RunArgs),

    /// Grid search over learning rate, batch size and hidden size
    Sweep(SweepArgs),
}

/// Flags shared by `train` and `sweep`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Training dataset
    #[arg(value_parser = ["twitter15", "twitter16"], default_value = "twitter15")]
    pub dataset: String,

    /// Directory holding {dataset}/{train,val,test}.json
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Number of epochs
    #[arg(long, default_value_t = 150)]
    pub num_epochs: usize,

    /// Number of lstm layers
    #[arg(long, default_value_t = 2)]
    pub num_lstm_layers: usize,

    /// Number of mlp layers
    #[arg(long, default_value_t = 1)]
    pub num_linear_layers: usize,

    /// Hidden size
    #[arg(long, default_value_t = 12)]
    pub hidden_size: usize,

    /// Dropout between stacked LSTM layers
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Batch size
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// In debugging, we train on val
    #[arg(long, default_value_t = 1)]
    pub debug: u8,

    /// Evaluate on the training set (overfit check)
    #[arg(long, default_value_t = 1)]
    pub test_on_train: u8,

    /// If verbose, log running loss at every step
    #[arg(long, default_value_t = 0)]
    pub verbose: u8,

    /// Cap on the length of the sequences passed to the LSTM
    #[arg(long, default_value_t = 40)]
    pub cap_len: usize,

    /// Name of experiment; different names log and checkpoint to different dirs
    #[arg(long, default_value = "LSTM_default")]
    pub exp_name: String,

    /// Features per tweet
    #[arg(long, default_value_t = NUM_FEATURES)]
    pub num_features: usize,

    /// Drop tweets later than this many minutes after the source tweet (negative disables)
    #[arg(long, default_value_t = 1500.0, allow_negative_numbers = true)]
    pub time_cutoff: f32,

    /// Skip per-feature standardisation
    #[arg(long)]
    pub no_standardize: bool,

    /// Worker threads for the evaluation loader
    #[arg(long, default_value_t = 3)]
    pub num_workers: usize,

    /// Seed for weights and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value = "logs")]
    pub logs_dir: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoints_dir: PathBuf,
}

/// Convert CLI args into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl TryFrom<RunArgs> for TrainConfig {
    type Error = anyhow::Error;

    fn try_from(a: RunArgs) -> anyhow::Result<Self> {
        Ok(TrainConfig {
            dataset:           a.dataset.parse::<DatasetName>()?,
            data_dir:          a.data_dir,
            lr:                a.lr,
            num_epochs:        a.num_epochs,
            num_lstm_layers:   a.num_lstm_layers,
            num_linear_layers: a.num_linear_layers,
            hidden_size:       a.hidden_size,
            dropout:           a.dropout,
            batch_size:        a.batch_size,
            debug:             a.debug != 0,
            test_on_train:     a.test_on_train != 0,
            verbose:           a.verbose != 0,
            cap_len:           a.cap_len,
            exp_name:          a.exp_name,
            num_features:      a.num_features,
            time_cutoff:       (a.time_cutoff >= 0.0).then_some(a.time_cutoff),
            standardize:       !a.no_standardize,
            num_workers:       a.num_workers,
            seed:              a.seed,
            logs_dir:          a.logs_dir,
            checkpoints_dir:   a.checkpoints_dir,
        })
    }
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Learning rates to try
    #[arg(long, value_delimiter = ',', default_values_t = [0.1, 0.01, 0.001])]
    pub lrs: Vec<f64>,

    /// Batch sizes to try
    #[arg(long, value_delimiter = ',', default_values_t = [32, 64])]
    pub batch_sizes: Vec<usize>,

    /// Hidden sizes to try
    #[arg(long, value_delimiter = ',', default_values_t = [12, 24, 48, 64])]
    pub hidden_sizes: Vec<usize>,
}

impl SweepArgs {
    pub fn grid(&self) -> SweepGrid {
        SweepGrid {
            lrs:          self.lrs.clone(),
            batch_sizes:  self.batch_sizes.clone(),
            hidden_sizes: self.hidden_sizes.clone(),
        }
    }
}
