// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to Layer 2.
//
//   1. `train` — one run, prints its score
//   2. `sweep` — grid search, prints the best hyperparameters
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs, SweepArgs};

use crate::application::train_use_case::TrainConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cascade_sweep",
    version = "0.1.0",
    about = "Train LSTM rumour classifiers on tweet cascades and grid-search their hyperparameters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Sweep(args) => run_sweep(args),
        }
    }
}

fn run_train(args: RunArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let cfg = TrainConfig::try_from(args)?;
    tracing::info!("Training on {} as experiment '{}'", cfg.dataset, cfg.exp_name);

    let outcome = TrainUseCase::new(cfg).execute()?;
    println!(
        "perf is {:.3} ({}), {} steps in {:.1}s, final epoch loss {:.4}",
        outcome.max_running_mean,
        outcome.hyper_params,
        outcome.global_steps,
        outcome.elapsed.as_secs_f64(),
        outcome.final_epoch_loss
    );
    if let Some(acc) = outcome.checkpoint_accuracy {
        println!("best checkpoint accuracy is {acc:.3}");
    }
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    use crate::application::sweep_use_case::SweepUseCase;

    let grid = args.grid();
    let cfg  = TrainConfig::try_from(args.run)?;
    tracing::info!(
        "Sweeping {} configurations on {} as experiment '{}'",
        grid.total(),
        cfg.dataset,
        cfg.exp_name
    );

    let summary = SweepUseCase::new(cfg, grid).execute()?;
    println!("max perf is {:.3}, with params:", summary.max_perf);
    match summary.best_params {
        Some(hp) => println!("{hp}"),
        None     => println!("none"),
    }
    Ok(())
}
