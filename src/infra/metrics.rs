// ============================================================
// Layer 6 — Run Logs
// ============================================================
// Plain CSV/JSON files under logs/ for every experiment:
//
//   logs/{exp_name}/train/
//     scalars.csv   ← tag,step,value   (loss every step, Accuracy every eval)
//     epochs.csv    ← epoch,loss,best_running_mean
//   logs/{sweep_name}/
//     sweep.csv     ← one row per grid point
//     best.json     ← winning hyperparameters
//
// Files are appended to; headers are written once, so re-running
// an experiment extends its history.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::hyper_params::HyperParams;

/// Open `path` for appending, writing `header` first if the file is new.
fn open_csv(path: &Path, header: &str) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create log dir '{}'", parent.display()))?;
    }
    let is_new = !path.exists();
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    if is_new {
        writeln!(f, "{header}")?;
        tracing::debug!("Created log '{}'", path.display());
    }
    Ok(f)
}

// ─── ScalarWriter ─────────────────────────────────────────────────────────────
/// Tagged scalar series, one row per `add_scalar` call.
pub struct ScalarWriter {
    out:  BufWriter<File>,
    path: PathBuf,
}

impl ScalarWriter {
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let path = log_dir.as_ref().join("scalars.csv");
        let file = open_csv(&path, "tag,step,value")?;
        Ok(Self { out: BufWriter::new(file), path })
    }

    pub fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        writeln!(self.out, "{tag},{step},{value:.6}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.path.display()))
    }
}

// ─── Epoch metrics ────────────────────────────────────────────────────────────
/// One row of per-epoch training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Mean training loss over the epoch's batches
    pub loss: f64,

    /// Best rolling-mean accuracy reached so far in this run
    pub best_running_mean: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, best_running_mean: f64) -> Self {
        Self { epoch, loss, best_running_mean }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let csv_path = log_dir.as_ref().join("epochs.csv");
        open_csv(&csv_path, "epoch,loss,best_running_mean")?;
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.loss, m.best_running_mean)?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Sweep log ────────────────────────────────────────────────────────────────
/// Result of one grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRow {
    pub hyper_params: HyperParams,
    pub perf:         f64,
    pub seconds:      f64,
}

/// Winner of a sweep, written to best.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub max_perf:    f64,
    pub best_params: Option<HyperParams>,
    pub total_runs:  usize,
}

pub struct SweepLog {
    dir: PathBuf,
}

impl SweepLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        open_csv(&dir.join("sweep.csv"), "lr,batch_size,hidden_size,perf,seconds")?;
        Ok(Self { dir })
    }

    pub fn record(&self, row: &SweepRow) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(self.dir.join("sweep.csv"))?;
        let hp = &row.hyper_params;
        writeln!(
            f,
            "{},{},{},{:.6},{:.3}",
            hp.lr, hp.batch_size, hp.hidden_size, row.perf, row.seconds
        )?;
        Ok(())
    }

    pub fn write_summary(&self, summary: &SweepSummary) -> Result<()> {
        let path = self.dir.join("best.json");
        fs::write(&path, serde_json::to_string_pretty(summary)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_header_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs").join("exp").join("train");
        {
            let mut w = ScalarWriter::new(&dir).unwrap();
            w.add_scalar("loss", 0.5, 0).unwrap();
            w.flush().unwrap();
        }
        {
            let mut w = ScalarWriter::new(&dir).unwrap();
            w.add_scalar("Accuracy", 1.0, 5).unwrap();
            w.flush().unwrap();
        }
        let text = fs::read_to_string(dir.join("scalars.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["tag,step,value", "loss,0,0.500000", "Accuracy,5,1.000000"]);
    }

    #[test]
    fn test_epoch_rows_append() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(0, 0.7, 0.1)).unwrap();
        logger.log(&EpochMetrics::new(1, 0.6, 0.3)).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("1,0.600000,0.300000\n"));
    }

    #[test]
    fn test_sweep_log_and_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SweepLog::new(tmp.path()).unwrap();
        let hp  = HyperParams::new(0.01, 32, 12);
        log.record(&SweepRow { hyper_params: hp, perf: 0.75, seconds: 1.5 }).unwrap();
        log.write_summary(&SweepSummary { max_perf: 0.75, best_params: Some(hp), total_runs: 1 })
            .unwrap();

        let csv = fs::read_to_string(tmp.path().join("sweep.csv")).unwrap();
        assert!(csv.contains("0.01,32,12,0.750000,1.500"));
        let best: SweepSummary =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("best.json")).unwrap()).unwrap();
        assert_eq!(best.best_params, Some(hp));
    }
}
