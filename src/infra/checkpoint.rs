// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights as gzipped named MessagePack
// at full precision.
//
// Layout per experiment:
//   checkpoints/{exp_name}/
//     model.mpk.gz        ← weights at the best rolling accuracy
//     train_config.json   ← full run configuration
//
// The config is needed to rebuild the same architecture
// before loading weights into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::LstmClassifier;

/// The recorder appends `.mpk.gz` to this stem.
const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";

type ModelRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Manages the checkpoint directory of one experiment.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir`, creating it (and parents) when it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record the model's parameters to `{dir}/model.mpk.gz`, replacing
    /// any previous checkpoint.
    pub fn save_model<B: Backend>(&self, model: &LstmClassifier<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);
        ModelRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved checkpoint to '{}'", path.display());
        Ok(())
    }

    /// Load the saved weights into `model`, which must have the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  LstmClassifier<B>,
        device: &B::Device,
    ) -> Result<LstmClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = ModelRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::LstmClassifierConfig;
    use burn::backend::NdArray;

    #[test]
    fn test_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("checkpoints").join("LSTM_default");
        let ckpt = CheckpointManager::new(&dir).unwrap();
        assert!(ckpt.dir().is_dir());
        // existing dir is reused
        assert!(CheckpointManager::new(&dir).is_ok());
    }

    #[test]
    fn test_model_round_trip() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let cfg    = LstmClassifierConfig::new(3, 4, 5);

        let model: LstmClassifier<NdArray> = cfg.init(&device);
        ckpt.save_model(&model).unwrap();

        let input  = Tensor::<NdArray, 3>::ones([2, 4, 3], &device);
        let before: Vec<f32> = model.forward(input.clone()).into_data().to_vec().unwrap();

        let fresh: LstmClassifier<NdArray> = cfg.init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();
        let after: Vec<f32> = loaded.forward(input).into_data().to_vec().unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_weights_file_is_gzipped_msgpack() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let model: LstmClassifier<NdArray> =
            LstmClassifierConfig::new(3, 4, 5).init(&Default::default());
        ckpt.save_model(&model).unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.mpk.gz".to_string()]);
    }

    #[test]
    fn test_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg  = TrainConfig { exp_name: "lstm_h12".into(), ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().exp_name, "lstm_h12");
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let model: LstmClassifier<NdArray> =
            LstmClassifierConfig::new(3, 4, 5).init(&Default::default());
        assert!(ckpt.load_model(model, &Default::default()).is_err());
    }
}
