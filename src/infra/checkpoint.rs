// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores SimNet weights using Burn's CompactRecorder
// (named MessagePack, half precision).
//
// Directory layout, one directory per model ({output_dir}/{model_path}):
//
//   bow_pairwise/
//     model_step_1000.mpk      ← weights after global step 1000
//     model_step_2000.mpk
//     ...
//     latest_step.json         ← step of the newest checkpoint
//     simnet_config.json       ← architecture needed to rebuild the model
//     train_config.json        ← settings of the run that wrote it
//     metrics.csv              ← per-epoch training metrics
//
// A checkpoint reference given on the command line can be
//   - a model directory      → its latest step is used
//   - a record path, with or without the .mpk extension

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{SimNetModel, SimNetModelConfig};

/// File extension CompactRecorder appends to a record path
const RECORD_EXTENSION: &str = "mpk";
const LATEST_FILE: &str = "latest_step.json";
const CONFIG_FILE: &str = "simnet_config.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

/// A resolved checkpoint reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRef {
    /// Record path without extension, as the recorder expects it
    pub record: PathBuf,
    /// Directory holding simnet_config.json
    pub dir: PathBuf,
}

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights as model_step_{step}.mpk and move the latest pointer.
    pub fn save_model<B: Backend>(&self, model: &SimNetModel<B>, step: usize) -> Result<PathBuf> {
        let path = self.dir.join(format!("model_step_{step}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_FILE);
        fs::write(&latest_path, serde_json::to_string(&step)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: step {}", step);
        Ok(path)
    }

    /// Must run before training so test and infer can rebuild the model.
    pub fn save_config(&self, cfg: &SimNetModelConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Keep the run's settings next to its checkpoints.
    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    /// Turn a user supplied checkpoint path into a record + config location.
    pub fn resolve(reference: impl AsRef<Path>) -> Result<CheckpointRef> {
        let reference = reference.as_ref();

        if reference.is_dir() {
            let step = latest_step(reference)?;
            return Ok(CheckpointRef {
                record: reference.join(format!("model_step_{step}")),
                dir:    reference.to_path_buf(),
            });
        }

        let record = match reference.extension() {
            Some(ext) if ext == RECORD_EXTENSION => reference.with_extension(""),
            _ => reference.to_path_buf(),
        };
        let dir    = record
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(CheckpointRef { record, dir })
    }

    pub fn load_config(checkpoint: &CheckpointRef) -> Result<SimNetModelConfig> {
        let path = checkpoint.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read model config from '{}'. Was this model trained with 'train'?",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config '{}'", path.display()))
    }

    /// Resolve a warm-start checkpoint and make sure it was trained with
    /// the same architecture, task mode and vocabulary size.
    pub fn resolve_compatible(
        reference: impl AsRef<Path>,
        expected:  &SimNetModelConfig,
    ) -> Result<CheckpointRef> {
        let checkpoint = Self::resolve(reference)?;
        let found      = Self::load_config(&checkpoint)?;

        if found.task_mode != expected.task_mode {
            bail!(
                "checkpoint '{}' is a {} model, this run is {}",
                checkpoint.record.display(), found.task_mode, expected.task_mode
            );
        }
        if found.net != expected.net {
            bail!(
                "checkpoint '{}' has net {:?}, this run uses {:?}",
                checkpoint.record.display(), found.net, expected.net
            );
        }
        if found.vocab_size != expected.vocab_size {
            bail!(
                "checkpoint '{}' was trained with {} vocabulary ids, this run has {}",
                checkpoint.record.display(), found.vocab_size, expected.vocab_size
            );
        }
        Ok(checkpoint)
    }

    /// Restore weights into a model of the matching architecture.
    pub fn load_model<B: Backend>(
        checkpoint: &CheckpointRef,
        model:      SimNetModel<B>,
        device:     &B::Device,
    ) -> Result<SimNetModel<B>> {
        tracing::info!("Loading checkpoint '{}'", checkpoint.record.display());

        let record = CompactRecorder::new()
            .load(checkpoint.record.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'", checkpoint.record.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Rebuild the model described by the checkpoint's config and load its weights.
    pub fn restore<B: Backend>(
        reference: impl AsRef<Path>,
        device:    &B::Device,
    ) -> Result<(SimNetModelConfig, SimNetModel<B>)> {
        let checkpoint = Self::resolve(reference)?;
        let cfg   = Self::load_config(&checkpoint)?;
        let model = Self::load_model(&checkpoint, cfg.init(device), device)?;
        Ok((cfg, model))
    }
}

fn latest_step(dir: &Path) -> Result<usize> {
    let path = dir.join(LATEST_FILE);
    let s = fs::read_to_string(&path).with_context(|| {
        format!("Cannot find '{}'. Have you run 'train' first?", path.display())
    })?;
    Ok(serde_json::from_str::<usize>(&s)?)
}
