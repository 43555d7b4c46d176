// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load the net config            (Layer 6 - infra)
//   Step 2: Load the vocabulary            (Layer 6 - infra)
//   Step 3: Read train / valid / test sets (Layer 4 - data)
//   Step 4: Tokenise into datasets         (Layer 4 - data)
//   Step 5: Save model + run config        (Layer 6 - infra)
//   Step 6: Run the training loop          (Layer 5 - ml)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::{encode_examples, SimNetDataset},
    loader::{PairFileKind, TsvLoader},
};
use crate::domain::{task::TaskMode, traits::ExampleSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    conf::SimNetConf,
    vocab_store::Vocab,
};
use crate::ml::{
    default_device,
    model::SimNetModelConfig,
    trainer::{run_training, TrainData, TrainSummary},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs besides the net config file.
// Serialisable so it is stored next to the checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub config_path:      String,
    pub vocab_path:       String,
    pub train_data_dir:   String,
    pub valid_data_dir:   Option<String>,
    pub test_data_dir:    Option<String>,
    pub output_dir:       String,
    pub init_checkpoint:  Option<String>,
    /// Overrides the net config's task_mode when set
    pub task_mode:        Option<TaskMode>,
    pub batch_size:       usize,
    pub epoch:            usize,
    pub save_steps:       usize,
    pub validation_steps: usize,
    pub do_valid:         bool,
    pub do_test:          bool,
    pub compute_accuracy: bool,
    /// Pairwise decision threshold on (cos + 1) / 2
    pub lamda:            f32,
    pub seed:             Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            config_path:      "config/bow_pairwise.json".to_string(),
            vocab_path:       "data/term2id.dict".to_string(),
            train_data_dir:   "data/train_pairwise_data".to_string(),
            valid_data_dir:   None,
            test_data_dir:    None,
            output_dir:       "model_files".to_string(),
            init_checkpoint:  None,
            task_mode:        None,
            batch_size:       128,
            epoch:            10,
            save_steps:       1000,
            validation_steps: 100,
            do_valid:         false,
            do_test:          false,
            compute_accuracy: false,
            lamda:            0.91,
            seed:             None,
        }
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Net config ────────────────────────────────────────────────
        let mut conf = SimNetConf::load(&cfg.config_path)?;
        if let Some(task_mode) = cfg.task_mode {
            conf = conf.with_task_mode(task_mode)?;
        }
        tracing::info!(
            "Net '{}' with {:?}, task_mode={}",
            conf.net.name(),
            conf.loss,
            conf.task_mode
        );

        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let vocab = Vocab::load(&cfg.vocab_path)?;

        // ── Step 3 + 4: Datasets ──────────────────────────────────────────────
        let train_kind = match conf.task_mode {
            TaskMode::Pairwise  => PairFileKind::PairwiseTrain,
            TaskMode::Pointwise => PairFileKind::Labelled,
        };
        let train = load_dataset(&cfg.train_data_dir, train_kind, &vocab)?;

        let valid = if cfg.do_valid {
            let path = cfg
                .valid_data_dir
                .as_deref()
                .ok_or_else(|| anyhow!("--do-valid needs --valid-data-dir"))?;
            Some(load_dataset(path, PairFileKind::Labelled, &vocab)?)
        } else {
            None
        };

        let test = if cfg.do_test {
            let path = cfg
                .test_data_dir
                .as_deref()
                .ok_or_else(|| anyhow!("--do-test needs --test-data-dir"))?;
            Some(load_dataset(path, PairFileKind::Labelled, &vocab)?)
        } else {
            None
        };

        // ── Step 5: Persist configs for test / infer ──────────────────────────
        let model_cfg = SimNetModelConfig::new(vocab.size(), conf.task_mode, conf.net.clone());
        // checked before this run's config replaces anything on disk
        let init = cfg
            .init_checkpoint
            .as_ref()
            .map(|path| CheckpointManager::resolve_compatible(path, &model_cfg))
            .transpose()?;
        let ckpt_manager = CheckpointManager::new(Path::new(&cfg.output_dir).join(&conf.model_path))?;
        ckpt_manager.save_config(&model_cfg)?;
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 6: Train (Layer 5) ───────────────────────────────────────────
        run_training::<TrainBackend>(
            cfg,
            &conf,
            &model_cfg,
            TrainData { train, valid, test, init },
            &ckpt_manager,
            default_device(),
        )
    }
}

/// Read and tokenise one pair file.
pub fn load_dataset(path: &str, kind: PairFileKind, vocab: &Vocab) -> Result<SimNetDataset> {
    let examples = TsvLoader::new(path, kind).load_all()?;
    Ok(SimNetDataset::new(encode_examples(&examples, vocab)?))
}
