// ============================================================
// Layer 2 — InferUseCase
// ============================================================
// Scores unlabelled "query \t title" pairs with a trained
// checkpoint and writes "<input line>\t<prediction>" per pair.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::{check_vocab, write_lines};
use crate::data::{dataset::encode_examples, loader::{PairFileKind, TsvLoader}};
use crate::domain::traits::ExampleSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::Vocab};
use crate::ml::{
    default_device,
    predictor::{format_prediction, predict},
    InferBackend,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferConfig {
    pub vocab_path:        String,
    pub infer_data_dir:    String,
    pub init_checkpoint:   String,
    pub batch_size:        usize,
    pub infer_result_path: String,
}

pub struct InferUseCase {
    config: InferConfig,
}

impl InferUseCase {
    pub fn new(config: InferConfig) -> Self {
        Self { config }
    }

    /// Returns the path of the written result file.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg    = &self.config;
        let device = default_device();

        let (model_cfg, model) =
            CheckpointManager::restore::<InferBackend>(&cfg.init_checkpoint, &device)?;

        let vocab    = Vocab::load(&cfg.vocab_path)?;
        check_vocab(&vocab, &model_cfg)?;
        let examples = TsvLoader::new(&cfg.infer_data_dir, PairFileKind::Unlabelled).load_all()?;
        let samples  = encode_examples(&examples, &vocab)?;

        tracing::info!("start infer process ...");
        let preds = predict(&model, &samples, cfg.batch_size, &device)?;

        let rows = examples
            .iter()
            .zip(&preds)
            .map(|(ex, p)| format!("{}\t{}", ex.raw, format_prediction(p, model_cfg.task_mode)));
        write_lines(&cfg.infer_result_path, rows)?;

        let path = PathBuf::from(&cfg.infer_result_path);
        tracing::info!("infer result saved in {}", path.display());
        Ok(path)
    }
}
