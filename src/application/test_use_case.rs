// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Evaluates a trained checkpoint on a labelled test file:
//
//   1. Rebuild the model from the checkpoint's config
//   2. Read and tokenise the test pairs
//   3. Predict, compute AUC (and accuracy)
//   4. Write one prediction per line
//        pairwise  → (cos + 1) / 2
//        pointwise → predicted class
//   5. Optionally write "<test line>\t<prediction>" per pair

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::{check_vocab, write_lines};
use crate::data::{dataset::{encode_examples, SimNetDataset}, loader::{PairFileKind, TsvLoader}};
use crate::domain::traits::ExampleSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::Vocab};
use crate::ml::{
    default_device,
    predictor::{evaluate, format_prediction, EvalReport},
    InferBackend,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub vocab_path:       String,
    pub test_data_dir:    String,
    pub init_checkpoint:  String,
    pub batch_size:       usize,
    pub compute_accuracy: bool,
    pub lamda:            f32,
    pub predictions_path: String,
    pub verbose_result:   bool,
    pub test_result_path: String,
}

pub struct TestUseCase {
    config: TestConfig,
}

impl TestUseCase {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let cfg    = &self.config;
        let device = default_device();

        let (model_cfg, model) =
            CheckpointManager::restore::<InferBackend>(&cfg.init_checkpoint, &device)?;
        let task_mode = model_cfg.task_mode;

        let vocab    = Vocab::load(&cfg.vocab_path)?;
        check_vocab(&vocab, &model_cfg)?;
        let examples = TsvLoader::new(&cfg.test_data_dir, PairFileKind::Labelled).load_all()?;
        let dataset  = SimNetDataset::new(encode_examples(&examples, &vocab)?);

        tracing::info!("start test process ...");
        let report = evaluate(
            &model,
            &dataset,
            cfg.batch_size,
            cfg.compute_accuracy,
            cfg.lamda,
            &device,
        )?;

        let lines: Vec<String> = report
            .predictions
            .iter()
            .map(|p| format_prediction(p, task_mode))
            .collect();
        write_lines(&cfg.predictions_path, lines.iter().map(String::as_str))?;

        match report.accuracy {
            Some(acc) => tracing::info!(
                "AUC of test is {:.6}, Accuracy of test is {:.6}",
                report.auc, acc
            ),
            None => tracing::info!("AUC of test is {:.6}", report.auc),
        }

        if cfg.verbose_result {
            let rows = examples
                .iter()
                .zip(&lines)
                .map(|(ex, pred)| format!("{}\t{}", ex.raw, pred));
            write_lines(&cfg.test_result_path, rows)?;
            tracing::info!("test result saved in {}", cfg.test_result_path);
        }

        Ok(report)
    }
}
