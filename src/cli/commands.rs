// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `test` and `infer`.
// Each Args struct converts into its application-layer config,
// so the use cases never see clap types.

use clap::{Args, Subcommand};

use crate::application::{
    infer_use_case::InferConfig,
    test_use_case::TestConfig,
    train_use_case::TrainConfig,
};
use crate::domain::task::TaskMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a SimNet model, optionally validating and testing it
    Train(TrainArgs),

    /// Evaluate a checkpoint on a labelled test file
    Test(TestArgs),

    /// Score unlabelled pairs with a checkpoint
    Infer(InferArgs),
}

/// Arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Net configuration JSON (module, loss, optimizer, task mode)
    #[arg(long, default_value = "config/bow_pairwise.json")]
    pub config_path: String,

    /// Vocabulary file, one "word \t id" per line
    #[arg(long, default_value = "data/term2id.dict")]
    pub vocab_path: String,

    /// Training file: "query \t pos \t neg" (pairwise) or "query \t title \t label"
    #[arg(long, default_value = "data/train_pairwise_data")]
    pub train_data_dir: String,

    #[arg(long)]
    pub valid_data_dir: Option<String>,

    #[arg(long)]
    pub test_data_dir: Option<String>,

    /// Checkpoints go to <output-dir>/<model_path from the config>
    #[arg(long, default_value = "model_files")]
    pub output_dir: String,

    /// Warm start from a model directory or a model_step_N file
    #[arg(long)]
    pub init_checkpoint: Option<String>,

    /// Overrides the task mode of the config file
    #[arg(long)]
    pub task_mode: Option<TaskMode>,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Number of passes over the training data
    #[arg(long, default_value_t = 10)]
    pub epoch: usize,

    /// Save a checkpoint every N steps
    #[arg(long, default_value_t = 1000)]
    pub save_steps: usize,

    /// Run validation every N steps (with --do-valid)
    #[arg(long, default_value_t = 100)]
    pub validation_steps: usize,

    #[arg(long)]
    pub do_valid: bool,

    #[arg(long)]
    pub do_test: bool,

    /// Also report accuracy next to AUC
    #[arg(long)]
    pub compute_accuracy: bool,

    /// Pairwise decision threshold on the [0, 1] score
    #[arg(long, default_value_t = 0.91)]
    pub lamda: f32,

    /// Fix parameter init and shuffling
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            config_path:      a.config_path,
            vocab_path:       a.vocab_path,
            train_data_dir:   a.train_data_dir,
            valid_data_dir:   a.valid_data_dir,
            test_data_dir:    a.test_data_dir,
            output_dir:       a.output_dir,
            init_checkpoint:  a.init_checkpoint,
            task_mode:        a.task_mode,
            batch_size:       a.batch_size,
            epoch:            a.epoch,
            save_steps:       a.save_steps,
            validation_steps: a.validation_steps,
            do_valid:         a.do_valid,
            do_test:          a.do_test,
            compute_accuracy: a.compute_accuracy,
            lamda:            a.lamda,
            seed:             a.seed,
        }
    }
}

/// Arguments for the `test` command.
#[derive(Args, Debug)]
pub struct TestArgs {
    #[arg(long, default_value = "data/term2id.dict")]
    pub vocab_path: String,

    /// Labelled file: "query \t title \t label"
    #[arg(long, default_value = "data/test_pairwise_data")]
    pub test_data_dir: String,

    /// Model directory (latest step) or a model_step_N file
    #[arg(long)]
    pub init_checkpoint: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long)]
    pub compute_accuracy: bool,

    #[arg(long, default_value_t = 0.91)]
    pub lamda: f32,

    /// One prediction per test line
    #[arg(long, default_value = "predictions.txt")]
    pub predictions_path: String,

    /// Also write "<test line> \t <prediction>"
    #[arg(long)]
    pub verbose_result: bool,

    #[arg(long, default_value = "test_result")]
    pub test_result_path: String,
}

impl From<TestArgs> for TestConfig {
    fn from(a: TestArgs) -> Self {
        TestConfig {
            vocab_path:       a.vocab_path,
            test_data_dir:    a.test_data_dir,
            init_checkpoint:  a.init_checkpoint,
            batch_size:       a.batch_size,
            compute_accuracy: a.compute_accuracy,
            lamda:            a.lamda,
            predictions_path: a.predictions_path,
            verbose_result:   a.verbose_result,
            test_result_path: a.test_result_path,
        }
    }
}

/// Arguments for the `infer` command.
#[derive(Args, Debug)]
pub struct InferArgs {
    #[arg(long, default_value = "data/term2id.dict")]
    pub vocab_path: String,

    /// Unlabelled file: "query \t title"
    #[arg(long, default_value = "data/infer_data")]
    pub infer_data_dir: String,

    #[arg(long)]
    pub init_checkpoint: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long, default_value = "infer_result")]
    pub infer_result_path: String,
}

impl From<InferArgs> for InferConfig {
    fn from(a: InferArgs) -> Self {
        InferConfig {
            vocab_path:        a.vocab_path,
            infer_data_dir:    a.infer_data_dir,
            init_checkpoint:   a.init_checkpoint,
            batch_size:        a.batch_size,
            infer_result_path: a.infer_result_path,
        }
    }
}
