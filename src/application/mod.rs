// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for each mode of the tool:
//
//   train_use_case.rs — train, validate, checkpoint, test
//   test_use_case.rs  — evaluate a checkpoint on labelled pairs
//   infer_use_case.rs — score unlabelled pairs
//
// No ML math here, only workflow coordination.

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

pub mod train_use_case;

pub mod test_use_case;

pub mod infer_use_case;

use crate::infra::vocab_store::Vocab;
use crate::ml::model::SimNetModelConfig;

/// A vocabulary with ids past the trained embedding table cannot be used.
pub(crate) fn check_vocab(vocab: &Vocab, model_cfg: &SimNetModelConfig) -> Result<()> {
    if vocab.size() > model_cfg.vocab_size {
        bail!(
            "vocabulary needs {} embedding rows but the model was trained with {}",
            vocab.size(),
            model_cfg.vocab_size
        );
    }
    Ok(())
}

/// Write one item per line, creating parent directories.
pub(crate) fn write_lines<S: AsRef<str>>(
    path:  impl AsRef<Path>,
    lines: impl IntoIterator<Item = S>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(())
}

// ─── End-to-end Tests ─────────────────────────────────────────────────────────
// Tiny corpora, a few steps each: train → test → infer on the CPU backend.
#[cfg(all(test, not(feature = "wgpu")))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use infer_use_case::{InferConfig, InferUseCase};
    use test_use_case::{TestConfig, TestUseCase};
    use train_use_case::{TrainConfig, TrainUseCase};

    const VOCAB: &str = "good\t1\ngreat\t2\nfilm\t3\nmovie\t4\nbad\t5\nawful\t6\nplot\t7\nboring\t8\n";

    const LABELLED: &str = "good film\tgreat movie\t1\n\
                            good film\tawful plot\t0\n\
                            bad movie\tboring plot\t1\n\
                            bad movie\tgreat film\t0\n";

    fn write(dir: &Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn train_config(dir: &Path, conf: &str, train: &str) -> TrainConfig {
        TrainConfig {
            config_path:      write(dir, "conf.json", conf),
            vocab_path:       write(dir, "vocab.txt", VOCAB),
            train_data_dir:   write(dir, "train.tsv", train),
            valid_data_dir:   Some(write(dir, "valid.tsv", LABELLED)),
            test_data_dir:    Some(write(dir, "test.tsv", LABELLED)),
            output_dir:       dir.join("out").to_string_lossy().into_owned(),
            batch_size:       2,
            epoch:            2,
            save_steps:       3,
            validation_steps: 2,
            do_valid:         true,
            do_test:          true,
            compute_accuracy: true,
            seed:             Some(7),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_pairwise_bow_train_test_infer() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let conf = r#"{
            "net": {"module_name": "bow", "emb_dim": 8, "bow_dim": 8},
            "loss": {"class_name": "HingeLoss", "margin": 0.1},
            "optimizer": {"class_name": "AdamOptimizer", "learning_rate": 0.01},
            "task_mode": "pairwise",
            "model_path": "bow_pairwise"
        }"#;
        let train = "good film\tgreat movie\tboring plot\n".repeat(6);

        let summary = TrainUseCase::new(train_config(dir, conf, &train)).execute().unwrap();

        // 6 triples, batch 2 → 3 steps per epoch, 2 epochs
        assert_eq!(summary.global_step, 6);
        assert_eq!(summary.epoch_losses.len(), 2);
        let report = summary.test_report.unwrap();
        assert_eq!(report.predictions.len(), 4);
        assert!(report.accuracy.is_some());

        let model_dir = dir.join("out").join("bow_pairwise");
        assert!(model_dir.join("model_step_3.mpk").is_file());
        assert!(model_dir.join("model_step_6.mpk").is_file());
        assert!(model_dir.join("simnet_config.json").exists());
        let csv = fs::read_to_string(model_dir.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let model_dir_str = model_dir.to_string_lossy().into_owned();
        let predictions   = dir.join("predictions.txt");
        let test_result   = dir.join("test_result.txt");
        let report = TestUseCase::new(TestConfig {
            vocab_path:       dir.join("vocab.txt").to_string_lossy().into_owned(),
            test_data_dir:    dir.join("test.tsv").to_string_lossy().into_owned(),
            init_checkpoint:  model_dir_str.clone(),
            batch_size:       3,
            compute_accuracy: false,
            lamda:            0.91,
            predictions_path: predictions.to_string_lossy().into_owned(),
            verbose_result:   true,
            test_result_path: test_result.to_string_lossy().into_owned(),
        })
        .execute()
        .unwrap();
        assert!(report.accuracy.is_none());
        assert!((0.0..=1.0).contains(&report.auc));

        let preds = fs::read_to_string(&predictions).unwrap();
        assert_eq!(preds.lines().count(), 4);
        for line in preds.lines() {
            let p: f32 = line.parse().unwrap();
            assert!((-1e-4..=1.0001).contains(&p));
        }
        let verbose = fs::read_to_string(&test_result).unwrap();
        assert!(verbose.lines().all(|l| l.split('\t').count() == 4));

        let infer_in = write(dir, "infer.tsv", "good film\tgreat movie\nunknown words\tbad plot\n");
        let out: PathBuf = InferUseCase::new(InferConfig {
            vocab_path:        dir.join("vocab.txt").to_string_lossy().into_owned(),
            infer_data_dir:    infer_in,
            init_checkpoint:   model_dir.join("model_step_3.mpk").to_string_lossy().into_owned(),
            batch_size:        8,
            infer_result_path: dir.join("infer_result.txt").to_string_lossy().into_owned(),
        })
        .execute()
        .unwrap();

        let rows = fs::read_to_string(out).unwrap();
        let rows: Vec<&str> = rows.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("unknown words\tbad plot\t"));
    }

    #[test]
    fn test_pointwise_cnn_train_and_infer_labels() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let conf = r#"{
            "net": {"module_name": "cnn", "emb_dim": 8, "filter_size": 3,
                    "num_filters": 6, "hidden_dim": 8},
            "loss": {"class_name": "SoftmaxCrossEntropyLoss"},
            "optimizer": {"class_name": "SGDOptimizer", "learning_rate": 0.05},
            "task_mode": "pointwise",
            "model_path": "cnn_pointwise"
        }"#;
        let mut cfg = train_config(dir, conf, LABELLED);
        cfg.do_valid = false;

        let summary = TrainUseCase::new(cfg).execute().unwrap();
        // 4 pairs, batch 2 → 2 steps per epoch
        assert_eq!(summary.global_step, 4);
        assert!(summary.epoch_losses.iter().all(|l| l.is_finite()));
        assert!(summary.final_checkpoint.ends_with("model_step_4"));

        let out = InferUseCase::new(InferConfig {
            vocab_path:        dir.join("vocab.txt").to_string_lossy().into_owned(),
            infer_data_dir:    write(dir, "infer.tsv", "good film\tgreat movie\n"),
            init_checkpoint:   dir.join("out/cnn_pointwise").to_string_lossy().into_owned(),
            batch_size:        8,
            infer_result_path: dir.join("results/infer.txt").to_string_lossy().into_owned(),
        })
        .execute()
        .unwrap();

        let rows = fs::read_to_string(out).unwrap();
        let label = rows.trim_end().rsplit('\t').next().unwrap();
        assert!(label == "0" || label == "1");
    }

    #[test]
    fn test_pairwise_training_rejects_labelled_only_data() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let conf = r#"{
            "net": {"module_name": "bow"},
            "loss": {"class_name": "HingeLoss"},
            "optimizer": {"class_name": "SGDOptimizer"},
            "task_mode": "pairwise"
        }"#;
        // pairwise training needs a negative title column
        let cfg = train_config(dir, conf, "good film\tgreat movie\n");
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    const PAIRWISE_CONF: &str = r#"{
        "net": {"module_name": "bow", "emb_dim": 8, "bow_dim": 8},
        "loss": {"class_name": "HingeLoss"},
        "optimizer": {"class_name": "SGDOptimizer", "learning_rate": 0.05},
        "task_mode": "pairwise",
        "model_path": "warm"
    }"#;

    #[test]
    fn test_recurrent_and_cnn_encoders_train_on_padded_batches() {
        let nets = [
            r#"{"module_name": "lstm", "emb_dim": 8, "lstm_dim": 6, "hidden_dim": 4}"#,
            r#"{"module_name": "gru", "emb_dim": 8, "gru_dim": 6, "hidden_dim": 4}"#,
            r#"{"module_name": "cnn", "emb_dim": 8, "num_filters": 6, "hidden_dim": 4}"#,
        ];
        for net in nets {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path();
            let conf = format!(
                r#"{{"net": {net}, "loss": {{"class_name": "HingeLoss"}},
                    "optimizer": {{"class_name": "AdamOptimizer", "learning_rate": 0.01}},
                    "task_mode": "pairwise"}}"#
            );
            let mut cfg = train_config(
                dir,
                &conf,
                "good film\tfilm good\tgood\ngood\tfilm film\tgood film\n",
            );
            cfg.epoch = 1;

            let summary = TrainUseCase::new(cfg).execute().unwrap();
            assert_eq!(summary.global_step, 1, "{net}");
            assert!(summary.epoch_losses[0].is_finite(), "{net}");
            assert_eq!(summary.test_report.unwrap().predictions.len(), 4);
        }
    }

    #[test]
    fn test_warm_start_with_a_fixed_seed_is_reproducible() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let train = "good film\tgreat movie\tboring plot\nbad movie\tawful plot\tgreat film\n".repeat(3);

        let mut base = train_config(dir, PAIRWISE_CONF, &train);
        base.epoch = 1;
        TrainUseCase::new(base.clone()).execute().unwrap();
        let base_dir = dir.join("out").join("warm").to_string_lossy().into_owned();

        // the weight RNG is process wide, so both runs start from one checkpoint
        let run = |name: &str| {
            let cfg = TrainConfig {
                output_dir:      dir.join(name).to_string_lossy().into_owned(),
                init_checkpoint: Some(base_dir.clone()),
                seed:            Some(11),
                ..base.clone()
            };
            TrainUseCase::new(cfg).execute().unwrap()
        };
        let first  = run("first");
        let second = run("second");

        assert_eq!(first.global_step, 3);
        assert_eq!(first.epoch_losses.len(), second.epoch_losses.len());
        for (a, b) in first.epoch_losses.iter().zip(&second.epoch_losses) {
            assert!((a - b).abs() < 1e-9);
        }
        let (a, b) = (first.test_report.unwrap(), second.test_report.unwrap());
        assert_eq!(a.predictions, b.predictions);
    }

    #[test]
    fn test_warm_start_from_another_task_mode_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let mut base = train_config(dir, PAIRWISE_CONF, "good film\tgreat movie\tboring plot\n");
        base.epoch = 1;
        TrainUseCase::new(base.clone()).execute().unwrap();

        let pointwise = r#"{
            "net": {"module_name": "bow", "emb_dim": 8, "bow_dim": 8},
            "loss": {"class_name": "SoftmaxCrossEntropyLoss"},
            "optimizer": {"class_name": "SGDOptimizer"},
            "task_mode": "pointwise",
            "model_path": "other"
        }"#;
        let cfg = TrainConfig {
            config_path:     write(dir, "pointwise.json", pointwise),
            train_data_dir:  write(dir, "labelled.tsv", LABELLED),
            init_checkpoint: Some(dir.join("out").join("warm").to_string_lossy().into_owned()),
            ..base
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("pairwise"), "{err}");
    }

    #[test]
    fn test_larger_vocab_than_the_model_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let mut base = train_config(dir, PAIRWISE_CONF, "good film\tgreat movie\tboring plot\n");
        base.epoch = 1;
        TrainUseCase::new(base).execute().unwrap();

        let model_dir = dir.join("out").join("warm").to_string_lossy().into_owned();
        let result = InferUseCase::new(InferConfig {
            vocab_path:        write(dir, "big_vocab.txt", &format!("{VOCAB}new\t500\n")),
            infer_data_dir:    write(dir, "infer.tsv", "new\tnew\n"),
            init_checkpoint:   model_dir.clone(),
            batch_size:        4,
            infer_result_path: dir.join("infer_result.txt").to_string_lossy().into_owned(),
        })
        .execute();
        assert!(result.is_err());

        let result = TestUseCase::new(TestConfig {
            vocab_path:       dir.join("big_vocab.txt").to_string_lossy().into_owned(),
            test_data_dir:    dir.join("test.tsv").to_string_lossy().into_owned(),
            init_checkpoint:  model_dir,
            batch_size:       4,
            compute_accuracy: false,
            lamda:            0.91,
            predictions_path: dir.join("predictions.txt").to_string_lossy().into_owned(),
            verbose_result:   false,
            test_result_path: dir.join("test_result.txt").to_string_lossy().into_owned(),
        })
        .execute();
        assert!(result.is_err());
    }
}
