// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Step-based train loop using Burn's DataLoader and an
// optimizer chosen by the net config (SGD or Adam).
//
// Per batch:
//   global_step += 1
//   forward + loss → backward → optimizer step
//   every validation_steps → AUC on the validation set
//   every save_steps       → checkpoint model_step_{global_step}
//
// Per epoch: mean loss and wall time are logged and appended to
// metrics.csv. After the last epoch a final checkpoint is always
// written and, if requested, the test set is evaluated.
//
// Training uses TrainBackend (Autodiff); validation runs on
// model.valid(), i.e. the inner backend with no autodiff graph.

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;
use std::{path::PathBuf, time::Instant};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SimNetBatcher, dataset::SimNetDataset};
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointRef},
    conf::{OptimizerConf, SimNetConf},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    loss::SimNetLoss,
    model::{SimNetModel, SimNetModelConfig},
    predictor::{evaluate, EvalReport},
};

/// Datasets for one training run.
pub struct TrainData {
    pub train: SimNetDataset,
    pub valid: Option<SimNetDataset>,
    pub test:  Option<SimNetDataset>,
    /// Warm-start weights, already checked against the model config
    pub init:  Option<CheckpointRef>,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct TrainSummary {
    pub global_step: usize,
    pub final_checkpoint: PathBuf,
    pub epoch_losses: Vec<f64>,
    pub test_report: Option<EvalReport>,
}

pub fn run_training<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    conf:         &SimNetConf,
    model_cfg:    &SimNetModelConfig,
    data:         TrainData,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<TrainSummary> {
    if cfg.batch_size == 0 || cfg.save_steps == 0 || cfg.validation_steps == 0 {
        bail!("batch_size, save_steps and validation_steps must be positive");
    }

    if let Some(seed) = cfg.seed {
        B::seed(seed);
    }

    let mut model: SimNetModel<B> = model_cfg.init(&device);
    if let Some(checkpoint) = &data.init {
        model = CheckpointManager::load_model(checkpoint, model, &device)?;
    }
    tracing::info!(
        "Model ready: net={}, task_mode={}, vocab_size={}",
        conf.net.name(),
        model_cfg.task_mode,
        model_cfg.vocab_size
    );

    match conf.optimizer {
        OptimizerConf::Sgd { .. } => {
            let optim = SgdConfig::new().init::<B, SimNetModel<B>>();
            train_loop(cfg, conf, model, optim, data, ckpt_manager, device)
        }
        OptimizerConf::Adam { beta1, beta2, epsilon, .. } => {
            let optim = AdamConfig::new()
                .with_beta_1(beta1 as f32)
                .with_beta_2(beta2 as f32)
                .with_epsilon(epsilon as f32)
                .init::<B, SimNetModel<B>>();
            train_loop(cfg, conf, model, optim, data, ckpt_manager, device)
        }
    }
}

fn train_loop<B, O>(
    cfg:          &TrainConfig,
    conf:         &SimNetConf,
    mut model:    SimNetModel<B>,
    mut optim:    O,
    data:         TrainData,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<TrainSummary>
where
    B: AutodiffBackend,
    O: Optimizer<SimNetModel<B>, B>,
{
    let loss_fn = SimNetLoss::from(&conf.loss);
    let lr      = conf.optimizer.learning_rate();
    let metrics = MetricsLogger::new(ckpt_manager.dir())?;

    let shuffle_seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let train_loader = DataLoaderBuilder::new(SimNetBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(shuffle_seed)
        .num_workers(1)
        .build(data.train);

    let valid = if cfg.do_valid { data.valid.as_ref() } else { None };
    let inner_device = device.clone();

    tracing::info!("start train process ...");
    let mut global_step    = 0usize;
    let mut last_valid_auc = f64::NAN;
    let mut epoch_losses   = Vec::with_capacity(cfg.epoch);

    for epoch in 0..cfg.epoch {
        let start = Instant::now();
        let mut losses = Vec::new();

        // The iterator ends when the shuffled stream is exhausted
        for batch in train_loader.iter() {
            global_step += 1;

            let loss = loss_fn.compute(&model, batch)?;
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            if let Some(valid) = valid {
                if global_step % cfg.validation_steps == 0 {
                    let report = evaluate(
                        &model.valid(),
                        valid,
                        cfg.batch_size,
                        cfg.compute_accuracy,
                        cfg.lamda,
                        &inner_device,
                    )?;
                    last_valid_auc = report.auc;
                    match report.accuracy {
                        Some(acc) => tracing::info!(
                            "global_steps: {}, valid_auc: {:.6}, valid_acc: {:.6}",
                            global_step, report.auc, acc
                        ),
                        None => tracing::info!(
                            "global_steps: {}, valid_auc: {:.6}",
                            global_step, report.auc
                        ),
                    }
                }
            }

            if global_step % cfg.save_steps == 0 {
                let path = ckpt_manager.save_model(&model, global_step)?;
                tracing::info!("saving model in {}", path.display());
            }

            losses.push(loss_val);
        }

        let mean_loss = if losses.is_empty() {
            f64::NAN
        } else {
            losses.iter().sum::<f64>() / losses.len() as f64
        };
        let elapsed = start.elapsed().as_secs_f64();
        tracing::info!(
            "epoch: {}, loss: {:.6}, used time: {} sec",
            epoch, mean_loss, elapsed as u64
        );
        metrics.log(&EpochMetrics {
            epoch,
            global_step,
            train_loss: mean_loss,
            valid_auc: last_valid_auc,
            elapsed_secs: elapsed,
        })?;
        epoch_losses.push(mean_loss);
    }

    tracing::info!("the final step is {}", global_step);
    let final_checkpoint = ckpt_manager.save_model(&model, global_step)?;
    tracing::info!("saving model in {}", final_checkpoint.display());

    let test_report = match (&data.test, cfg.do_test) {
        (Some(test), true) => {
            let report = evaluate(
                &model.valid(),
                test,
                cfg.batch_size,
                cfg.compute_accuracy,
                cfg.lamda,
                &inner_device,
            )?;
            match report.accuracy {
                Some(acc) => tracing::info!(
                    "AUC of test is {:.6}, Accuracy of test is {:.6}",
                    report.auc, acc
                ),
                None => tracing::info!("AUC of test is {:.6}", report.auc),
            }
            Some(report)
        }
        _ => None,
    };

    Ok(TrainSummary { global_step, final_checkpoint, epoch_losses, test_report })
}
