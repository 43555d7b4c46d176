// ============================================================
// Layer 6 — Network Configuration File
// ============================================================
// A SimNet run is described by a JSON file that picks the
// encoder network, the loss and the optimizer:
//
//   {
//     "net":       { "module_name": "bow", "class_name": "BOW",
//                    "emb_dim": 128, "bow_dim": 128 },
//     "loss":      { "module_name": "hinge_loss", "class_name": "HingeLoss",
//                    "margin": 0.1 },
//     "optimizer": { "class_name": "AdamOptimizer", "learning_rate": 0.001,
//                    "beta1": 0.9, "beta2": 0.999, "epsilon": 1e-08 },
//     "task_mode": "pairwise",
//     "model_path": "bow_pairwise"
//   }
//
// "net" is selected by module_name, "loss" and "optimizer" by
// class_name. Any other key (e.g. the net's class_name) is ignored.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::task::TaskMode;

fn dim_128() -> usize { 128 }
fn filters_256() -> usize { 256 }
fn filter_size_3() -> usize { 3 }
fn margin() -> f64 { 0.1 }
fn lr() -> f64 { 1e-3 }
fn beta1() -> f64 { 0.9 }
fn beta2() -> f64 { 0.999 }
fn epsilon() -> f64 { 1e-8 }
fn model_path() -> String { "simnet_model".to_string() }

/// Encoder network. Every variant feeds a shared embedding table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module_name", rename_all = "lowercase")]
pub enum NetConf {
    /// Bag of words: summed embeddings, softsign, then a dense layer
    Bow {
        #[serde(default = "dim_128")] emb_dim: usize,
        #[serde(default = "dim_128")] bow_dim: usize,
    },
    /// Convolution over the sequence, max pooled
    Cnn {
        #[serde(default = "dim_128")]       emb_dim:     usize,
        #[serde(default = "filter_size_3")] filter_size: usize,
        #[serde(default = "filters_256")]   num_filters: usize,
        #[serde(default = "dim_128")]       hidden_dim:  usize,
    },
    Lstm {
        #[serde(default = "dim_128")] emb_dim:    usize,
        #[serde(default = "dim_128")] lstm_dim:   usize,
        #[serde(default = "dim_128")] hidden_dim: usize,
    },
    Gru {
        #[serde(default = "dim_128")] emb_dim:    usize,
        #[serde(default = "dim_128")] gru_dim:    usize,
        #[serde(default = "dim_128")] hidden_dim: usize,
    },
}

impl NetConf {
    pub fn emb_dim(&self) -> usize {
        match self {
            NetConf::Bow  { emb_dim, .. }
            | NetConf::Cnn  { emb_dim, .. }
            | NetConf::Lstm { emb_dim, .. }
            | NetConf::Gru  { emb_dim, .. } => *emb_dim,
        }
    }

    /// Width of one pooled side before the dense layer
    pub fn encoded_dim(&self) -> usize {
        match self {
            NetConf::Bow  { emb_dim, .. }     => *emb_dim,
            NetConf::Cnn  { num_filters, .. } => *num_filters,
            NetConf::Lstm { lstm_dim, .. }    => *lstm_dim,
            NetConf::Gru  { gru_dim, .. }     => *gru_dim,
        }
    }

    /// Width of the dense layer after pooling
    pub fn hidden_dim(&self) -> usize {
        match self {
            NetConf::Bow  { bow_dim, .. }    => *bow_dim,
            NetConf::Cnn  { hidden_dim, .. }
            | NetConf::Lstm { hidden_dim, .. }
            | NetConf::Gru  { hidden_dim, .. } => *hidden_dim,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NetConf::Bow  { .. } => "bow",
            NetConf::Cnn  { .. } => "cnn",
            NetConf::Lstm { .. } => "lstm",
            NetConf::Gru  { .. } => "gru",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum LossConf {
    /// mean(max(0, margin - pos + neg)), pairwise
    HingeLoss {
        #[serde(default = "margin")] margin: f64,
    },
    /// mean(log(1 + exp(neg - pos))), pairwise
    LogLoss {},
    /// cross-entropy over two classes, pointwise
    SoftmaxCrossEntropyLoss {},
}

impl LossConf {
    pub fn task_mode(&self) -> TaskMode {
        match self {
            LossConf::HingeLoss { .. } | LossConf::LogLoss {} => TaskMode::Pairwise,
            LossConf::SoftmaxCrossEntropyLoss {}              => TaskMode::Pointwise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum OptimizerConf {
    #[serde(rename = "SGDOptimizer")]
    Sgd {
        #[serde(default = "lr")] learning_rate: f64,
    },
    #[serde(rename = "AdamOptimizer")]
    Adam {
        #[serde(default = "lr")]      learning_rate: f64,
        #[serde(default = "beta1")]   beta1:         f64,
        #[serde(default = "beta2")]   beta2:         f64,
        #[serde(default = "epsilon")] epsilon:       f64,
    },
}

impl OptimizerConf {
    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConf::Sgd  { learning_rate }      => *learning_rate,
            OptimizerConf::Adam { learning_rate, .. }  => *learning_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimNetConf {
    pub net:       NetConf,
    pub loss:      LossConf,
    pub optimizer: OptimizerConf,
    pub task_mode: TaskMode,
    /// Sub-directory of the output dir that receives checkpoints
    #[serde(default = "model_path")]
    pub model_path: String,
}

impl SimNetConf {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read net config from '{}'", path.display()))?;
        let conf: SimNetConf = serde_json::from_str(&json)
            .with_context(|| format!("Invalid net config '{}'", path.display()))?;
        conf.validate()?;
        Ok(conf)
    }

    /// Override the task mode from the command line.
    pub fn with_task_mode(mut self, task_mode: TaskMode) -> Result<Self> {
        self.task_mode = task_mode;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loss.task_mode() != self.task_mode {
            bail!(
                "loss {:?} is a {} loss but task_mode is {}",
                self.loss,
                self.loss.task_mode(),
                self.task_mode
            );
        }
        if self.net.emb_dim() == 0 || self.net.encoded_dim() == 0 || self.net.hidden_dim() == 0 {
            bail!("net '{}' has a zero dimension", self.net.name());
        }
        if let NetConf::Cnn { filter_size, .. } = self.net {
            // same-length padding needs an odd window
            if filter_size % 2 == 0 {
                bail!("cnn filter_size must be odd, got {filter_size}");
            }
        }
        Ok(())
    }
}
