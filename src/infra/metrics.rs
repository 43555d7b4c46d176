// ============================================================
// Layer 6 — Metrics
// ============================================================
// Evaluation metrics and the training metrics CSV.
//
// AUC (area under the ROC curve) is computed with a bucketed
// histogram, the same way streaming AUC metrics usually are:
//
//   1. Each prediction's positive-class probability p ∈ [0, 1]
//      falls into bucket floor(p * NUM_THRESHOLDS).
//   2. Positive and negative labels are counted per bucket.
//   3. Walking the buckets from the highest down, the running
//      (neg, pos) totals trace the ROC curve; the area under it
//      is summed as trapezoids and normalised by pos * neg.
//
// Accuracy depends on the task:
//   pairwise  → predicted 1 when p >= lamda
//   pointwise → argmax over the two classes (ties go to class 0)
//
// Output file: {model dir}/metrics.csv
//   epoch,global_step,train_loss,valid_auc,elapsed_secs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::task::TaskMode;

pub const NUM_THRESHOLDS: usize = 4095;

/// Streaming, histogram-based ROC-AUC.
#[derive(Debug, Clone)]
pub struct Auc {
    stat_pos: Vec<u64>,
    stat_neg: Vec<u64>,
}

impl Default for Auc {
    fn default() -> Self {
        Self::new()
    }
}

impl Auc {
    pub fn new() -> Self {
        Self {
            stat_pos: vec![0; NUM_THRESHOLDS + 1],
            stat_neg: vec![0; NUM_THRESHOLDS + 1],
        }
    }

    pub fn reset(&mut self) {
        self.stat_pos.iter_mut().for_each(|c| *c = 0);
        self.stat_neg.iter_mut().for_each(|c| *c = 0);
    }

    /// Add predictions (two-column probabilities) and their labels.
    pub fn update(&mut self, preds: &[[f32; 2]], labels: &[u8]) {
        for (pred, &label) in preds.iter().zip(labels) {
            let p   = pred[1].clamp(0.0, 1.0) as f64;
            let bin = ((p * NUM_THRESHOLDS as f64) as usize).min(NUM_THRESHOLDS);
            if label != 0 {
                self.stat_pos[bin] += 1;
            } else {
                self.stat_neg[bin] += 1;
            }
        }
    }

    pub fn eval(&self) -> f64 {
        let mut tot_pos = 0.0f64;
        let mut tot_neg = 0.0f64;
        let mut auc     = 0.0f64;

        for idx in (0..=NUM_THRESHOLDS).rev() {
            let prev_pos = tot_pos;
            let prev_neg = tot_neg;
            tot_pos += self.stat_pos[idx] as f64;
            tot_neg += self.stat_neg[idx] as f64;
            auc += trapezoid_area(tot_neg, prev_neg, tot_pos, prev_pos);
        }

        if tot_pos > 0.0 && tot_neg > 0.0 {
            auc / tot_pos / tot_neg
        } else {
            0.0
        }
    }
}

fn trapezoid_area(x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    (x1 - x2).abs() * (y1 + y2) / 2.0
}

/// One-shot AUC over a full prediction set.
pub fn auc(preds: &[[f32; 2]], labels: &[u8]) -> f64 {
    let mut metric = Auc::new();
    metric.update(preds, labels);
    metric.eval()
}

/// Predicted class for one two-column prediction.
pub fn predicted_class(pred: &[f32; 2], task_mode: TaskMode, lamda: f32) -> u8 {
    match task_mode {
        TaskMode::Pairwise  => u8::from(pred[1] >= lamda),
        TaskMode::Pointwise => u8::from(pred[1] > pred[0]),
    }
}

/// Fraction of predictions whose class matches the label.
pub fn accuracy(preds: &[[f32; 2]], labels: &[u8], task_mode: TaskMode, lamda: f32) -> f64 {
    let total = preds.len().min(labels.len());
    if total == 0 {
        return 0.0;
    }
    let correct = preds
        .iter()
        .zip(labels)
        .filter(|(pred, &label)| predicted_class(pred, task_mode, lamda) == label)
        .count();
    correct as f64 / total as f64
}

/// One row of the training metrics CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number, starting at 0
    pub epoch: usize,

    /// Global step reached at the end of the epoch
    pub global_step: usize,

    /// Mean training loss over the epoch's batches
    pub train_loss: f64,

    /// Most recent validation AUC, NaN when validation is off
    pub valid_auc: f64,

    pub elapsed_secs: f64,
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,global_step,train_loss,valid_auc,elapsed_secs")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.3}",
            m.epoch, m.global_step, m.train_loss, m.valid_auc, m.elapsed_secs,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn probs(p: &[f32]) -> Vec<[f32; 2]> {
        p.iter().map(|&p| [1.0 - p, p]).collect()
    }

    #[test]
    fn test_perfect_separation_gives_auc_one() {
        let preds = probs(&[0.9, 0.8, 0.2, 0.1]);
        assert!((auc(&preds, &[1, 1, 0, 0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_scores_give_auc_zero() {
        let preds = probs(&[0.1, 0.2, 0.8, 0.9]);
        assert!(auc(&preds, &[1, 1, 0, 0]).abs() < 1e-9);
    }

    #[test]
    fn test_ties_count_half() {
        let preds = probs(&[0.5, 0.5]);
        assert!((auc(&preds, &[1, 0]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_class_gives_zero() {
        let preds = probs(&[0.3, 0.7]);
        assert_eq!(auc(&preds, &[1, 1]), 0.0);
    }

    #[test]
    fn test_streaming_updates_match_one_shot() {
        let preds  = probs(&[0.9, 0.4, 0.6, 0.2, 0.7]);
        let labels = [1, 0, 1, 0, 0];

        let mut metric = Auc::new();
        metric.update(&preds[..2], &labels[..2]);
        metric.update(&preds[2..], &labels[2..]);
        assert!((metric.eval() - auc(&preds, &labels)).abs() < 1e-12);

        metric.reset();
        assert_eq!(metric.eval(), 0.0);
    }

    #[test]
    fn test_pairwise_accuracy_uses_threshold() {
        let preds = probs(&[0.95, 0.92, 0.5]);
        assert!((accuracy(&preds, &[1, 0, 0], TaskMode::Pairwise, 0.91) - 2.0 / 3.0).abs() < 1e-9);
        assert!((accuracy(&preds, &[1, 0, 0], TaskMode::Pairwise, 0.94) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointwise_accuracy_uses_argmax() {
        let preds = vec![[0.2, 0.8], [0.6, 0.4], [0.5, 0.5]];
        assert!((accuracy(&preds, &[1, 0, 0], TaskMode::Pointwise, 0.0) - 1.0).abs() < 1e-9);
        assert_eq!(accuracy(&[], &[], TaskMode::Pointwise, 0.0), 0.0);
    }

    #[test]
    fn test_metrics_logger_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let m = EpochMetrics { epoch: 0, global_step: 10, train_loss: 0.5, valid_auc: 0.75, elapsed_secs: 1.0 };
        logger.log(&m).unwrap();
        logger.log(&EpochMetrics { epoch: 1, global_step: 20, ..m }).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,global_step,train_loss,valid_auc,elapsed_secs");
        assert!(lines[2].starts_with("1,20,0.500000,0.750000"));
    }
}
