// ============================================================
// Layer 5 — Predictor
// ============================================================
// Runs a model over tokenised pairs in file order and turns the
// raw output into two-column probabilities [p(0), p(1)]:
//
//   pairwise   cosine c   → p = (c + 1) / 2 → [1 - p, p]
//   pointwise  softmax    → used as is
//
// Both AUC and accuracy are computed from this representation.

use anyhow::{anyhow, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{
    batcher::SimNetBatcher,
    dataset::{PairSample, SimNetDataset},
};
use crate::domain::task::TaskMode;
use crate::infra::metrics;
use crate::ml::model::SimNetModel;

/// Result of scoring a labelled dataset.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub auc:         f64,
    pub accuracy:    Option<f64>,
    pub predictions: Vec<[f32; 2]>,
}

/// Predict every sample, batch by batch, preserving order.
pub fn predict<B: Backend>(
    model:      &SimNetModel<B>,
    samples:    &[PairSample],
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<[f32; 2]>> {
    let batcher   = SimNetBatcher::<B>::new(device.clone());
    let task_mode = model.task_mode();
    let mut preds = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch  = batcher.batch(chunk.to_vec());
        let output = model.forward(batch.left, batch.right);
        let values: Vec<f32> = output
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;

        match task_mode {
            TaskMode::Pairwise => preds.extend(values.iter().map(|&cos| {
                let p = (cos + 1.0) / 2.0;
                [1.0 - p, p]
            })),
            TaskMode::Pointwise => preds.extend(values.chunks(2).map(|row| [row[0], row[1]])),
        }
    }

    Ok(preds)
}

/// Predict a labelled dataset and compute AUC (and accuracy when asked).
pub fn evaluate<B: Backend>(
    model:            &SimNetModel<B>,
    dataset:          &SimNetDataset,
    batch_size:       usize,
    compute_accuracy: bool,
    lamda:            f32,
    device:           &B::Device,
) -> Result<EvalReport> {
    let predictions = predict(model, dataset.samples(), batch_size, device)?;
    let labels      = dataset.labels();
    if labels.len() != predictions.len() {
        return Err(anyhow!(
            "{} predictions but {} labels; evaluation data must be labelled",
            predictions.len(),
            labels.len()
        ));
    }

    let auc = metrics::auc(&predictions, &labels);
    let accuracy = compute_accuracy
        .then(|| metrics::accuracy(&predictions, &labels, model.task_mode(), lamda));

    Ok(EvalReport { auc, accuracy, predictions })
}

/// Text written to prediction files for one pair.
pub fn format_prediction(pred: &[f32; 2], task_mode: TaskMode) -> String {
    match task_mode {
        TaskMode::Pairwise  => pred[1].to_string(),
        TaskMode::Pointwise => usize::from(pred[1] > pred[0]).to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::infra::conf::NetConf;
    use crate::ml::model::SimNetModelConfig;

    type B = NdArray;

    fn samples() -> Vec<PairSample> {
        (0..5u32)
            .map(|i| PairSample {
                query:    vec![i + 1, i + 2],
                title:    vec![i + 3],
                negative: None,
                label:    Some((i % 2) as u8),
            })
            .collect()
    }

    #[test]
    fn test_pairwise_predictions_are_rescaled_probabilities() {
        let device = Default::default();
        let model: SimNetModel<B> =
            SimNetModelConfig::new(10, TaskMode::Pairwise, NetConf::Bow { emb_dim: 4, bow_dim: 4 })
                .init(&device);

        let preds = predict(&model, &samples(), 2, &device).unwrap();
        assert_eq!(preds.len(), 5);
        for p in &preds {
            assert!((p[0] + p[1] - 1.0).abs() < 1e-5);
            assert!((-1e-4..=1.0001).contains(&p[1]));
        }
    }

    #[test]
    fn test_batch_size_does_not_change_predictions() {
        let device = Default::default();
        let model: SimNetModel<B> =
            SimNetModelConfig::new(10, TaskMode::Pointwise, NetConf::Bow { emb_dim: 4, bow_dim: 4 })
                .init(&device);

        let one_by_one = predict(&model, &samples(), 1, &device).unwrap();
        let all_at_once = predict(&model, &samples(), 64, &device).unwrap();
        for (a, b) in one_by_one.iter().zip(&all_at_once) {
            assert!((a[1] - b[1]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_evaluate_reports_accuracy_on_request() {
        let device = Default::default();
        let model: SimNetModel<B> =
            SimNetModelConfig::new(10, TaskMode::Pointwise, NetConf::Bow { emb_dim: 4, bow_dim: 4 })
                .init(&device);
        let dataset = SimNetDataset::new(samples());

        let report = evaluate(&model, &dataset, 4, true, 0.5, &device).unwrap();
        assert_eq!(report.predictions.len(), 5);
        assert!((0.0..=1.0).contains(&report.auc));
        assert!(report.accuracy.is_some());

        let report = evaluate(&model, &dataset, 4, false, 0.5, &device).unwrap();
        assert!(report.accuracy.is_none());
    }

    #[test]
    fn test_unlabelled_data_cannot_be_evaluated() {
        let device = Default::default();
        let model: SimNetModel<B> =
            SimNetModelConfig::new(10, TaskMode::Pairwise, NetConf::Bow { emb_dim: 4, bow_dim: 4 })
                .init(&device);
        let unlabelled: Vec<PairSample> = samples()
            .into_iter()
            .map(|s| PairSample { label: None, ..s })
            .collect();
        assert!(evaluate(&model, &SimNetDataset::new(unlabelled), 4, false, 0.5, &device).is_err());
    }

    #[test]
    fn test_format_prediction() {
        assert_eq!(format_prediction(&[0.25, 0.75], TaskMode::Pairwise), "0.75");
        assert_eq!(format_prediction(&[0.25, 0.75], TaskMode::Pointwise), "1");
        assert_eq!(format_prediction(&[0.5, 0.5], TaskMode::Pointwise), "0");
    }
}
