//! End-to-end fit: encode → split → scale → train
//!
//! The pressure categories and column order come from the whole dataset, the
//! scaler only sees the training partition, and the held-out partition is
//! scaled with the training statistics before evaluation.

use burn::tensor::backend::AutodiffBackend;

use crate::data::{KickDataset, SplitIndices};
use crate::features::{SchemaEncoder, ScalerParams};
use crate::model::{KickNet, KickNetConfig};
use crate::predict::TrainedPipeline;
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::training::trainer::{evaluate, train_model};
use crate::{Config, KickRecord, LabeledKick, Result};

/// What happened during a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub history: TrainingHistory,
    /// Metrics on the held-out rows, if any were held out
    pub test_metrics: Option<Metrics>,
}

/// Fit the full pipeline on labelled kicks
pub fn fit_pipeline<B: AutodiffBackend>(
    kicks: &[LabeledKick],
    config: &Config,
    device: &B::Device,
) -> Result<(TrainedPipeline<B::InnerBackend>, TrainingReport)> {
    let records: Vec<KickRecord> = kicks.iter().map(|k| k.record.clone()).collect();
    let labels: Vec<bool> = kicks.iter().map(|k| k.goal).collect();

    let encoder = SchemaEncoder::new(&config.encoding);
    let (encoded, schema) = encoder.fit_transform(&records)?;

    let split = SplitIndices::random(
        encoded.len(),
        config.training.test_fraction,
        config.training.split_seed,
    )?;
    let (train_x, train_y) = select(&encoded, &labels, &split.train);
    let (test_x, test_y) = select(&encoded, &labels, &split.test);

    let scaler = ScalerParams::fit(&train_x, &schema)?;
    let train_dataset = KickDataset::new(scaler.apply_all(&train_x)?, &train_y)?;
    let test_dataset = KickDataset::new(scaler.apply_all(&test_x)?, &test_y)?;

    let net_config = KickNetConfig::new(schema.len(), config.model.hidden_dims.clone());
    let model = match config.training.init_seed {
        Some(seed) => KickNet::<B>::seeded(device, &net_config, seed),
        None => KickNet::<B>::new(device, &net_config),
    };

    let (model, history) = train_model(model, train_dataset, &config.training, device)?;

    let test_metrics = if test_dataset.is_empty() {
        None
    } else {
        let metrics = evaluate(&model, &test_dataset, device)?;
        log::info!("Held-out evaluation on {} rows: {}", test_dataset.len(), metrics);
        Some(metrics)
    };

    let report = TrainingReport {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        history,
        test_metrics,
    };

    Ok((TrainedPipeline::new(schema, scaler, model, device.clone()), report))
}

fn select(rows: &[Vec<f32>], labels: &[bool], indices: &[usize]) -> (Vec<Vec<f32>>, Vec<bool>) {
    indices
        .iter()
        .map(|&i| (rows[i].clone(), labels[i]))
        .unzip()
}
