//! Mini-batch training loop for the goal classifier

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

use crate::data::{KickBatch, KickBatcher, KickDataset};
use crate::model::KickNet;
use crate::training::metrics::{count_correct, Metrics, TrainingHistory};
use crate::{PenaltyError, Result, TrainingConfig};

/// Binary cross-entropy on probabilities, clamped away from 0 and 1
pub fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

/// Trainer for the goal classifier
///
/// Runs a fixed number of epochs with no early stopping; the model from the
/// last epoch is the one returned.
pub struct KickTrainer<B: AutodiffBackend> {
    model: KickNet<B>,
    config: TrainingConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> KickTrainer<B> {
    pub fn new(model: KickNet<B>, config: TrainingConfig, device: B::Device) -> Self {
        KickTrainer {
            model,
            config,
            device,
        }
    }

    /// Train the model
    pub fn train(mut self, train_dataset: KickDataset) -> Result<(KickNet<B>, TrainingHistory)> {
        if train_dataset.is_empty() {
            return Err(PenaltyError::Training("training set is empty".to_string()));
        }
        if self.config.batch_size == 0 {
            return Err(PenaltyError::Config("batch_size must be positive".to_string()));
        }

        let batcher = KickBatcher::<B>::new(self.device.clone());
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(self.config.batch_size)
            .shuffle(self.config.split_seed)
            .build(train_dataset);

        let mut optimizer = AdamConfig::new().init::<B, KickNet<B>>();
        let mut history = TrainingHistory::new();
        let epochs = self.config.epochs;

        log::info!(
            "Starting training for {} epochs (batch size {}, lr {})",
            epochs,
            self.config.batch_size,
            self.config.learning_rate
        );

        for epoch in 0..epochs {
            let metrics = self.train_epoch(&mut optimizer, loader.iter())?;
            history.record_epoch(epoch, &metrics);

            if epoch % 10 == 0 || epoch + 1 == epochs {
                log::info!("Epoch {}/{}: {}", epoch + 1, epochs, metrics);
            } else {
                log::debug!("Epoch {}/{}: {}", epoch + 1, epochs, metrics);
            }
        }

        Ok((self.model, history))
    }

    /// Train one epoch
    fn train_epoch<O>(
        &mut self,
        optimizer: &mut O,
        loader: impl Iterator<Item = KickBatch<B>>,
    ) -> Result<Metrics>
    where
        O: Optimizer<KickNet<B>, B>,
    {
        let mut metrics = Metrics::new();

        for batch in loader {
            let batch_size = batch.features.dims()[0];

            let probs = self.model.predict_proba(batch.features);
            let loss = binary_cross_entropy(probs.clone(), batch.targets.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();

            // Accuracy before the update, on the same forward pass
            let correct = count_correct(&to_vec(probs)?, &to_vec(batch.targets)?);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = optimizer.step(self.config.learning_rate, self.model.clone(), grads);

            metrics.update(loss_val, correct, batch_size);
        }

        Ok(metrics)
    }
}

/// Loss and accuracy of a trained model on a held-out set
pub fn evaluate<B: Backend>(
    model: &KickNet<B>,
    dataset: &KickDataset,
    device: &B::Device,
) -> Result<Metrics> {
    let mut metrics = Metrics::new();
    if dataset.is_empty() {
        return Ok(metrics);
    }

    let batch = dataset.to_batch::<B>(device);
    let probs = model.predict_proba(batch.features);
    let loss: f32 = binary_cross_entropy(probs.clone(), batch.targets.clone())
        .into_scalar()
        .elem();
    let correct = count_correct(&to_vec(probs)?, &to_vec(batch.targets)?);

    metrics.update(loss, correct, dataset.len());
    Ok(metrics)
}

/// Train and return the model on the inference backend
pub fn train_model<B: AutodiffBackend>(
    model: KickNet<B>,
    train_dataset: KickDataset,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(KickNet<B::InnerBackend>, TrainingHistory)> {
    let trainer = KickTrainer::new(model, config.clone(), device.clone());
    let (model, history) = trainer.train(train_dataset)?;
    Ok((model.valid(), history))
}

fn to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| PenaltyError::Training(format!("tensor read failed: {:?}", e)))
}
