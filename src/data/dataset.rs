//! Burn Dataset implementation for encoded kicks
//!
//! Samples hold already encoded and standardized feature vectors, so the
//! batcher only has to stack them.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{PenaltyError, Result};

/// A single training sample
#[derive(Debug, Clone)]
pub struct KickSample {
    /// Standardized features, aligned with the canonical schema
    pub features: Vec<f32>,
    /// 1.0 for a goal, 0.0 otherwise
    pub goal: f32,
}

/// In-memory kick dataset
#[derive(Debug, Clone)]
pub struct KickDataset {
    samples: Vec<KickSample>,
    width: usize,
}

impl KickDataset {
    /// Build a dataset from feature rows and labels
    pub fn new(features: Vec<Vec<f32>>, labels: &[bool]) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(PenaltyError::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let width = features.first().map(|f| f.len()).unwrap_or(0);
        if features.iter().any(|f| f.len() != width) {
            return Err(PenaltyError::Training(
                "feature rows have inconsistent widths".to_string(),
            ));
        }

        let samples = features
            .into_iter()
            .zip(labels)
            .map(|(features, &goal)| KickSample {
                features,
                goal: if goal { 1.0 } else { 0.0 },
            })
            .collect();

        Ok(KickDataset { samples, width })
    }

    /// Number of features per sample
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stack every sample into a single batch
    pub fn to_batch<B: Backend>(&self, device: &B::Device) -> KickBatch<B> {
        KickBatcher::<B>::new(device.clone()).stack(&self.samples)
    }
}

impl Dataset<KickSample> for KickDataset {
    fn get(&self, index: usize) -> Option<KickSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Batch of kicks for training
#[derive(Debug, Clone)]
pub struct KickBatch<B: Backend> {
    /// Features: [batch, width]
    pub features: Tensor<B, 2>,
    /// Goal labels: [batch, 1]
    pub targets: Tensor<B, 2>,
}

/// Batcher for creating training batches
#[derive(Clone)]
pub struct KickBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> KickBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        KickBatcher { device }
    }

    fn stack(&self, items: &[KickSample]) -> KickBatch<B> {
        let batch_size = items.len();
        let width = items.first().map(|s| s.features.len()).unwrap_or(0);

        let features: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();
        let targets: Vec<f32> = items.iter().map(|s| s.goal).collect();

        KickBatch {
            features: Tensor::<B, 1>::from_floats(features.as_slice(), &self.device)
                .reshape([batch_size, width]),
            targets: Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device)
                .reshape([batch_size, 1]),
        }
    }
}

impl<B: Backend> Batcher<B, KickSample, KickBatch<B>> for KickBatcher<B> {
    fn batch(&self, items: Vec<KickSample>, _device: &B::Device) -> KickBatch<B> {
        self.stack(&items)
    }
}

/// Row indices of a train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Shuffle `n` row indices with a fixed seed and hold out `test_fraction` of them
    ///
    /// The held-out count is rounded up, so any positive fraction keeps at
    /// least one row for evaluation.
    pub fn random(n: usize, test_fraction: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(PenaltyError::Config(format!(
                "test_fraction must be in [0, 1), got {}",
                test_fraction
            )));
        }

        let n_test = (n as f32 * test_fraction).ceil() as usize;
        if n_test >= n {
            return Err(PenaltyError::Training(format!(
                "{} rows leave nothing to train on after holding out {}",
                n, n_test
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test = indices[..n_test].to_vec();
        let train = indices[n_test..].to_vec();

        log::info!(
            "Split {} rows: train={}, test={}",
            n,
            train.len(),
            test.len()
        );

        Ok(SplitIndices { train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_split_is_deterministic() {
        let a = SplitIndices::random(20, 0.2, 42).unwrap();
        let b = SplitIndices::random(20, 0.2, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 4);
        assert_eq!(a.train.len(), 16);

        let mut all: Vec<usize> = a.train.iter().chain(a.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_rounds_test_count_up() {
        let split = SplitIndices::random(6, 0.2, 1).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 4);
    }

    #[test]
    fn test_split_without_holdout() {
        let split = SplitIndices::random(5, 0.0, 1).unwrap();
        assert!(split.test.is_empty());
        assert_eq!(split.train.len(), 5);
    }

    #[test]
    fn test_split_rejects_bad_inputs() {
        assert!(SplitIndices::random(10, 1.0, 1).is_err());
        assert!(SplitIndices::random(1, 0.5, 1).is_err());
    }

    #[test]
    fn test_dataset_rejects_mismatched_labels() {
        let features = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert!(KickDataset::new(features, &[true]).is_err());
    }

    #[test]
    fn test_batcher_shapes() {
        let device = Default::default();
        let features = vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]];
        let dataset = KickDataset::new(features, &[true, false]).unwrap();
        assert_eq!(dataset.width(), 3);

        let batch = dataset.to_batch::<TestBackend>(&device);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 1]);

        let targets = batch.targets.into_data();
        assert_eq!(targets.as_slice::<f32>().unwrap(), &[1.0, 0.0]);
    }
}
