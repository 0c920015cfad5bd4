//! Training metrics and evaluation

use std::fmt;

/// Metrics accumulated during training/evaluation
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Sum of per-batch mean losses
    pub total_loss: f64,
    /// Number of correct goal/no-goal predictions
    pub correct: usize,
    /// Total predictions
    pub total_predictions: usize,
    /// Number of batches accumulated
    pub batch_count: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update metrics with a batch result
    pub fn update(&mut self, loss: f32, correct: usize, batch_size: usize) {
        self.total_loss += loss as f64;
        self.correct += correct;
        self.total_predictions += batch_size;
        self.batch_count += 1;
    }

    /// Get average loss per batch
    pub fn avg_loss(&self) -> f64 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.total_loss / self.batch_count as f64
        }
    }

    /// Fraction of correct predictions
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss={:.4}, acc={:.1}%",
            self.avg_loss(),
            self.accuracy() * 100.0
        )
    }
}

/// Count probabilities on the right side of 0.5
pub fn count_correct(probs: &[f32], targets: &[f32]) -> usize {
    probs
        .iter()
        .zip(targets.iter())
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count()
}

/// Summary of one training epoch
#[derive(Debug, Clone)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// Per-epoch training history
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, epoch: usize, metrics: &Metrics) {
        self.epochs.push(EpochRecord {
            epoch,
            loss: metrics.avg_loss(),
            accuracy: metrics.accuracy(),
        });
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}
