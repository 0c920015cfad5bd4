//! Penalty kick goal prediction
//!
//! Encodes kick attributes into a fixed feature space, standardizes them and
//! trains a small feed-forward network that estimates the probability of a goal.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Dominant foot of the kicker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DominantFoot {
    Right,
    Left,
}

impl DominantFoot {
    /// Label used in the dataset
    pub fn label(&self) -> &'static str {
        match self {
            DominantFoot::Right => "Derecho",
            DominantFoot::Left => "Izquierdo",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Derecho" => Some(DominantFoot::Right),
            "Izquierdo" => Some(DominantFoot::Left),
            _ => None,
        }
    }

    /// Binary encoding (right = 1, left = 0)
    pub fn encoded(&self) -> f32 {
        match self {
            DominantFoot::Right => 1.0,
            DominantFoot::Left => 0.0,
        }
    }
}

impl fmt::Display for DominantFoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single penalty kick observation (features only)
///
/// Categorical fields keep their raw labels: the pressure categories are only
/// known once a dataset has been seen, and an out-of-domain foot must surface
/// as an encoding error rather than a load error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickRecord {
    pub speed_kmh: f32,
    pub angle_deg: f32,
    pub keeper_distance_m: f32,
    pub dominant_foot: String,
    pub match_pressure: String,
}

impl KickRecord {
    pub fn new(
        speed_kmh: f32,
        angle_deg: f32,
        keeper_distance_m: f32,
        dominant_foot: &str,
        match_pressure: &str,
    ) -> Self {
        KickRecord {
            speed_kmh,
            angle_deg,
            keeper_distance_m,
            dominant_foot: dominant_foot.to_string(),
            match_pressure: match_pressure.to_string(),
        }
    }
}

/// A training row: kick features plus the observed outcome
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledKick {
    pub record: KickRecord,
    pub goal: bool,
}

/// Raw user input as typed into a form or passed on the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KickInput {
    pub speed_kmh: String,
    pub angle_deg: String,
    pub keeper_distance_m: String,
    pub dominant_foot: String,
    pub match_pressure: String,
}

impl KickInput {
    /// Parse the numeric fields into a record
    ///
    /// Categorical labels are passed through untouched; validating them
    /// against the trained schema is the encoder's job.
    pub fn parse(&self) -> Result<KickRecord> {
        Ok(KickRecord {
            speed_kmh: parse_finite("speed_kmh", &self.speed_kmh)?,
            angle_deg: parse_finite("angle_deg", &self.angle_deg)?,
            keeper_distance_m: parse_finite("keeper_distance_m", &self.keeper_distance_m)?,
            dominant_foot: self.dominant_foot.trim().to_string(),
            match_pressure: self.match_pressure.trim().to_string(),
        })
    }
}

fn parse_finite(field: &'static str, raw: &str) -> Result<f32> {
    let invalid = || PenaltyError::InvalidInput {
        field,
        value: raw.to_string(),
    };
    let value: f32 = raw.trim().parse().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Predicted outcome of a kick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Goal,
    Miss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Goal => write!(f, "Goal"),
            Outcome::Miss => write!(f, "No goal"),
        }
    }
}

/// Model prediction output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability of a goal in [0, 1]
    pub probability: f32,
}

impl Prediction {
    pub fn percentage(&self) -> f32 {
        self.probability * 100.0
    }

    /// Goal when the probability is at least 50%
    pub fn outcome(&self) -> Outcome {
        if self.probability >= 0.5 {
            Outcome::Goal
        } else {
            Outcome::Miss
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Goal probability: {:.2}% ({})",
            self.percentage(),
            self.outcome()
        )
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PenaltyError {
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Schema mismatch on {column}: {value}")]
    SchemaMismatch { column: String, value: String },

    #[error("Invalid input for {field}: '{value}' is not a finite number")]
    InvalidInput { field: &'static str, value: String },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Prediction task failed: {0}")]
    Task(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PenaltyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub training: TrainingConfig,
    pub model: ModelConfig,
    pub encoding: EncodingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of rows held out for evaluation
    pub test_fraction: f32,
    pub split_seed: u64,
    /// Seed for weight initialization; unset leaves it to the backend RNG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 100,
            batch_size: 4,
            learning_rate: 1e-3,
            test_fraction: 0.2,
            split_seed: 42,
            init_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_dims: Vec<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            hidden_dims: vec![16, 8],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Pressure category encoded as all-zero indicators.
    /// Defaults to the alphabetically first observed category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dataset_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dataset_path: "data/penaltis.csv".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PenaltyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PenaltyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PenaltyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
