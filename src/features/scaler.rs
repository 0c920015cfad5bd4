//! Z-score standardization of encoded feature vectors

use serde::{Deserialize, Serialize};

use crate::features::encoding::CanonicalSchema;
use crate::{PenaltyError, Result};

/// Per-column standardization parameters fitted on training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// Columns with zero variance, scaled with a unit std
    pub degenerate_columns: Vec<String>,
}

impl ScalerParams {
    /// Compute population mean and std of every schema column
    ///
    /// A constant column would divide by zero; it gets std = 1 instead, so it
    /// standardizes to 0 for its training value. Spread below f32 resolution
    /// at the column's magnitude counts as constant.
    pub fn fit(matrix: &[Vec<f32>], schema: &CanonicalSchema) -> Result<Self> {
        if matrix.is_empty() {
            return Err(PenaltyError::Dataset(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        for row in matrix {
            check_width(row, schema)?;
        }

        let dim = schema.len();
        let n = matrix.len() as f64;

        let mut mean = vec![0.0f64; dim];
        for row in matrix {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += *x as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        // Two passes so a constant column gives an exact zero
        let mut var = vec![0.0f64; dim];
        for row in matrix {
            for ((v, m), x) in var.iter_mut().zip(&mean).zip(row) {
                let d = *x as f64 - m;
                *v += d * d;
            }
        }

        let mut degenerate_columns = Vec::new();
        let std: Vec<f64> = var
            .iter()
            .zip(&mean)
            .zip(schema.columns())
            .map(|((v, m), column)| {
                let s = (v / n).sqrt();
                if s <= f32::EPSILON as f64 * m.abs().max(1.0) {
                    log::warn!("Column {} has zero variance; using unit std", column);
                    degenerate_columns.push(column.clone());
                    1.0
                } else {
                    s
                }
            })
            .collect();

        log::debug!("Scaler fitted: mean={:?}, std={:?}", mean, std);

        Ok(ScalerParams {
            mean,
            std,
            degenerate_columns,
        })
    }

    /// Standardize one vector: (x - mean) / std
    pub fn apply(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.mean.len() {
            return Err(PenaltyError::SchemaMismatch {
                column: "<vector width>".to_string(),
                value: format!("expected {}, got {}", self.mean.len(), vector.len()),
            });
        }

        Ok(vector
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(x, (m, s))| ((*x as f64 - m) / s) as f32)
            .collect())
    }

    /// Standardize every row of a matrix
    pub fn apply_all(&self, matrix: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        matrix.iter().map(|row| self.apply(row)).collect()
    }
}

fn check_width(row: &[f32], schema: &CanonicalSchema) -> Result<()> {
    if row.len() == schema.len() {
        Ok(())
    } else {
        Err(PenaltyError::SchemaMismatch {
            column: "<vector width>".to_string(),
            value: format!("expected {}, got {}", schema.len(), row.len()),
        })
    }
}
