//! Categorical encoding with a canonical column list
//!
//! Fitting fixes the ordered list of feature columns once:
//!
//! `Velocidad_kmh, Angulo_grados, Distancia_Portero_m, Pie_Dominante,
//! Presion_<category>...`
//!
//! with one pressure indicator for every observed category except the
//! reference. Encoding a single record afterwards only yields the columns that
//! record produces; aligning that sparse result with the schema happens in
//! [`crate::predict::reconcile`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{DominantFoot, EncodingConfig, KickRecord, PenaltyError, Result};

pub const SPEED_COLUMN: &str = "Velocidad_kmh";
pub const ANGLE_COLUMN: &str = "Angulo_grados";
pub const DISTANCE_COLUMN: &str = "Distancia_Portero_m";
pub const FOOT_COLUMN: &str = "Pie_Dominante";
pub const PRESSURE_COLUMN: &str = "Presion_Partido";

/// Numeric columns, in schema order
pub const NUMERIC_COLUMNS: [&str; 3] = [SPEED_COLUMN, ANGLE_COLUMN, DISTANCE_COLUMN];

const PRESSURE_PREFIX: &str = "Presion";

/// Column name -> value for the columns a single record produced
pub type SparseFeatures = HashMap<String, f32>;

/// Name of the indicator column for a pressure category
pub fn pressure_column(category: &str) -> String {
    format!("{}_{}", PRESSURE_PREFIX, category)
}

/// Ordered feature columns fixed at training time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    columns: Vec<String>,
    pressure_reference: String,
}

impl CanonicalSchema {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Pressure category represented by all indicators being zero
    pub fn pressure_reference(&self) -> &str {
        &self.pressure_reference
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
}

/// Fits the canonical schema and encodes records against it
#[derive(Debug, Clone, Default)]
pub struct SchemaEncoder {
    pressure_reference: Option<String>,
}

impl SchemaEncoder {
    pub fn new(config: &EncodingConfig) -> Self {
        SchemaEncoder {
            pressure_reference: config.pressure_reference.clone(),
        }
    }

    /// Use an explicit reference category instead of the alphabetically first one
    pub fn with_reference(reference: &str) -> Self {
        SchemaEncoder {
            pressure_reference: Some(reference.to_string()),
        }
    }

    /// Fix the schema from the training rows and encode every row densely
    pub fn fit_transform(&self, rows: &[KickRecord]) -> Result<(Vec<Vec<f32>>, CanonicalSchema)> {
        let categories: BTreeSet<&str> = rows.iter().map(|r| r.match_pressure.as_str()).collect();

        let reference = match &self.pressure_reference {
            Some(reference) if categories.contains(reference.as_str()) => reference.clone(),
            Some(reference) => {
                return Err(PenaltyError::Config(format!(
                    "pressure reference '{}' not among observed categories {:?}",
                    reference, categories
                )))
            }
            None => categories
                .iter()
                .next()
                .map(|c| c.to_string())
                .ok_or_else(|| PenaltyError::Dataset("no rows to encode".to_string()))?,
        };

        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.push(FOOT_COLUMN.to_string());
        let indicators: Vec<&str> = categories
            .iter()
            .copied()
            .filter(|c| *c != reference)
            .collect();
        columns.extend(indicators.iter().map(|c| pressure_column(c)));

        let schema = CanonicalSchema {
            columns,
            pressure_reference: reference,
        };

        log::info!(
            "Canonical schema ({} columns, reference pressure '{}'): {:?}",
            schema.len(),
            schema.pressure_reference,
            schema.columns
        );

        let encoded = rows
            .iter()
            .map(|row| {
                let mut dense = vec![
                    row.speed_kmh,
                    row.angle_deg,
                    row.keeper_distance_m,
                    encode_foot(&row.dominant_foot)?,
                ];
                dense.extend(
                    indicators
                        .iter()
                        .map(|c| if *c == row.match_pressure { 1.0 } else { 0.0 }),
                );
                Ok(dense)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((encoded, schema))
    }

    /// Encode one record into the columns it produces
    ///
    /// The pressure indicator is only emitted for a non-reference category;
    /// a reference-category record has no indicator at all, which aligns to
    /// all zeros. Categories never seen in training still produce a column,
    /// which reconciliation then drops.
    pub fn transform_one(record: &KickRecord, schema: &CanonicalSchema) -> Result<SparseFeatures> {
        let mut sparse = SparseFeatures::with_capacity(NUMERIC_COLUMNS.len() + 2);
        sparse.insert(SPEED_COLUMN.to_string(), record.speed_kmh);
        sparse.insert(ANGLE_COLUMN.to_string(), record.angle_deg);
        sparse.insert(DISTANCE_COLUMN.to_string(), record.keeper_distance_m);
        sparse.insert(FOOT_COLUMN.to_string(), encode_foot(&record.dominant_foot)?);

        if record.match_pressure != schema.pressure_reference {
            sparse.insert(pressure_column(&record.match_pressure), 1.0);
        }

        Ok(sparse)
    }
}

fn encode_foot(label: &str) -> Result<f32> {
    DominantFoot::from_label(label)
        .map(|foot| foot.encoded())
        .ok_or_else(|| PenaltyError::SchemaMismatch {
            column: FOOT_COLUMN.to_string(),
            value: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<KickRecord> {
        vec![
            KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja"),
            KickRecord::new(70.0, 10.0, 0.3, "Izquierdo", "Alta"),
            KickRecord::new(88.0, 20.0, 0.6, "Derecho", "Media"),
            KickRecord::new(91.0, 25.0, 0.7, "Izquierdo", "Media"),
        ]
    }

    #[test]
    fn test_schema_length() {
        let (encoded, schema) = SchemaEncoder::default().fit_transform(&rows()).unwrap();

        // 3 numerics + foot + (3 pressure categories - 1)
        assert_eq!(schema.len(), 3 + 1 + 2);
        assert!(encoded.iter().all(|row| row.len() == schema.len()));
    }

    #[test]
    fn test_schema_length_with_two_categories() {
        let rows = vec![
            KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja"),
            KickRecord::new(70.0, 10.0, 0.3, "Izquierdo", "Media"),
        ];
        let (_, schema) = SchemaEncoder::default().fit_transform(&rows).unwrap();
        assert_eq!(schema.len(), 3 + 1 + 1);
        assert_eq!(schema.columns()[4], "Presion_Media");
    }

    #[test]
    fn test_default_reference_is_alphabetical_first() {
        let (encoded, schema) = SchemaEncoder::default().fit_transform(&rows()).unwrap();

        assert_eq!(schema.pressure_reference(), "Alta");
        assert_eq!(
            schema.columns(),
            &[
                "Velocidad_kmh",
                "Angulo_grados",
                "Distancia_Portero_m",
                "Pie_Dominante",
                "Presion_Baja",
                "Presion_Media",
            ]
        );
        assert_eq!(encoded[0], vec![95.0, 30.0, 0.9, 1.0, 1.0, 0.0]);
        // Reference row: all indicators zero
        assert_eq!(encoded[1], vec![70.0, 10.0, 0.3, 0.0, 0.0, 0.0]);
        assert_eq!(encoded[2], vec![88.0, 20.0, 0.6, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_explicit_reference_scenario() {
        let (encoded, schema) = SchemaEncoder::with_reference("Baja")
            .fit_transform(&rows())
            .unwrap();

        assert_eq!(schema.pressure_reference(), "Baja");
        let record = &rows()[0];
        let sparse = SchemaEncoder::transform_one(record, &schema).unwrap();

        assert_eq!(sparse[FOOT_COLUMN], 1.0);
        assert!(!sparse.contains_key("Presion_Media"));
        assert!(!sparse.contains_key("Presion_Alta"));

        let media = schema.position("Presion_Media").unwrap();
        let alta = schema.position("Presion_Alta").unwrap();
        let foot = schema.position(FOOT_COLUMN).unwrap();
        assert_eq!(encoded[0][media], 0.0);
        assert_eq!(encoded[0][alta], 0.0);
        assert_eq!(encoded[0][foot], 1.0);
    }

    #[test]
    fn test_unobserved_reference_rejected() {
        let result = SchemaEncoder::with_reference("Extrema").fit_transform(&rows());
        assert!(matches!(result, Err(PenaltyError::Config(_))));
    }

    #[test]
    fn test_transform_one_is_idempotent() {
        let (_, schema) = SchemaEncoder::default().fit_transform(&rows()).unwrap();
        let record = KickRecord::new(80.0, 15.0, 0.5, "Izquierdo", "Alta");

        let first = SchemaEncoder::transform_one(&record, &schema).unwrap();
        let second = SchemaEncoder::transform_one(&record, &schema).unwrap();
        assert_eq!(first, second);
        // Reference category produces no indicator
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_transform_one_emits_own_indicator() {
        let (_, schema) = SchemaEncoder::default().fit_transform(&rows()).unwrap();
        let record = KickRecord::new(80.0, 15.0, 0.5, "Derecho", "Media");

        let sparse = SchemaEncoder::transform_one(&record, &schema).unwrap();
        assert_eq!(sparse.get("Presion_Media"), Some(&1.0));
        assert!(!sparse.contains_key("Presion_Baja"));
    }

    #[test]
    fn test_unknown_foot_is_schema_mismatch() {
        let (_, schema) = SchemaEncoder::default().fit_transform(&rows()).unwrap();
        let record = KickRecord::new(80.0, 15.0, 0.5, "Ambidiestro", "Media");

        match SchemaEncoder::transform_one(&record, &schema) {
            Err(PenaltyError::SchemaMismatch { column, value }) => {
                assert_eq!(column, FOOT_COLUMN);
                assert_eq!(value, "Ambidiestro");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_foot_fails_training_encoding() {
        let mut rows = rows();
        rows.push(KickRecord::new(80.0, 15.0, 0.5, "derecho", "Media"));
        assert!(matches!(
            SchemaEncoder::default().fit_transform(&rows),
            Err(PenaltyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_rows() {
        assert!(matches!(
            SchemaEncoder::default().fit_transform(&[]),
            Err(PenaltyError::Dataset(_))
        ));
    }
}
