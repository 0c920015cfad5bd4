//! Model inference for single-kick predictions

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use tokio::task::JoinHandle;

use crate::features::{CanonicalSchema, SchemaEncoder, ScalerParams, SparseFeatures};
use crate::model::KickNet;
use crate::{KickInput, KickRecord, PenaltyError, Prediction, Result};

/// Map a sparse encoding onto the canonical schema
///
/// Values are taken by column name in schema order; schema columns the
/// record did not produce are zero, and produced columns unknown to the
/// schema are dropped. Fails only when nothing overlaps.
pub fn reconcile(sparse: &SparseFeatures, schema: &CanonicalSchema) -> Result<Vec<f32>> {
    let mut overlap = 0;
    let dense: Vec<f32> = schema
        .columns()
        .iter()
        .map(|column| match sparse.get(column) {
            Some(value) => {
                overlap += 1;
                *value
            }
            None => 0.0,
        })
        .collect();

    if overlap == 0 {
        return Err(PenaltyError::SchemaMismatch {
            column: "<record>".to_string(),
            value: format!("no overlap with schema columns {:?}", schema.columns()),
        });
    }

    for column in sparse.keys().filter(|c| !schema.contains(c)) {
        log::debug!("Dropping column {} not present at training time", column);
    }

    Ok(dense)
}

/// Everything fitted at training time, bundled for prediction
///
/// Immutable once built; cloning shares the underlying tensors.
#[derive(Debug, Clone)]
pub struct TrainedPipeline<B: Backend> {
    schema: CanonicalSchema,
    scaler: ScalerParams,
    model: KickNet<B>,
    device: B::Device,
}

impl<B: Backend> TrainedPipeline<B> {
    pub fn new(
        schema: CanonicalSchema,
        scaler: ScalerParams,
        model: KickNet<B>,
        device: B::Device,
    ) -> Self {
        TrainedPipeline {
            schema,
            scaler,
            model,
            device,
        }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &ScalerParams {
        &self.scaler
    }

    pub fn model(&self) -> &KickNet<B> {
        &self.model
    }

    /// Encode, align and standardize a record exactly as training rows were
    pub fn features(&self, record: &KickRecord) -> Result<Vec<f32>> {
        let sparse = SchemaEncoder::transform_one(record, &self.schema)?;
        let dense = reconcile(&sparse, &self.schema)?;
        self.scaler.apply(&dense)
    }

    /// Predict the goal probability of one kick
    pub fn predict(&self, record: &KickRecord) -> Result<Prediction> {
        let features = self.features(record)?;

        let input = Tensor::<B, 1>::from_floats(features.as_slice(), &self.device)
            .reshape([1, self.schema.len()]);
        let probability: f32 = self
            .model
            .predict_proba(input)
            .reshape([1])
            .into_scalar()
            .elem();

        if !probability.is_finite() {
            return Err(PenaltyError::Prediction(format!(
                "model produced a non-finite probability for {:?}",
                record
            )));
        }

        Ok(Prediction {
            probability: probability.clamp(0.0, 1.0),
        })
    }

    /// Parse raw input and predict
    pub fn predict_input(&self, input: &KickInput) -> Result<Prediction> {
        let record = input.parse()?;
        self.predict(&record)
    }

    /// Run a prediction on Tokio's blocking pool
    ///
    /// Must be called from within a Tokio runtime. The returned handle
    /// resolves to the same result as [`predict_input`](Self::predict_input).
    pub fn spawn_predict(&self, input: KickInput) -> JoinHandle<Result<Prediction>> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.predict_input(&input))
    }
}

/// Await a spawned prediction, folding join failures into the crate error
pub async fn join_prediction(handle: JoinHandle<Result<Prediction>>) -> Result<Prediction> {
    handle
        .await
        .map_err(|e| PenaltyError::Task(e.to_string()))?
}

/// Format a prediction for display
pub fn format_prediction(record: &KickRecord, pred: &Prediction) -> String {
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {:.1} km/h, {:.1}°, keeper {:.2} m
│  Foot: {}, pressure: {}
├─────────────────────────────────────────────────┤
│  Goal probability: {:.2}%
│  Prediction:       {}
└─────────────────────────────────────────────────┘
"#,
        record.speed_kmh,
        record.angle_deg,
        record.keeper_distance_m,
        record.dominant_foot,
        record.match_pressure,
        pred.percentage(),
        pred.outcome()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encoding::pressure_column;
    use crate::model::KickNetConfig;
    use crate::Outcome;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn training_rows() -> Vec<KickRecord> {
        vec![
            KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja"),
            KickRecord::new(70.0, 10.0, 0.3, "Izquierdo", "Alta"),
            KickRecord::new(88.0, 20.0, 0.6, "Derecho", "Media"),
            KickRecord::new(91.0, 25.0, 0.7, "Izquierdo", "Media"),
            KickRecord::new(78.0, 12.0, 0.4, "Derecho", "Alta"),
        ]
    }

    fn pipeline() -> TrainedPipeline<TestBackend> {
        let device = Default::default();
        let (encoded, schema) = SchemaEncoder::default()
            .fit_transform(&training_rows())
            .unwrap();
        let scaler = ScalerParams::fit(&encoded, &schema).unwrap();
        let model = KickNet::seeded(&device, &KickNetConfig::new(schema.len(), vec![16, 8]), 5);
        TrainedPipeline::new(schema, scaler, model, device)
    }

    #[test]
    fn test_reconcile_fills_and_orders() {
        let pipeline = pipeline();
        let schema = pipeline.schema();

        let mut sparse = SparseFeatures::new();
        sparse.insert("Presion_Media".to_string(), 1.0);
        sparse.insert("Velocidad_kmh".to_string(), 90.0);
        sparse.insert("Pie_Dominante".to_string(), 1.0);

        let dense = reconcile(&sparse, schema).unwrap();
        assert_eq!(dense.len(), schema.len());
        for (column, value) in schema.columns().iter().zip(&dense) {
            assert_eq!(*value, sparse.get(column).copied().unwrap_or(0.0));
        }
    }

    #[test]
    fn test_reconcile_independent_of_insertion_order() {
        let schema = pipeline().schema().clone();
        let entries = [
            ("Angulo_grados", 22.0),
            ("Presion_Baja", 1.0),
            ("Distancia_Portero_m", 0.5),
            ("Velocidad_kmh", 84.0),
            ("Pie_Dominante", 0.0),
        ];

        let forward: SparseFeatures = entries.iter().map(|(c, v)| (c.to_string(), *v)).collect();
        let backward: SparseFeatures = entries
            .iter()
            .rev()
            .map(|(c, v)| (c.to_string(), *v))
            .collect();

        let a = reconcile(&forward, &schema).unwrap();
        let b = reconcile(&backward, &schema).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![84.0, 22.0, 0.5, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_reconcile_drops_unknown_columns() {
        let schema = pipeline().schema().clone();
        let mut sparse = SparseFeatures::new();
        sparse.insert("Velocidad_kmh".to_string(), 90.0);
        sparse.insert(pressure_column("Extrema"), 1.0);

        let dense = reconcile(&sparse, &schema).unwrap();
        assert_eq!(dense, vec![90.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reconcile_without_overlap() {
        let schema = pipeline().schema().clone();
        let mut sparse = SparseFeatures::new();
        sparse.insert("Unrelated".to_string(), 1.0);

        assert!(matches!(
            reconcile(&sparse, &schema),
            Err(PenaltyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_inference_matches_training_encoding() {
        let pipeline = pipeline();
        let rows = training_rows();
        let (encoded, _) = SchemaEncoder::default().fit_transform(&rows).unwrap();

        for (row, expected) in rows.iter().zip(&encoded) {
            let sparse = SchemaEncoder::transform_one(row, pipeline.schema()).unwrap();
            let dense = reconcile(&sparse, pipeline.schema()).unwrap();
            assert_eq!(&dense, expected);
        }
    }

    #[test]
    fn test_reference_category_encodes_to_zero_indicators() {
        let pipeline = pipeline();
        let record = KickRecord::new(80.0, 18.0, 0.5, "Derecho", "Alta");

        let sparse = SchemaEncoder::transform_one(&record, pipeline.schema()).unwrap();
        let dense = reconcile(&sparse, pipeline.schema()).unwrap();
        assert_eq!(&dense[4..], &[0.0, 0.0]);
    }

    #[test]
    fn test_predictions_are_repeatable() {
        let pipeline = pipeline();
        let record = KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja");

        let a = pipeline.predict(&record).unwrap();
        let b = pipeline.predict(&record).unwrap();
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
    }

    #[test]
    fn test_probability_in_range() {
        let pipeline = pipeline();
        let extremes = [
            KickRecord::new(1.0e6, -1.0e6, 1.0e6, "Derecho", "Media"),
            KickRecord::new(-1.0e6, 1.0e6, -1.0e6, "Izquierdo", "Alta"),
            KickRecord::new(0.0, 0.0, 0.0, "Izquierdo", "Baja"),
        ];

        for record in &extremes {
            let p = pipeline.predict(record).unwrap().probability;
            assert!((0.0..=1.0).contains(&p), "probability out of range: {}", p);
        }
    }

    #[test]
    fn test_non_finite_probability_is_a_prediction_error() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let pipeline = pipeline();
        let mut scaler = pipeline.scaler().clone();
        scaler.mean[0] = f64::NAN;
        // No hidden layer, so the NaN reaches the logit directly
        let model: KickNet<TestBackend> = KickNet::seeded(&device, &KickNetConfig::new(pipeline.schema().len(), vec![]), 5);
        let broken = TrainedPipeline::new(pipeline.schema().clone(), scaler, model, device);

        let record = KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja");
        assert!(matches!(
            broken.predict(&record),
            Err(PenaltyError::Prediction(_))
        ));
    }

    #[test]
    fn test_unknown_foot_rejected() {
        let pipeline = pipeline();
        let record = KickRecord::new(95.0, 30.0, 0.9, "Ambidiestro", "Baja");

        assert!(matches!(
            pipeline.predict(&record),
            Err(PenaltyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_unseen_pressure_is_zero_filled() {
        let pipeline = pipeline();
        let unseen = KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Extrema");
        let reference = KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Alta");

        assert_eq!(
            pipeline.features(&unseen).unwrap(),
            pipeline.features(&reference).unwrap()
        );
    }

    #[test]
    fn test_predict_input_invalid_number() {
        let pipeline = pipeline();
        let input = KickInput {
            speed_kmh: "95".to_string(),
            angle_deg: "thirty".to_string(),
            keeper_distance_m: "0.9".to_string(),
            dominant_foot: "Derecho".to_string(),
            match_pressure: "Baja".to_string(),
        };

        assert!(matches!(
            pipeline.predict_input(&input),
            Err(PenaltyError::InvalidInput { field: "angle_deg", .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_predict_matches_sync() {
        let pipeline = pipeline();
        let input = KickInput {
            speed_kmh: "95".to_string(),
            angle_deg: "30".to_string(),
            keeper_distance_m: "0.9".to_string(),
            dominant_foot: "Derecho".to_string(),
            match_pressure: "Baja".to_string(),
        };

        let expected = pipeline.predict_input(&input).unwrap();
        let spawned = join_prediction(pipeline.spawn_predict(input)).await.unwrap();
        assert_eq!(expected.probability.to_bits(), spawned.probability.to_bits());
    }

    #[test]
    fn test_format_prediction() {
        let record = KickRecord::new(95.0, 30.0, 0.9, "Derecho", "Baja");
        let pred = Prediction { probability: 0.75 };
        assert_eq!(pred.outcome(), Outcome::Goal);

        let text = format_prediction(&record, &pred);
        assert!(text.contains("Goal probability: 75.00%"));
        assert!(text.contains("Prediction:       Goal"));
    }
}
