//! CSV loader for the penalty dataset
//!
//! Expected header (surrounding whitespace is ignored):
//! `ID, Jugador, Velocidad_kmh, Angulo_grados, Distancia_Portero_m,
//! Pie_Dominante, Presion_Partido, Gol` (or `Gol (Target)`).
//!
//! `ID` and `Jugador` identify the row and are never used as features, so
//! they are not deserialized at all.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::features::encoding::{ANGLE_COLUMN, DISTANCE_COLUMN, SPEED_COLUMN};
use crate::{KickRecord, LabeledKick, PenaltyError, Result};

/// One CSV row as it appears on disk
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Velocidad_kmh")]
    speed_kmh: f32,
    #[serde(rename = "Angulo_grados")]
    angle_deg: f32,
    #[serde(rename = "Distancia_Portero_m")]
    keeper_distance_m: f32,
    #[serde(rename = "Pie_Dominante")]
    dominant_foot: String,
    #[serde(rename = "Presion_Partido")]
    match_pressure: String,
    #[serde(rename = "Gol", alias = "Gol (Target)")]
    goal: u8,
}

impl CsvRow {
    fn into_kick(self, row: usize) -> Result<LabeledKick> {
        let goal = match self.goal {
            0 => false,
            1 => true,
            other => {
                return Err(PenaltyError::Dataset(format!(
                    "row {}: goal label must be 0 or 1, got {}",
                    row, other
                )))
            }
        };

        for (column, value) in [
            (SPEED_COLUMN, self.speed_kmh),
            (ANGLE_COLUMN, self.angle_deg),
            (DISTANCE_COLUMN, self.keeper_distance_m),
        ] {
            if !value.is_finite() {
                return Err(PenaltyError::Dataset(format!(
                    "row {}: {} must be a finite number, got {}",
                    row, column, value
                )));
            }
        }

        Ok(LabeledKick {
            record: KickRecord {
                speed_kmh: self.speed_kmh,
                angle_deg: self.angle_deg,
                keeper_distance_m: self.keeper_distance_m,
                dominant_foot: self.dominant_foot,
                match_pressure: self.match_pressure,
            },
            goal,
        })
    }
}

/// Load labelled kicks from a CSV file
pub fn load(path: impl AsRef<Path>) -> Result<Vec<LabeledKick>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PenaltyError::DatasetNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    let kicks = from_reader(file)?;

    log::info!("Loaded {} kicks from {}", kicks.len(), path.display());
    Ok(kicks)
}

/// Load labelled kicks from any CSV source
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<LabeledKick>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut kicks = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        kicks.push(row?.into_kick(i + 2)?);
    }

    if kicks.is_empty() {
        return Err(PenaltyError::Dataset(
            "dataset contains no records".to_string(),
        ));
    }

    Ok(kicks)
}
