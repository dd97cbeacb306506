use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// The sections of the measurement side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementType {
    Distance,
    Area,
    Elevation,
    Annotation,
}

impl MeasurementType {
    pub fn as_tag(&self) -> &'static str {
        match self {
            MeasurementType::Distance => "distance",
            MeasurementType::Area => "area",
            MeasurementType::Elevation => "elevation",
            MeasurementType::Annotation => "annotation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MeasurementType::Distance => "Distances",
            MeasurementType::Area => "Areas",
            MeasurementType::Elevation => "Elevations",
            MeasurementType::Annotation => "Annotations",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim() {
            "distance" => Ok(MeasurementType::Distance),
            "area" => Ok(MeasurementType::Area),
            "elevation" => Ok(MeasurementType::Elevation),
            "annotation" => Ok(MeasurementType::Annotation),
            _ => Err(AppError::Parse(format!("invalid measurement type: {value}"))),
        }
    }
}

/// One measurement belonging to exactly one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub id: String,
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub measured_at: DateTime<Utc>,
}

/// Pure, synchronous filter of already-loaded records; never fetches.
pub fn records_of_type(
    records: &[MeasurementRecord],
    kind: MeasurementType,
) -> Vec<MeasurementRecord> {
    records
        .iter()
        .filter(|record| record.kind == kind)
        .cloned()
        .collect()
}

/// The data-fetch collaborator: one async retrieval of all measurement
/// records for an item.
#[async_trait]
pub trait FetchMeasurements: Send + Sync {
    async fn fetch_measurements(&self, item_id: &str) -> AppResult<Vec<MeasurementRecord>>;
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, item_id: &str, kind: MeasurementType) -> MeasurementRecord {
    MeasurementRecord {
        id: id.into(),
        item_id: item_id.into(),
        kind,
        label: format!("{} {}", kind.display_name(), id),
        value: 42.0,
        unit: "m".into(),
        measured_at: Utc::now(),
    }
}
