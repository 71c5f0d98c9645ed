use crate::ids::{CaregiverId, PatientId, ZoneId};
use safezone_geo::{BoundingBox, Coordinate, ZoneShape, bounding_box};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub type EpochMillis = u64;

pub fn now_epoch_millis() -> EpochMillis {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as EpochMillis
}

/// A committed safe zone. Edges run between consecutive points and the
/// outline closes from the last point back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub points: Vec<Coordinate>,
}

impl Zone {
    pub fn new(id: ZoneId, points: Vec<Coordinate>) -> Self {
        Self { id, points }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        bounding_box(&self.points)
    }

    /// What gets sent to the backend: the envelope only. An outline with
    /// no points has an all-zero envelope.
    pub fn to_record(&self) -> ZoneRecord {
        ZoneRecord {
            id: Some(self.id.clone()),
            coordinate_range: self.bounding_box().unwrap_or_default(),
            coordinates: None,
        }
    }

    /// Resolves a stored record into an outline. Records without an id get
    /// a fresh one so they can still be addressed locally.
    pub fn from_record(record: ZoneRecord) -> Self {
        let points = record.shape().into_polygon();
        let id = record.id.unwrap_or_else(ZoneId::generate);
        Self { id, points }
    }
}

/// Zone as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ZoneId>,
    pub coordinate_range: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<Coordinate>>,
}

impl ZoneRecord {
    pub fn shape(&self) -> ZoneShape {
        ZoneShape::from_range(self.coordinate_range, self.coordinates.clone())
    }
}

/// The caregiver/patient pair a set of zones is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub caregiver_id: CaregiverId,
    pub patient_id: PatientId,
}

impl Assignment {
    pub fn new(caregiver_id: CaregiverId, patient_id: PatientId) -> Self {
        Self {
            caregiver_id,
            patient_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default = "now_epoch_millis")]
    pub timestamp_ms: EpochMillis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: EpochMillis) -> Self {
        Self {
            coordinate,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, now_epoch_millis())
    }
}
