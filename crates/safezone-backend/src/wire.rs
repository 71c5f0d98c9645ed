use safezone_core::{CaregiverId, Coordinate, EpochMillis, PatientId, ZoneRecord};
use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
pub struct ZoneSubmission<'a> {
    pub caregiver_id: &'a CaregiverId,
    pub patient_id: &'a PatientId,
    pub zones: Vec<&'a ZoneRecord>,
}

#[derive(Debug, Serialize)]
pub struct LeaveZoneNotice<'a> {
    pub patient_id: &'a PatientId,
    pub caregiver_id: &'a CaregiverId,
    pub location: Coordinate,
    pub timestamp_ms: EpochMillis,
}

/// Envelope every backend endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub zone: Option<ZoneRecord>,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) => format!("{}: {}", self.status, message),
            None => self.status.clone(),
        }
    }
}
