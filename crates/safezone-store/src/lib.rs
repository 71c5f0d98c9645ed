use async_trait::async_trait;
use safezone_core::{LocationFix, Zone, ZoneRecord};
use std::fmt;

#[derive(Debug, Clone)]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

/// Remote source of truth for the zones assigned to one caregiver/patient
/// pair. Only the envelope of a zone is submitted; what comes back may be
/// an envelope or a full outline, already resolved into a [`Zone`].
#[async_trait]
pub trait ZoneStore: Send + Sync {
    async fn submit(&self, record: &ZoneRecord) -> Result<(), StoreError>;
    async fn fetch(&self) -> Result<Vec<Zone>, StoreError>;
}

/// Receives the "left safe zone" signal for a patient.
#[async_trait]
pub trait LeaveZoneNotifier: Send + Sync {
    async fn notify_left_zone(&self, fix: &LocationFix) -> Result<(), StoreError>;
}
