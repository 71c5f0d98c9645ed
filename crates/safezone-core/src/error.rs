use crate::ids::ZoneId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    Conflict,
    Forbidden,
    Upstream,
}

/// Everything the editor and the monitor can report. None of these are
/// fatal: the requested operation is rejected and local state is left as
/// it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    #[error("the new edge would cross an existing edge of the zone")]
    SelfIntersection,
    #[error("point lies inside an existing zone")]
    PointInsideExistingZone,
    #[error("a zone needs at least {required} points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    #[error("zone overlaps existing zone {zone_id}")]
    ZoneOverlap { zone_id: ZoneId },
    #[error("failed to save zone: {0}")]
    PersistenceFailure(String),
    #[error("location tracking permission denied")]
    TrackingPermissionDenied,
    #[error("failed to deliver leave-zone notification: {0}")]
    NotificationDeliveryFailure(String),
}

impl ZoneError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SelfIntersection
            | Self::PointInsideExistingZone
            | Self::InsufficientPoints { .. } => ErrorCode::InvalidInput,
            Self::ZoneOverlap { .. } => ErrorCode::Conflict,
            Self::PersistenceFailure(_) | Self::NotificationDeliveryFailure(_) => {
                ErrorCode::Upstream
            }
            Self::TrackingPermissionDenied => ErrorCode::Forbidden,
        }
    }
}

pub type ZoneResult<T> = Result<T, ZoneError>;
