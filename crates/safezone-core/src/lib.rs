pub mod domain;
pub mod error;
pub mod ids;
pub mod metric_names;

pub use domain::{Assignment, EpochMillis, LocationFix, Zone, ZoneRecord, now_epoch_millis};
pub use error::{ErrorCode, ZoneError, ZoneResult};
pub use ids::{CaregiverId, PatientId, ZoneId};
pub use safezone_geo::{BoundingBox, Coordinate, ZoneShape};
