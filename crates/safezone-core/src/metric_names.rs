pub const ZONES_COMMITTED: &str = "safezone_zones_committed_total";
pub const ZONE_EDITS_REJECTED: &str = "safezone_zone_edits_rejected_total";
pub const FIXES_PROCESSED: &str = "safezone_fixes_total";
pub const ZONE_EXITS: &str = "safezone_zone_exits_total";
pub const NOTIFICATIONS_FAILED: &str = "safezone_notifications_failed_total";
