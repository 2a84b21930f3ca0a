//! Blob names. Kept identical to what existing installs already wrote.

pub const TRIPS: &str = "kniha_jazd_trips_v1";
pub const SETTINGS: &str = "kniha_jazd_settings_v1";
pub const ACTIVE_TRIP: &str = "kniha_jazd_active_v1";
pub const NOTIFIED_REMINDERS: &str = "kniha_jazd_notifications_v1";
