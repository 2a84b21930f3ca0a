use serde::{Deserialize, Serialize};

use super::settings::AppSettings;
use super::trip::{ActiveTrip, Trip};

/// The authoritative in-memory state. Each field is persisted as its own
/// blob, so one corrupted blob never takes the others down with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logbook {
    /// Completed trips, newest first. Insertion always prepends; the
    /// reminder evaluator relies on this order to find a car's latest
    /// odometer reading.
    pub trips: Vec<Trip>,

    pub settings: AppSettings,

    /// At most one trip in progress, system-wide
    pub active_trip: Option<ActiveTrip>,

    /// Dedup keys of reminders already notified, in notification order
    pub notified_reminders: Vec<String>,
}

impl Default for Logbook {
    fn default() -> Self {
        Self {
            trips: Vec::new(),
            settings: AppSettings::first_run(),
            active_trip: None,
            notified_reminders: Vec::new(),
        }
    }
}

impl Logbook {
    /// Trips of one car, newest first.
    #[must_use]
    pub fn trips_for_car(&self, car_id: &str) -> Vec<&Trip> {
        self.trips.iter().filter(|t| t.car_id == car_id).collect()
    }

    #[must_use]
    pub fn was_notified(&self, key: &str) -> bool {
        self.notified_reminders.iter().any(|k| k == key)
    }
}
