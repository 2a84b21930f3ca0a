use serde::Serialize;

use crate::models::trip::{ActiveTrip, Trip};
use crate::models::settings::AppSettings;

use super::keys;
use super::store::KeyValueStore;

/// Raw blobs as read at startup, before any parsing or migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBlobs {
    pub trips: Option<String>,
    pub settings: Option<String>,
    pub active_trip: Option<String>,
    pub notified_reminders: Option<String>,
}

/// Safe access to the blob store.
///
/// Never fails: reads degrade to "no data", writes and removals are skipped.
/// Every swallowed failure is logged.
pub struct StorageGateway {
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageGateway").finish_non_exhaustive()
    }
}

impl StorageGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, treating as absent");
                None
            }
        }
    }

    /// Returns whether the write went through.
    pub fn write(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage write failed, change not persisted");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage removal failed");
                false
            }
        }
    }

    /// Read all four blobs.
    pub fn read_all(&self) -> RawBlobs {
        RawBlobs {
            trips: self.read(keys::TRIPS),
            settings: self.read(keys::SETTINGS),
            active_trip: self.read(keys::ACTIVE_TRIP),
            notified_reminders: self.read(keys::NOTIFIED_REMINDERS),
        }
    }

    // ── Typed persistence ───────────────────────────────────────────

    pub fn save_trips(&self, trips: &[Trip]) -> bool {
        self.write_json(keys::TRIPS, &trips)
    }

    pub fn save_settings(&self, settings: &AppSettings) -> bool {
        self.write_json(keys::SETTINGS, settings)
    }

    /// Writes the active trip, or removes the blob when there is none.
    pub fn save_active_trip(&self, active: Option<&ActiveTrip>) -> bool {
        match active {
            Some(trip) => self.write_json(keys::ACTIVE_TRIP, trip),
            None => self.remove(keys::ACTIVE_TRIP),
        }
    }

    pub fn save_notified_reminders(&self, keys_notified: &[String]) -> bool {
        self.write_json(keys::NOTIFIED_REMINDERS, &keys_notified)
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, &json),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize blob, change not persisted");
                false
            }
        }
    }
}

// ── Lenient decoding of the non-settings blobs ──────────────────────

/// Decode the active trip blob. Anything unreadable means "no active trip".
pub fn decode_active_trip(raw: Option<&str>) -> Option<ActiveTrip> {
    let raw = raw?;
    match serde_json::from_str::<Option<ActiveTrip>>(raw) {
        Ok(active) => active,
        Err(e) => {
            tracing::warn!(key = keys::ACTIVE_TRIP, error = %e, "malformed active trip, discarding");
            None
        }
    }
}

/// Decode the notified-reminder key list. Unreadable means "nothing notified".
pub fn decode_notified_reminders(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(keys_notified) => keys_notified,
        Err(e) => {
            tracing::warn!(key = keys::NOTIFIED_REMINDERS, error = %e, "malformed notified keys, resetting");
            Vec::new()
        }
    }
}
