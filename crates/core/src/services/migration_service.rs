use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::models::car::{parse_lenient_date, Car, ReminderKind, ServiceReminder, DEFAULT_CONSUMPTION};
use crate::models::settings::{
    AppSettings, LegacySettingsV0, StoredSettings, ThemeMode, DEFAULT_FUEL_PRICE,
};
use crate::models::trip::Trip;
use crate::storage::keys;

/// Interval given to a legacy reminder that only had a name.
pub const LEGACY_DEFAULT_INTERVAL_KM: f64 = 15_000.0;

/// Name given to a legacy reminder that only had an interval.
pub const LEGACY_DEFAULT_REMINDER_NAME: &str = "Service interval";

/// Outcome of the load-time migration.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    /// Newest first, every trip assigned to a car when one exists
    pub trips: Vec<Trip>,
    pub settings: AppSettings,
    /// `false` when part of the stored trips could not be read
    pub trips_intact: bool,
    /// `false` when the stored settings could not be read at all
    pub settings_intact: bool,
}

/// Brings persisted blobs up to the current schema.
///
/// Pure: no storage access, no clock access (the caller passes `now`).
/// Running it on its own output is a no-op.
pub struct MigrationService;

impl MigrationService {
    pub fn new() -> Self {
        Self
    }

    /// Full load-time migration: decode trips, upgrade settings, then give
    /// every unassigned trip to the first car.
    pub fn migrate(
        &self,
        raw_trips: Option<&str>,
        raw_settings: Option<&str>,
        now: DateTime<Utc>,
    ) -> Migration {
        let (mut trips, trips_intact) = self.decode_trips_checked(raw_trips);
        let (settings, settings_intact) = self.migrate_settings_checked(raw_settings, now);
        let assigned = self.backfill_trip_car_ids(&mut trips, &settings);
        if assigned > 0 {
            tracing::info!(assigned, "assigned legacy trips to the first car");
        }
        Migration {
            trips,
            settings,
            trips_intact,
            settings_intact,
        }
    }

    /// Produce valid settings from whatever was stored.
    ///
    /// - nothing stored: first-run settings with one default car
    /// - legacy single-car shape: wrapped into one default car
    /// - current shape: read over the defaults, unknown fields kept
    /// - unreadable: hard defaults with no cars
    pub fn migrate_settings(&self, raw: Option<&str>, now: DateTime<Utc>) -> AppSettings {
        self.migrate_settings_checked(raw, now).0
    }

    /// Like [`MigrationService::migrate_settings`]; the flag is `false` when
    /// the blob was unreadable and the result is a stand-in.
    pub fn migrate_settings_checked(&self, raw: Option<&str>, now: DateTime<Utc>) -> (AppSettings, bool) {
        let Some(raw) = raw else {
            tracing::debug!("no stored settings, creating first-run defaults");
            return (AppSettings::first_run(), true);
        };

        match Self::classify(raw) {
            Ok(StoredSettings::Current(settings)) => (settings, true),
            Ok(StoredSettings::Legacy(legacy)) => {
                tracing::info!("migrating single-car settings to multi-car schema");
                (Self::upgrade_legacy(legacy, now), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable settings, falling back to defaults");
                (AppSettings::default(), false)
            }
        }
    }

    /// Parse a stored settings blob and decide which schema it uses.
    /// The presence of a non-null `cars` field marks the current schema.
    ///
    /// Only unparseable JSON or a non-object is an error. A value of the
    /// wrong type falls back to that field's default; the rest is kept.
    pub fn classify(raw: &str) -> Result<StoredSettings, CoreError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(malformed("settings blob is not an object".into()));
        };

        let is_current = map.get("cars").is_some_and(|cars| !cars.is_null());
        if is_current {
            Ok(StoredSettings::Current(salvage_current(map)))
        } else {
            Ok(StoredSettings::Legacy(salvage_legacy(map)))
        }
    }

    /// Convert single-car settings into the multi-car shape.
    pub fn upgrade_legacy(legacy: LegacySettingsV0, now: DateTime<Utc>) -> AppSettings {
        let interval = non_zero(legacy.service_interval);
        let name = legacy.service_name.filter(|n| !n.is_empty());

        let service_reminders = match legacy.service_reminders {
            Some(reminders) => reminders,
            None if interval.is_some() || name.is_some() => vec![ServiceReminder {
                id: format!("migrated-{}", now.timestamp_millis()),
                name: name.unwrap_or_else(|| LEGACY_DEFAULT_REMINDER_NAME.to_string()),
                kind: ReminderKind::Distance,
                interval: Some(interval.unwrap_or(LEGACY_DEFAULT_INTERVAL_KM)),
                last_service_odometer: Some(non_zero(legacy.last_service_odometer).unwrap_or(0.0)),
                target_date: None,
            }],
            None => Vec::new(),
        };

        let car = Car::default_car(
            positive(legacy.average_consumption).unwrap_or(DEFAULT_CONSUMPTION),
            service_reminders,
        );

        AppSettings {
            fuel_price: positive(legacy.fuel_price).unwrap_or(DEFAULT_FUEL_PRICE),
            last_active_car_id: car.id.clone(),
            cars: vec![car],
            theme: legacy.theme.unwrap_or_default(),
            ..AppSettings::default()
        }
    }

    /// Decode the trips blob. A blob that is not an array yields no trips;
    /// individual undecodable entries are dropped, the rest survive.
    pub fn decode_trips(&self, raw: Option<&str>) -> Vec<Trip> {
        self.decode_trips_checked(raw).0
    }

    /// Like [`MigrationService::decode_trips`]; the flag is `false` when
    /// anything stored could not be decoded.
    pub fn decode_trips_checked(&self, raw: Option<&str>) -> (Vec<Trip>, bool) {
        let Some(raw) = raw else {
            return (Vec::new(), true);
        };

        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                tracing::warn!(key = keys::TRIPS, "trips blob is not an array, ignoring it");
                return (Vec::new(), false);
            }
            Err(e) => {
                tracing::warn!(key = keys::TRIPS, error = %e, "malformed trips blob, ignoring it");
                return (Vec::new(), false);
            }
        };

        let stored = entries.len();
        let trips: Vec<Trip> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Trip>(entry) {
                Ok(trip) => Some(trip),
                Err(e) => {
                    tracing::warn!(index, error = %e, "dropping undecodable trip record");
                    None
                }
            })
            .collect();
        let intact = trips.len() == stored;
        (trips, intact)
    }

    /// Assign the first car to every trip without a car.
    /// Never touches a trip that already has one, even a dangling one.
    /// Returns how many trips were assigned.
    pub fn backfill_trip_car_ids(&self, trips: &mut [Trip], settings: &AppSettings) -> usize {
        let Some(first_car) = settings.cars.first() else {
            return 0;
        };

        let mut assigned = 0;
        for trip in trips.iter_mut().filter(|t| t.is_unassigned()) {
            trip.car_id = first_car.id.clone();
            assigned += 1;
        }
        assigned
    }
}

impl Default for MigrationService {
    fn default() -> Self {
        Self::new()
    }
}

// ── Field-by-field salvage of stored settings ───────────────────────

fn salvage_current(map: Map<String, Value>) -> AppSettings {
    if let Ok(settings) = serde_json::from_value::<AppSettings>(Value::Object(map.clone())) {
        return settings;
    }
    tracing::warn!(key = keys::SETTINGS, "settings do not match the schema, salvaging field by field");

    let mut map = map;
    let cars = match map.remove("cars") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| salvage_car(index, entry))
            .collect(),
        other => {
            tracing::warn!(value = ?other, "stored cars are not a list, dropping them");
            Vec::new()
        }
    };

    AppSettings {
        fuel_price: take_or(&mut map, "fuelPrice", || DEFAULT_FUEL_PRICE),
        cars,
        last_active_car_id: take_or(&mut map, "lastActiveCarId", String::new),
        theme: take_or(&mut map, "theme", ThemeMode::default),
        extra: map,
    }
}

fn salvage_legacy(map: Map<String, Value>) -> LegacySettingsV0 {
    if let Ok(legacy) = serde_json::from_value::<LegacySettingsV0>(Value::Object(map.clone())) {
        return legacy;
    }
    tracing::warn!(key = keys::SETTINGS, "legacy settings do not match the schema, salvaging field by field");

    let mut map = map;
    let service_reminders = match map.remove("serviceReminders") {
        Some(Value::Array(entries)) => Some(salvage_reminders("legacy", entries)),
        _ => None,
    };
    LegacySettingsV0 {
        fuel_price: take_or(&mut map, "fuelPrice", || None),
        average_consumption: take_or(&mut map, "averageConsumption", || None),
        service_interval: take_or(&mut map, "serviceInterval", || None),
        service_name: take_or(&mut map, "serviceName", || None),
        last_service_odometer: take_or(&mut map, "lastServiceOdometer", || None),
        service_reminders,
        theme: take_or(&mut map, "theme", || None),
    }
}

/// A car that is not an object is dropped. Anything else is kept, with
/// unreadable fields at their defaults. A missing id is derived from the
/// car's position so repeated loads agree on it.
fn salvage_car(index: usize, entry: Value) -> Option<Car> {
    if let Ok(car) = serde_json::from_value::<Car>(entry.clone()) {
        return Some(car);
    }
    let Value::Object(mut map) = entry else {
        tracing::warn!(index, "dropping stored car that is not an object");
        return None;
    };

    let id = match map.remove("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            let id = format!("recovered-car-{}", index + 1);
            tracing::warn!(index, id = %id, "stored car has no id, assigning one");
            id
        }
    };
    let service_reminders = match map.remove("serviceReminders") {
        Some(Value::Array(entries)) => salvage_reminders(&id, entries),
        _ => Vec::new(),
    };

    Some(Car {
        name: take_or(&mut map, "name", String::new),
        license_plate: take_or(&mut map, "licensePlate", String::new),
        is_default: take_or(&mut map, "isDefault", || false),
        average_consumption: take_or(&mut map, "averageConsumption", || DEFAULT_CONSUMPTION),
        service_reminders,
        id,
    })
}

fn salvage_reminders(car_id: &str, entries: Vec<Value>) -> Vec<ServiceReminder> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if let Ok(reminder) = serde_json::from_value::<ServiceReminder>(entry.clone()) {
                return Some(reminder);
            }
            let Value::Object(mut map) = entry else {
                tracing::warn!(car_id, index, "dropping stored reminder that is not an object");
                return None;
            };
            let id = match map.remove("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => id,
                Some(Value::Number(n)) => n.to_string(),
                _ => format!("recovered-reminder-{}", index + 1),
            };
            tracing::warn!(car_id, reminder_id = %id, "salvaging reminder field by field");
            Some(ServiceReminder {
                id,
                name: take_or(&mut map, "name", String::new),
                kind: take_or(&mut map, "type", ReminderKind::default),
                interval: take_or(&mut map, "interval", || None),
                last_service_odometer: take_or(&mut map, "lastServiceOdometer", || None),
                target_date: map
                    .remove("targetDate")
                    .as_ref()
                    .and_then(Value::as_str)
                    .and_then(parse_lenient_date),
            })
        })
        .collect()
}

/// Remove `key` and decode it, or use `fallback` when it is absent, null
/// or of the wrong type.
fn take_or<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str, fallback: impl FnOnce() -> T) -> T {
    match map.remove(key) {
        None | Some(Value::Null) => fallback(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(field = key, error = %e, "unreadable settings field, using its default");
            fallback()
        }),
    }
}

fn malformed(message: String) -> CoreError {
    CoreError::MalformedState {
        key: keys::SETTINGS.to_string(),
        message,
    }
}

/// Missing, zero and NaN all count as "not set".
fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
