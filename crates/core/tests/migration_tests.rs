// ═══════════════════════════════════════════════════════════════════
// Migration Tests — settings schema upgrade, trip decoding, backfill
// ═══════════════════════════════════════════════════════════════════

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use trip_logbook_core::errors::CoreError;
use trip_logbook_core::models::car::{ReminderKind, DEFAULT_CAR_ID};
use trip_logbook_core::models::settings::{AppSettings, StoredSettings, ThemeMode};
use trip_logbook_core::models::trip::Trip;
use trip_logbook_core::services::migration_service::MigrationService;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap()
}

fn trip(id: &str, car_id: &str) -> Trip {
    Trip {
        id: id.into(),
        car_id: car_id.into(),
        date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        start_time: "08:00".into(),
        end_time: "08:30".into(),
        distance_km: 12.0,
        fuel_price_at_time: 1.65,
        consumption_at_time: 6.5,
        total_cost: 1.29,
        fuel_consumed: 0.78,
        note: None,
        start_odometer: 1000.0,
        end_odometer: 1012.0,
        start_gps: None,
        end_gps: None,
    }
}

// ═══════════════════════════════════════════════════════════════════
// First run / malformed input
// ═══════════════════════════════════════════════════════════════════

mod defaults {
    use super::*;

    #[test]
    fn no_blob_creates_one_default_car() {
        let settings = MigrationService::new().migrate_settings(None, now());
        assert_eq!(settings.fuel_price, 1.65);
        assert_eq!(settings.theme, ThemeMode::System);
        assert_eq!(settings.cars.len(), 1);
        let car = &settings.cars[0];
        assert_eq!(car.id, DEFAULT_CAR_ID);
        assert_eq!(car.average_consumption, 6.5);
        assert!(car.is_default);
        assert!(car.service_reminders.is_empty());
        assert_eq!(settings.last_active_car_id, car.id);
    }

    #[test]
    fn malformed_json_gives_hard_defaults_without_car() {
        let settings = MigrationService::new().migrate_settings(Some("{not json"), now());
        assert_eq!(settings, AppSettings::default());
        assert!(settings.cars.is_empty());
        assert_eq!(settings.last_active_car_id, "");
        assert_eq!(settings.fuel_price, 1.65);
    }

    #[test]
    fn non_object_json_gives_hard_defaults() {
        let settings = MigrationService::new().migrate_settings(Some("[1, 2, 3]"), now());
        assert!(settings.cars.is_empty());
    }

    #[test]
    fn classify_rejects_non_object_as_malformed_state() {
        let err = MigrationService::classify("42").unwrap_err();
        assert!(matches!(err, CoreError::MalformedState { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Legacy single-car settings
// ═══════════════════════════════════════════════════════════════════

mod legacy {
    use super::*;

    #[test]
    fn single_interval_becomes_distance_reminder() {
        let raw = r#"{"fuelPrice": 1.2, "averageConsumption": 7.0, "serviceInterval": 10000}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());

        assert_eq!(settings.fuel_price, 1.2);
        assert_eq!(settings.cars.len(), 1);
        let car = &settings.cars[0];
        assert_eq!(car.average_consumption, 7.0);
        assert_eq!(car.service_reminders.len(), 1);

        let reminder = &car.service_reminders[0];
        assert_eq!(reminder.kind, ReminderKind::Distance);
        assert_eq!(reminder.interval, Some(10000.0));
        assert_eq!(reminder.last_service_odometer, Some(0.0));
        assert_eq!(reminder.id, format!("migrated-{}", now().timestamp_millis()));
        assert_eq!(settings.last_active_car_id, car.id);
    }

    #[test]
    fn name_only_gets_default_interval() {
        let raw = r#"{"serviceName": "Oil change", "lastServiceOdometer": 42000}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        let reminder = &settings.cars[0].service_reminders[0];
        assert_eq!(reminder.name, "Oil change");
        assert_eq!(reminder.interval, Some(15000.0));
        assert_eq!(reminder.last_service_odometer, Some(42000.0));
    }

    #[test]
    fn interval_only_gets_default_name() {
        let raw = r#"{"serviceInterval": 20000}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.cars[0].service_reminders[0].name, "Service interval");
    }

    #[test]
    fn reminder_list_wins_over_single_interval() {
        let raw = r#"{
            "serviceInterval": 10000,
            "serviceReminders": [
                {"id": "r1", "name": "Oil", "interval": 5000},
                {"id": "r2", "name": "STK", "type": "date", "targetDate": "2025-06-01"}
            ]
        }"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        let reminders = &settings.cars[0].service_reminders;
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].id, "r1");
        assert_eq!(reminders[0].kind, ReminderKind::Distance);
        assert_eq!(reminders[1].kind, ReminderKind::Date);
        assert_eq!(reminders[1].target_date, NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let settings = MigrationService::new().migrate_settings(Some("{}"), now());
        assert_eq!(settings.fuel_price, 1.65);
        assert_eq!(settings.theme, ThemeMode::System);
        assert_eq!(settings.cars.len(), 1);
        assert_eq!(settings.cars[0].average_consumption, 6.5);
        assert!(settings.cars[0].service_reminders.is_empty());
    }

    #[test]
    fn zero_fuel_price_counts_as_missing() {
        let settings =
            MigrationService::new().migrate_settings(Some(r#"{"fuelPrice": 0}"#), now());
        assert_eq!(settings.fuel_price, 1.65);
    }

    #[test]
    fn legacy_theme_is_kept() {
        let settings =
            MigrationService::new().migrate_settings(Some(r#"{"theme": "dark"}"#), now());
        assert_eq!(settings.theme, ThemeMode::Dark);
    }

    #[test]
    fn null_cars_is_treated_as_legacy() {
        let stored = MigrationService::classify(r#"{"cars": null, "fuelPrice": 1.4}"#).unwrap();
        assert!(matches!(stored, StoredSettings::Legacy(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Current schema
// ═══════════════════════════════════════════════════════════════════

mod current {
    use super::*;

    #[test]
    fn stored_values_win_over_defaults() {
        let raw = r#"{
            "fuelPrice": 1.79,
            "cars": [{"id": "a", "name": "Octavia", "averageConsumption": 5.2}],
            "lastActiveCarId": "a",
            "theme": "light"
        }"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.fuel_price, 1.79);
        assert_eq!(settings.cars[0].name, "Octavia");
        assert_eq!(settings.cars[0].average_consumption, 5.2);
        assert_eq!(settings.last_active_car_id, "a");
        assert_eq!(settings.theme, ThemeMode::Light);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let raw = r#"{"cars": [{"id": "a"}]}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.fuel_price, 1.65);
        assert_eq!(settings.last_active_car_id, "");
        assert_eq!(settings.theme, ThemeMode::System);
        assert_eq!(settings.cars[0].average_consumption, 6.5);
        assert_eq!(settings.cars[0].license_plate, "");
    }

    #[test]
    fn empty_car_list_is_current_schema() {
        let stored = MigrationService::classify(r#"{"cars": []}"#).unwrap();
        assert!(matches!(stored, StoredSettings::Current(_)));
    }

    #[test]
    fn unknown_fields_survive_a_save() {
        let raw = r#"{"cars": [], "futureFlag": true, "units": {"distance": "km"}}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.extra.get("futureFlag"), Some(&serde_json::json!(true)));

        let saved = serde_json::to_value(&settings).unwrap();
        assert_eq!(saved["futureFlag"], serde_json::json!(true));
        assert_eq!(saved["units"]["distance"], "km");
    }

    #[test]
    fn unknown_theme_reads_as_system() {
        let raw = r#"{"cars": [], "theme": "solarized"}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.theme, ThemeMode::System);
    }

    #[test]
    fn blank_target_date_reads_as_none() {
        let raw = r#"{"cars": [{"id": "a", "serviceReminders": [
            {"id": "r", "name": "STK", "type": "date", "targetDate": ""}
        ]}]}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.cars[0].service_reminders[0].target_date, None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Idempotence
// ═══════════════════════════════════════════════════════════════════

mod idempotence {
    use super::*;

    fn remigrate(settings: &AppSettings) -> AppSettings {
        let json = serde_json::to_string(settings).unwrap();
        MigrationService::new().migrate_settings(Some(&json), now())
    }

    #[test]
    fn first_run_output_is_stable() {
        let first = MigrationService::new().migrate_settings(None, now());
        assert_eq!(remigrate(&first), first);
    }

    #[test]
    fn legacy_output_is_stable() {
        let raw = r#"{"fuelPrice": 1.2, "averageConsumption": 7.0, "serviceInterval": 10000}"#;
        let first = MigrationService::new().migrate_settings(Some(raw), now());
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_string(&first).unwrap();
        let second = MigrationService::new().migrate_settings(Some(&json), later);
        assert_eq!(second, first);
    }

    #[test]
    fn current_output_with_extras_is_stable() {
        let raw = r#"{"fuelPrice": 1.5, "cars": [{"id": "a", "serviceReminders": [
            {"id": "r", "name": "Oil", "interval": 15000, "lastServiceOdometer": 3000}
        ]}], "futureFlag": 3}"#;
        let first = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(remigrate(&first), first);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Trips: decoding and car backfill
// ═══════════════════════════════════════════════════════════════════

mod trips {
    use super::*;

    #[test]
    fn missing_blob_gives_no_trips() {
        assert!(MigrationService::new().decode_trips(None).is_empty());
    }

    #[test]
    fn non_array_blob_gives_no_trips() {
        let service = MigrationService::new();
        assert!(service.decode_trips(Some(r#"{"id": "x"}"#)).is_empty());
        assert!(service.decode_trips(Some("garbage")).is_empty());
    }

    #[test]
    fn undecodable_entries_are_dropped_individually() {
        let good = serde_json::to_value(trip("t1", "a")).unwrap();
        let raw = serde_json::json!([good, {"id": "broken", "date": "not a date"}, 17]).to_string();
        let trips = MigrationService::new().decode_trips(Some(&raw));
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id, "t1");
    }

    #[test]
    fn trip_without_car_id_gets_first_car() {
        let settings = AppSettings::first_run();
        let mut trips = vec![trip("t1", "")];
        let assigned = MigrationService::new().backfill_trip_car_ids(&mut trips, &settings);
        assert_eq!(assigned, 1);
        assert_eq!(trips[0].car_id, DEFAULT_CAR_ID);
    }

    #[test]
    fn existing_car_id_is_never_overwritten() {
        let settings = AppSettings::first_run();
        let mut trips = vec![trip("t1", "deleted-car")];
        let assigned = MigrationService::new().backfill_trip_car_ids(&mut trips, &settings);
        assert_eq!(assigned, 0);
        assert_eq!(trips[0].car_id, "deleted-car");
    }

    #[test]
    fn backfill_is_idempotent() {
        let settings = AppSettings::first_run();
        let service = MigrationService::new();
        let mut trips = vec![trip("t1", ""), trip("t2", "x")];
        assert_eq!(service.backfill_trip_car_ids(&mut trips, &settings), 1);
        let snapshot = trips.clone();
        assert_eq!(service.backfill_trip_car_ids(&mut trips, &settings), 0);
        assert_eq!(trips, snapshot);
    }

    #[test]
    fn backfill_without_cars_is_a_no_op() {
        let settings = AppSettings::default();
        let mut trips = vec![trip("t1", "")];
        assert_eq!(
            MigrationService::new().backfill_trip_car_ids(&mut trips, &settings),
            0
        );
        assert_eq!(trips[0].car_id, "");
    }

    #[test]
    fn migrate_backfills_legacy_trips() {
        let raw_trips = r#"[{"id": "old", "date": "2024-05-01", "distanceKm": 40,
            "startOdometer": 100, "endOdometer": 140}]"#;
        let raw_settings = r#"{"fuelPrice": 1.5}"#;
        let migration = MigrationService::new().migrate(Some(raw_trips), Some(raw_settings), now());
        assert_eq!(migration.trips.len(), 1);
        assert_eq!(migration.trips[0].car_id, migration.settings.cars[0].id);
        assert_eq!(migration.trips[0].distance_km, 40.0);
        assert!(migration.trips_intact);
        assert!(migration.settings_intact);
    }

    #[test]
    fn null_car_id_is_backfilled_not_dropped() {
        let raw_trips = r#"[
            {"id": "a", "carId": null, "date": "2024-05-01", "distanceKm": 40, "note": null},
            {"id": "b", "carId": "car-2", "date": "2024-05-02", "startGps": null}
        ]"#;
        let raw_settings = r#"{"cars": [{"id": "car-1"}, {"id": "car-2"}]}"#;
        let migration = MigrationService::new().migrate(Some(raw_trips), Some(raw_settings), now());

        assert!(migration.trips_intact);
        assert_eq!(migration.trips.len(), 2);
        assert_eq!(migration.trips[0].car_id, "car-1");
        assert_eq!(migration.trips[0].note, None);
        assert_eq!(migration.trips[1].car_id, "car-2");
        assert_eq!(migration.trips[1].start_gps, None);
    }

    #[test]
    fn partially_decoded_trips_are_not_intact() {
        let raw = serde_json::json!([serde_json::to_value(trip("t1", "a")).unwrap(), 17]).to_string();
        let (trips, intact) = MigrationService::new().decode_trips_checked(Some(&raw));
        assert_eq!(trips.len(), 1);
        assert!(!intact);

        let (_, intact) = MigrationService::new().decode_trips_checked(Some("garbage"));
        assert!(!intact);
        let (_, intact) = MigrationService::new().decode_trips_checked(None);
        assert!(intact);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Salvaging settings with unreadable fields
// ═══════════════════════════════════════════════════════════════════

mod salvage {
    use super::*;

    #[test]
    fn null_fuel_price_keeps_cars_and_selection() {
        let raw = r#"{"fuelPrice": null,
            "cars": [{"id": "c1", "name": "Octavia", "averageConsumption": 5.2,
                      "serviceReminders": [{"id": "r1", "name": "Oil", "interval": 15000}]}],
            "lastActiveCarId": "c1", "theme": "dark"}"#;
        let (settings, intact) = MigrationService::new().migrate_settings_checked(Some(raw), now());

        assert!(intact);
        assert_eq!(settings.fuel_price, 1.65);
        assert_eq!(settings.cars.len(), 1);
        assert_eq!(settings.cars[0].name, "Octavia");
        assert_eq!(settings.cars[0].average_consumption, 5.2);
        assert_eq!(settings.cars[0].service_reminders[0].interval, Some(15000.0));
        assert_eq!(settings.last_active_car_id, "c1");
        assert_eq!(settings.theme, ThemeMode::Dark);
    }

    #[test]
    fn car_without_id_gets_a_stable_one() {
        let raw = r#"{"cars": [{"id": "a"}, {"name": "Fabia", "averageConsumption": 6.1}, "junk"]}"#;
        let service = MigrationService::new();
        let settings = service.migrate_settings(Some(raw), now());

        assert_eq!(settings.cars.len(), 2);
        assert_eq!(settings.cars[0].id, "a");
        assert_eq!(settings.cars[1].id, "recovered-car-2");
        assert_eq!(settings.cars[1].name, "Fabia");
        assert_eq!(settings.cars[1].average_consumption, 6.1);

        let again = service.migrate_settings(Some(raw), now());
        assert_eq!(again, settings);
    }

    #[test]
    fn unknown_reminder_type_keeps_the_other_reminders() {
        let raw = r#"{"cars": [{"id": "a", "serviceReminders": [
            {"id": "r1", "name": "Oil", "interval": 15000, "lastServiceOdometer": 3000},
            {"id": "r2", "name": "Tyres", "type": "season", "interval": 20000}
        ]}]}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        let reminders = &settings.cars[0].service_reminders;

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].last_service_odometer, Some(3000.0));
        assert_eq!(reminders[1].id, "r2");
        assert_eq!(reminders[1].name, "Tyres");
        assert_eq!(reminders[1].kind, ReminderKind::Distance);
        assert_eq!(reminders[1].interval, Some(20000.0));
    }

    #[test]
    fn wrong_type_fields_keep_unknown_extras() {
        let raw = r#"{"cars": [], "fuelPrice": "cheap", "theme": 3, "futureFlag": true}"#;
        let settings = MigrationService::new().migrate_settings(Some(raw), now());
        assert_eq!(settings.fuel_price, 1.65);
        assert_eq!(settings.theme, ThemeMode::System);
        assert_eq!(settings.extra.get("futureFlag"), Some(&serde_json::json!(true)));
        assert!(settings.extra.get("fuelPrice").is_none());
    }

    #[test]
    fn unparseable_blob_is_not_intact() {
        let (settings, intact) =
            MigrationService::new().migrate_settings_checked(Some("{not json"), now());
        assert!(!intact);
        assert!(settings.cars.is_empty());
    }
}
