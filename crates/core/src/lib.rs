pub mod config;
pub mod errors;
pub mod location;
pub mod models;
pub mod notification;
pub mod services;
pub mod storage;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use config::LogbookConfig;
use location::{capture::capture_location, provider::LocationProvider};
use models::{
    car::{Car, ReminderKind, ServiceReminder},
    logbook::Logbook,
    reminder::{NotificationIntent, ReminderStatus},
    settings::{AppSettings, ThemeMode},
    stats::HistoryStats,
    trip::{ActiveTrip, Trip},
};
use notification::{NotificationPermission, Notifier};
use services::{
    export_service::{ExportFormat, ExportService},
    migration_service::MigrationService,
    reminder_service::ReminderService,
    stats_service::StatsService,
    trip_service::{parse_odometer, TripService},
};
use storage::gateway::{decode_active_trip, decode_notified_reminders, StorageGateway};
use storage::store::KeyValueStore;

use errors::CoreError;

/// Main entry point for the Trip Logbook core library.
///
/// Holds the authoritative state (trips, settings, active trip, notified
/// reminders) and funnels every change through a named operation. Each
/// mutation updates memory first and then persists the touched blob on a
/// best-effort basis: a failed write is logged, never returned.
#[must_use]
pub struct TripLogbook {
    logbook: Logbook,
    gateway: StorageGateway,
    config: LogbookConfig,
    stats_service: StatsService,
    reminder_service: ReminderService,
    trip_service: TripService,
    export_service: ExportService,
}

impl std::fmt::Debug for TripLogbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripLogbook")
            .field("trips", &self.logbook.trips.len())
            .field("cars", &self.logbook.settings.cars.len())
            .field("active_trip", &self.logbook.active_trip.is_some())
            .field("notified_reminders", &self.logbook.notified_reminders.len())
            .finish()
    }
}

impl TripLogbook {
    /// Load state from `store`, migrating legacy data.
    pub fn open(store: Box<dyn KeyValueStore>, config: LogbookConfig) -> Self {
        Self::open_at(store, config, Utc::now())
    }

    /// Like [`TripLogbook::open`], with an explicit clock for the migration.
    ///
    /// Migration runs exactly once here. The normalized trips and settings
    /// are written back, so later loads find the current schema, unless
    /// the stored blob could not be read.
    pub fn open_at(store: Box<dyn KeyValueStore>, config: LogbookConfig, now: DateTime<Utc>) -> Self {
        let gateway = StorageGateway::new(store);
        let raw = gateway.read_all();

        let migration =
            MigrationService::new().migrate(raw.trips.as_deref(), raw.settings.as_deref(), now);
        let logbook = Logbook {
            trips: migration.trips,
            settings: migration.settings,
            active_trip: decode_active_trip(raw.active_trip.as_deref()),
            notified_reminders: decode_notified_reminders(raw.notified_reminders.as_deref()),
        };

        // Unreadable blobs stay on disk untouched until the next real change.
        if migration.trips_intact {
            gateway.save_trips(&logbook.trips);
        }
        if migration.settings_intact {
            gateway.save_settings(&logbook.settings);
        }

        tracing::debug!(
            trips = logbook.trips.len(),
            cars = logbook.settings.cars.len(),
            active_trip = logbook.active_trip.is_some(),
            "logbook opened"
        );

        Self {
            logbook,
            gateway,
            config,
            stats_service: StatsService::new(),
            reminder_service: ReminderService::new(),
            trip_service: TripService::new(),
            export_service: ExportService::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LogbookConfig {
        &self.config
    }

    // ── Trips ───────────────────────────────────────────────────────

    /// All trips, newest first.
    #[must_use]
    pub fn trips(&self) -> &[Trip] {
        &self.logbook.trips
    }

    /// One car's trips, newest first.
    #[must_use]
    pub fn trips_for_car(&self, car_id: &str) -> Vec<&Trip> {
        self.logbook.trips_for_car(car_id)
    }

    /// The active car's latest `limit` trips, newest first.
    #[must_use]
    pub fn recent_trips(&self, limit: usize) -> Vec<&Trip> {
        match self.active_car() {
            Some(car) => {
                let mut trips = self.logbook.trips_for_car(&car.id);
                trips.truncate(limit);
                trips
            }
            None => Vec::new(),
        }
    }

    #[must_use]
    pub fn get_trip(&self, trip_id: &str) -> Option<&Trip> {
        self.logbook.trips.iter().find(|t| t.id == trip_id)
    }

    #[must_use]
    pub fn active_trip(&self) -> Option<&ActiveTrip> {
        self.logbook.active_trip.as_ref()
    }

    /// End odometer of the car's latest trip, 0 without trips.
    #[must_use]
    pub fn last_odometer(&self, car_id: &str) -> f64 {
        self.reminder_service
            .last_odometer(&self.logbook.trips, car_id)
    }

    /// Begin a trip. Uses the active car unless `car_id` is given.
    pub fn start_trip(
        &mut self,
        car_id: Option<&str>,
        start_odometer: f64,
        note: Option<String>,
        start_gps: Option<String>,
        at: NaiveDateTime,
    ) -> Result<ActiveTrip, CoreError> {
        let car = self.trip_car(car_id)?;
        let active = self
            .trip_service
            .start(car, start_odometer, note, start_gps, at)?;

        self.logbook.active_trip = Some(active.clone());
        self.gateway.save_active_trip(Some(&active));
        tracing::debug!(car_id = %active.car_id, start_odometer, "trip started");
        Ok(active)
    }

    /// Begin a trip from a typed odometer reading, capturing the position
    /// first. Input is validated before waiting for the location.
    pub async fn start_trip_with_location(
        &mut self,
        provider: &dyn LocationProvider,
        car_id: Option<&str>,
        odometer_input: &str,
        note: Option<String>,
    ) -> Result<ActiveTrip, CoreError> {
        let start_odometer = parse_odometer(odometer_input)?;
        self.trip_car(car_id)?;

        let gps = capture_location(provider, &self.config).await;
        let at = Local::now().naive_local();
        self.start_trip(car_id, start_odometer, note, Some(gps), at)
    }

    /// Close the active trip and record it as the newest trip.
    ///
    /// Consumption comes from the trip's car (or the active car if that car
    /// was deleted meanwhile); the fuel price from the current settings.
    pub fn finish_trip(
        &mut self,
        end_odometer: f64,
        note: Option<String>,
        end_gps: Option<String>,
        at: NaiveDateTime,
    ) -> Result<Trip, CoreError> {
        let active = self
            .logbook
            .active_trip
            .as_ref()
            .ok_or(CoreError::NoActiveTrip)?;

        let settings = &self.logbook.settings;
        let consumption = settings
            .car(&active.car_id)
            .or_else(|| settings.active_car())
            .map(|c| c.average_consumption)
            .ok_or_else(|| CoreError::CarNotFound(active.car_id.clone()))?;

        let trip = self.trip_service.finish(
            active,
            end_odometer,
            consumption,
            settings.fuel_price,
            note,
            end_gps,
            at,
        )?;

        self.logbook.trips.insert(0, trip.clone());
        self.logbook.active_trip = None;
        self.gateway.save_trips(&self.logbook.trips);
        self.gateway.save_active_trip(None);
        tracing::debug!(trip_id = %trip.id, distance_km = trip.distance_km, "trip finished");
        Ok(trip)
    }

    /// Close the active trip from a typed odometer reading, capturing the
    /// position first. Input is validated before waiting for the location.
    pub async fn finish_trip_with_location(
        &mut self,
        provider: &dyn LocationProvider,
        odometer_input: &str,
        note: Option<String>,
    ) -> Result<Trip, CoreError> {
        let end_odometer = parse_odometer(odometer_input)?;
        let active = self.active_trip().ok_or(CoreError::NoActiveTrip)?;
        if end_odometer <= active.start_odometer {
            return Err(CoreError::InvalidTripInput(format!(
                "End odometer ({end_odometer}) must be greater than start odometer ({})",
                active.start_odometer
            )));
        }

        let gps = capture_location(provider, &self.config).await;
        let at = Local::now().naive_local();
        self.finish_trip(end_odometer, note, Some(gps), at)
    }

    /// Discard the active trip without recording anything.
    pub fn cancel_trip(&mut self) -> Result<ActiveTrip, CoreError> {
        let active = self
            .logbook
            .active_trip
            .take()
            .ok_or(CoreError::NoActiveTrip)?;
        self.gateway.save_active_trip(None);
        Ok(active)
    }

    pub fn delete_trip(&mut self, trip_id: &str) -> Result<Trip, CoreError> {
        let idx = self
            .logbook
            .trips
            .iter()
            .position(|t| t.id == trip_id)
            .ok_or_else(|| CoreError::TripNotFound(trip_id.to_string()))?;
        let removed = self.logbook.trips.remove(idx);
        self.gateway.save_trips(&self.logbook.trips);
        Ok(removed)
    }

    // ── Cars ────────────────────────────────────────────────────────

    #[must_use]
    pub fn cars(&self) -> &[Car] {
        &self.logbook.settings.cars
    }

    #[must_use]
    pub fn get_car(&self, car_id: &str) -> Option<&Car> {
        self.logbook.settings.car(car_id)
    }

    /// The selected car, or the first car if the selection is stale.
    #[must_use]
    pub fn active_car(&self) -> Option<&Car> {
        self.logbook.settings.active_car()
    }

    pub fn set_active_car(&mut self, car_id: &str) -> Result<(), CoreError> {
        if self.logbook.settings.car(car_id).is_none() {
            return Err(CoreError::CarNotFound(car_id.to_string()));
        }
        self.logbook.settings.last_active_car_id = car_id.to_string();
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    /// Add a car. The first car becomes the default and is selected.
    pub fn add_car(&mut self, mut car: Car) -> Result<String, CoreError> {
        validate_car(&car)?;
        if self.logbook.settings.car(&car.id).is_some() {
            return Err(CoreError::ValidationError(format!(
                "A car with id '{}' already exists",
                car.id
            )));
        }

        if self.logbook.settings.cars.is_empty() {
            car.is_default = true;
        }
        let id = car.id.clone();
        self.logbook.settings.cars.push(car);
        if self.logbook.settings.car(&self.logbook.settings.last_active_car_id).is_none() {
            self.logbook.settings.last_active_car_id = id.clone();
        }
        self.gateway.save_settings(&self.logbook.settings);
        Ok(id)
    }

    /// Replace a car (matched by id) with an edited copy.
    pub fn update_car(&mut self, car: Car) -> Result<(), CoreError> {
        validate_car(&car)?;
        let slot = self
            .logbook
            .settings
            .car_mut(&car.id)
            .ok_or_else(|| CoreError::CarNotFound(car.id.clone()))?;
        *slot = car;
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    /// Remove a car. Its trips stay in the log with a dangling car id.
    /// If it was selected, the first remaining car is selected instead.
    pub fn delete_car(&mut self, car_id: &str) -> Result<Car, CoreError> {
        let settings = &mut self.logbook.settings;
        let idx = settings
            .cars
            .iter()
            .position(|c| c.id == car_id)
            .ok_or_else(|| CoreError::CarNotFound(car_id.to_string()))?;
        let removed = settings.cars.remove(idx);

        if settings.last_active_car_id == car_id {
            settings.last_active_car_id = settings
                .cars
                .first()
                .map(|c| c.id.clone())
                .unwrap_or_default();
        }
        self.gateway.save_settings(&self.logbook.settings);
        tracing::debug!(car_id, "car deleted, trips kept");
        Ok(removed)
    }

    // ── Service Reminders ───────────────────────────────────────────

    pub fn add_reminder(&mut self, car_id: &str, reminder: ServiceReminder) -> Result<(), CoreError> {
        validate_reminder(&reminder)?;
        let car = self.car_mut(car_id)?;
        if car.reminder(&reminder.id).is_some() {
            return Err(CoreError::ValidationError(format!(
                "Reminder '{}' already exists on car '{car_id}'",
                reminder.id
            )));
        }
        car.service_reminders.push(reminder);
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    /// Replace a reminder (matched by id) with an edited copy.
    pub fn update_reminder(&mut self, car_id: &str, reminder: ServiceReminder) -> Result<(), CoreError> {
        validate_reminder(&reminder)?;
        let slot = self.reminder_mut(car_id, &reminder.id)?;
        *slot = reminder;
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    pub fn remove_reminder(&mut self, car_id: &str, reminder_id: &str) -> Result<ServiceReminder, CoreError> {
        let car = self.car_mut(car_id)?;
        let idx = car
            .service_reminders
            .iter()
            .position(|r| r.id == reminder_id)
            .ok_or_else(|| CoreError::ReminderNotFound {
                car_id: car_id.to_string(),
                reminder_id: reminder_id.to_string(),
            })?;
        let removed = car.service_reminders.remove(idx);
        self.gateway.save_settings(&self.logbook.settings);
        Ok(removed)
    }

    /// Record that a service was done, re-arming its notification.
    ///
    /// Distance reminders take the car's current odometer as the new
    /// baseline. Date reminders need `next_target_date`.
    pub fn mark_reminder_serviced(
        &mut self,
        car_id: &str,
        reminder_id: &str,
        next_target_date: Option<NaiveDate>,
    ) -> Result<(), CoreError> {
        let odometer = self.last_odometer(car_id);
        let reminder = self.reminder_mut(car_id, reminder_id)?;
        match reminder.kind {
            ReminderKind::Distance => reminder.last_service_odometer = Some(odometer),
            ReminderKind::Date => {
                let next = next_target_date.ok_or_else(|| {
                    CoreError::ValidationError(
                        "A date reminder needs the next target date".into(),
                    )
                })?;
                reminder.target_date = Some(next);
            }
        }
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    /// Status of every reminder on one car, including ones not yet due.
    pub fn reminder_statuses(&self, car_id: &str, today: NaiveDate) -> Result<Vec<ReminderStatus>, CoreError> {
        let car = self
            .logbook
            .settings
            .car(car_id)
            .ok_or_else(|| CoreError::CarNotFound(car_id.to_string()))?;
        Ok(self
            .reminder_service
            .evaluate_car(car, &self.logbook.trips, today, &self.config))
    }

    /// Due reminders across all cars.
    #[must_use]
    pub fn due_reminders(&self, today: NaiveDate) -> Vec<ReminderStatus> {
        self.logbook
            .settings
            .cars
            .iter()
            .flat_map(|car| {
                self.reminder_service
                    .evaluate_car(car, &self.logbook.trips, today, &self.config)
            })
            .filter(|s| s.due)
            .collect()
    }

    /// Notify every newly due reminder once.
    ///
    /// Does nothing unless notification permission is granted. Delivery is
    /// best effort; all new keys are recorded in one batch either way.
    /// Returns the intents that were sent.
    pub fn check_reminders(&mut self, notifier: &dyn Notifier, today: NaiveDate) -> Vec<NotificationIntent> {
        if notifier.permission() != NotificationPermission::Granted {
            return Vec::new();
        }

        let intents = self.reminder_service.pending_notifications(
            &self.logbook.settings.cars,
            &self.logbook.trips,
            &self.logbook.notified_reminders,
            today,
            &self.config,
        );
        if intents.is_empty() {
            return intents;
        }

        for intent in &intents {
            if let Err(e) = notifier.notify(intent) {
                tracing::warn!(key = %intent.key, error = %e, "notification delivery failed");
            }
        }
        self.logbook
            .notified_reminders
            .extend(intents.iter().map(|i| i.key.clone()));
        self.gateway
            .save_notified_reminders(&self.logbook.notified_reminders);
        intents
    }

    /// Dedup keys of reminders already notified.
    #[must_use]
    pub fn notified_reminders(&self) -> &[String] {
        &self.logbook.notified_reminders
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.logbook.settings
    }

    /// Replace all settings at once (settings screen "save").
    pub fn update_settings(&mut self, settings: AppSettings) -> Result<(), CoreError> {
        validate_fuel_price(settings.fuel_price)?;
        let mut seen = std::collections::HashSet::new();
        for car in &settings.cars {
            validate_car(car)?;
            if !seen.insert(car.id.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate car id '{}'",
                    car.id
                )));
            }
        }
        self.logbook.settings = settings;
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    /// Set the fuel price (EUR/L). Affects only trips finished afterwards.
    pub fn set_fuel_price(&mut self, fuel_price: f64) -> Result<(), CoreError> {
        validate_fuel_price(fuel_price)?;
        self.logbook.settings.fuel_price = fuel_price;
        self.gateway.save_settings(&self.logbook.settings);
        Ok(())
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.logbook.settings.theme = theme;
        self.gateway.save_settings(&self.logbook.settings);
    }

    // ── Derived Views ───────────────────────────────────────────────

    /// Totals for the active car as of `today`.
    #[must_use]
    pub fn stats(&self, today: NaiveDate) -> HistoryStats {
        self.stats_service.compute_stats(
            &self.logbook.trips,
            self.active_car(),
            today,
            self.config.chrono_locale(),
        )
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Export one car's trips. Fails with `NothingToExport` when it has none.
    pub fn export(&self, format: ExportFormat, car_id: &str) -> Result<String, CoreError> {
        self.export_service
            .export(format, &self.logbook.trips, car_id)
    }

    pub fn export_csv(&self, car_id: &str) -> Result<String, CoreError> {
        self.export(ExportFormat::Csv, car_id)
    }

    pub fn export_spreadsheet(&self, car_id: &str) -> Result<String, CoreError> {
        self.export(ExportFormat::Spreadsheet, car_id)
    }

    /// Full state as pretty JSON (debugging/backup).
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.logbook)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize logbook: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Car for a new trip: the given one (must exist) or the active car.
    fn trip_car(&self, car_id: Option<&str>) -> Result<&Car, CoreError> {
        if self.logbook.active_trip.is_some() {
            return Err(CoreError::ActiveTripInProgress);
        }
        match car_id {
            Some(id) => self
                .logbook
                .settings
                .car(id)
                .ok_or_else(|| CoreError::CarNotFound(id.to_string())),
            None => self
                .active_car()
                .ok_or_else(|| CoreError::CarNotFound("no car configured".into())),
        }
    }

    fn car_mut(&mut self, car_id: &str) -> Result<&mut Car, CoreError> {
        self.logbook
            .settings
            .car_mut(car_id)
            .ok_or_else(|| CoreError::CarNotFound(car_id.to_string()))
    }

    fn reminder_mut(&mut self, car_id: &str, reminder_id: &str) -> Result<&mut ServiceReminder, CoreError> {
        self.car_mut(car_id)?
            .service_reminders
            .iter_mut()
            .find(|r| r.id == reminder_id)
            .ok_or_else(|| CoreError::ReminderNotFound {
                car_id: car_id.to_string(),
                reminder_id: reminder_id.to_string(),
            })
    }
}

fn validate_fuel_price(fuel_price: f64) -> Result<(), CoreError> {
    if !fuel_price.is_finite() || fuel_price <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Fuel price must be positive, got {fuel_price}"
        )));
    }
    Ok(())
}

fn validate_car(car: &Car) -> Result<(), CoreError> {
    if car.id.trim().is_empty() {
        return Err(CoreError::ValidationError("Car id must not be empty".into()));
    }
    if !car.average_consumption.is_finite() || car.average_consumption <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Average consumption of '{}' must be positive, got {}",
            car.name, car.average_consumption
        )));
    }
    Ok(())
}

fn validate_reminder(reminder: &ServiceReminder) -> Result<(), CoreError> {
    if reminder.id.trim().is_empty() {
        return Err(CoreError::ValidationError("Reminder id must not be empty".into()));
    }
    match reminder.kind {
        ReminderKind::Distance if !reminder.interval.is_some_and(|i| i.is_finite() && i > 0.0) => {
            Err(CoreError::ValidationError(format!(
                "Distance reminder '{}' needs a positive interval",
                reminder.name
            )))
        }
        ReminderKind::Date if reminder.target_date.is_none() => Err(CoreError::ValidationError(
            format!("Date reminder '{}' needs a target date", reminder.name),
        )),
        _ => Ok(()),
    }
}
