use chrono::NaiveDate;

use crate::config::LogbookConfig;
use crate::models::car::{Car, ReminderKind, ServiceReminder};
use crate::models::reminder::{NotificationIntent, ReminderProgress, ReminderStatus};
use crate::models::trip::Trip;

/// Evaluates service reminders against the trip log and decides which
/// due reminders still need a notification.
///
/// Pure business logic. Delivery and persistence of notified keys are
/// handled by the caller.
pub struct ReminderService;

impl ReminderService {
    pub fn new() -> Self {
        Self
    }

    /// Odometer after the car's latest trip, 0 when it has none.
    ///
    /// `trips` must be newest first; the first match is taken as the latest.
    pub fn last_odometer(&self, trips: &[Trip], car_id: &str) -> f64 {
        trips
            .iter()
            .find(|t| t.car_id == car_id)
            .map_or(0.0, |t| t.end_odometer)
    }

    /// Dedup key of a reminder's current due-event. Servicing the reminder
    /// (new baseline odometer or target date) yields a new key.
    pub fn notification_key(&self, car: &Car, reminder: &ServiceReminder) -> String {
        let baseline = match reminder.kind {
            ReminderKind::Distance => reminder.baseline_odometer().to_string(),
            ReminderKind::Date => reminder
                .target_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        };
        format!("{}-{}-{}", car.id, reminder.id, baseline)
    }

    /// Key that older installs recorded for a distance reminder that was
    /// never serviced. They had no baseline to put in it.
    fn unserviced_legacy_key(&self, car: &Car, reminder: &ServiceReminder) -> Option<String> {
        (reminder.kind == ReminderKind::Distance && reminder.baseline_odometer() == 0.0)
            .then(|| format!("{}-{}-undefined", car.id, reminder.id))
    }

    /// Whether this due-event was already announced, under the current key
    /// or under the key older installs used for it.
    pub fn was_notified(&self, car: &Car, reminder: &ServiceReminder, notified: &[String]) -> bool {
        let key = self.notification_key(car, reminder);
        notified.contains(&key)
            || self
                .unserviced_legacy_key(car, reminder)
                .is_some_and(|legacy| notified.contains(&legacy))
    }

    /// Evaluate one reminder. `None` when the reminder lacks the field its
    /// kind needs (no positive interval, no target date).
    pub fn evaluate(
        &self,
        car: &Car,
        reminder: &ServiceReminder,
        last_odometer: f64,
        today: NaiveDate,
        config: &LogbookConfig,
    ) -> Option<ReminderStatus> {
        let (due, message, progress) = match reminder.kind {
            ReminderKind::Distance => {
                let interval = reminder.interval.filter(|i| *i > 0.0)?;
                let baseline = reminder.baseline_odometer();
                let driven = last_odometer - baseline;
                let remaining = interval - driven;
                let due = remaining <= config.distance_warning_km;
                let message = if due {
                    format!(
                        "{}: only {} km left until {}!",
                        car.name,
                        remaining.max(0.0).floor(),
                        reminder.name
                    )
                } else {
                    format!("{} km left until {}", remaining.floor(), reminder.name)
                };
                let progress = ReminderProgress::Distance {
                    remaining_km: remaining,
                    due_at_odometer: baseline + interval,
                    percent_used: (driven / interval * 100.0).clamp(0.0, 100.0),
                };
                (due, message, progress)
            }
            ReminderKind::Date => {
                let target_date = reminder.target_date?;
                let days_remaining = (target_date - today).num_days();
                let due = days_remaining <= config.date_warning_days;
                let message = if days_remaining <= 0 {
                    format!("{}: {} has expired!", car.name, reminder.name)
                } else if due {
                    format!(
                        "{}: only {} days left until {}!",
                        car.name, days_remaining, reminder.name
                    )
                } else {
                    format!("{} days left until {}", days_remaining, reminder.name)
                };
                let progress = ReminderProgress::Date {
                    days_remaining,
                    target_date,
                };
                (due, message, progress)
            }
        };

        Some(ReminderStatus {
            car_id: car.id.clone(),
            car_name: car.name.clone(),
            reminder_id: reminder.id.clone(),
            reminder_name: reminder.name.clone(),
            due,
            message,
            progress,
            notification_key: self.notification_key(car, reminder),
        })
    }

    /// Evaluate every reminder of one car, in the car's reminder order.
    pub fn evaluate_car(
        &self,
        car: &Car,
        trips: &[Trip],
        today: NaiveDate,
        config: &LogbookConfig,
    ) -> Vec<ReminderStatus> {
        let last_odometer = self.last_odometer(trips, &car.id);
        car.service_reminders
            .iter()
            .filter_map(|r| self.evaluate(car, r, last_odometer, today, config))
            .collect()
    }

    /// One intent per due reminder (across all cars) not yet announced.
    pub fn pending_notifications(
        &self,
        cars: &[Car],
        trips: &[Trip],
        notified: &[String],
        today: NaiveDate,
        config: &LogbookConfig,
    ) -> Vec<NotificationIntent> {
        cars.iter()
            .flat_map(|car| {
                let last_odometer = self.last_odometer(trips, &car.id);
                car.service_reminders.iter().filter_map(move |reminder| {
                    if self.was_notified(car, reminder, notified) {
                        return None;
                    }
                    self.evaluate(car, reminder, last_odometer, today, config)
                })
            })
            .filter(|status| status.due)
            .map(|status| NotificationIntent {
                title: format!("Service reminder: {}", status.reminder_name),
                body: status.message,
                icon: config.notification_icon.clone(),
                key: status.notification_key,
            })
            .collect()
    }
}

impl Default for ReminderService {
    fn default() -> Self {
        Self::new()
    }
}
