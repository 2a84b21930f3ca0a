use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Progress of a reminder towards its due point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReminderProgress {
    #[serde(rename_all = "camelCase")]
    Distance {
        /// km left until service; negative when overdue
        remaining_km: f64,
        /// Odometer reading at which service is due
        due_at_odometer: f64,
        /// Share of the interval already driven, clamped to 0..=100
        percent_used: f64,
    },
    #[serde(rename_all = "camelCase")]
    Date {
        /// Whole calendar days until the target; 0 or less when expired
        days_remaining: i64,
        target_date: NaiveDate,
    },
}

/// Evaluated state of one reminder on one car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderStatus {
    pub car_id: String,
    pub car_name: String,
    pub reminder_id: String,
    pub reminder_name: String,
    pub due: bool,
    pub message: String,
    pub progress: ReminderProgress,
    /// Identifies this due-event for notification de-duplication
    pub notification_key: String,
}

impl ReminderStatus {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self.progress, ReminderProgress::Date { days_remaining, .. } if days_remaining <= 0)
    }
}

/// A notification the platform should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub key: String,
    pub title: String,
    pub body: String,
    pub icon: String,
}
