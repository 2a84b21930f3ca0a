use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Consumption assumed for cars that never had one configured (L/100 km).
pub const DEFAULT_CONSUMPTION: f64 = 6.5;

/// Id of the car synthesized on first run and by legacy migration.
pub const DEFAULT_CAR_ID: &str = "default-car-1";

/// Display name of the synthesized default car.
pub const DEFAULT_CAR_NAME: &str = "My Car";

/// How a service reminder decides it is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    /// Due after driving `interval` km since `last_service_odometer`
    #[default]
    Distance,
    /// Due on `target_date`
    Date,
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderKind::Distance => write!(f, "distance"),
            ReminderKind::Date => write!(f, "date"),
        }
    }
}

/// A recurring service item tracked per car (oil change, inspection, ...).
///
/// Only the fields relevant to `kind` are meaningful. The other kind's
/// fields are ignored but kept, so switching kinds in a settings editor
/// does not lose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReminder {
    /// Unique within the owning car
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ReminderKind,

    /// Service interval in km (distance reminders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,

    /// Odometer reading at the last service, km (distance reminders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_odometer: Option<f64>,

    /// Due date (date reminders)
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<NaiveDate>,
}

impl ServiceReminder {
    /// A distance reminder due every `interval` km after `last_service_odometer`.
    pub fn distance(
        id: impl Into<String>,
        name: impl Into<String>,
        interval: f64,
        last_service_odometer: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ReminderKind::Distance,
            interval: Some(interval),
            last_service_odometer: Some(last_service_odometer),
            target_date: None,
        }
    }

    /// A date reminder due on `target_date`.
    pub fn date(id: impl Into<String>, name: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ReminderKind::Date,
            interval: None,
            last_service_odometer: None,
            target_date: Some(target_date),
        }
    }

    /// Baseline odometer, 0 when never serviced.
    #[must_use]
    pub fn baseline_odometer(&self) -> f64 {
        self.last_service_odometer.unwrap_or(0.0)
    }
}

/// A tracked vehicle with its own consumption rate and reminders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    /// Stable identifier, referenced by trips
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub license_plate: String,

    #[serde(default)]
    pub is_default: bool,

    /// Liters per 100 km
    #[serde(default = "default_consumption")]
    pub average_consumption: f64,

    #[serde(default)]
    pub service_reminders: Vec<ServiceReminder>,
}

impl Car {
    /// Create a car with a fresh UUID and default consumption.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("car-{}", uuid::Uuid::new_v4()),
            name: name.into(),
            license_plate: String::new(),
            is_default: false,
            average_consumption: DEFAULT_CONSUMPTION,
            service_reminders: Vec::new(),
        }
    }

    /// The car created on first run or by legacy migration.
    pub fn default_car(average_consumption: f64, service_reminders: Vec<ServiceReminder>) -> Self {
        Self {
            id: DEFAULT_CAR_ID.to_string(),
            name: DEFAULT_CAR_NAME.to_string(),
            license_plate: String::new(),
            is_default: true,
            average_consumption,
            service_reminders,
        }
    }

    #[must_use]
    pub fn reminder(&self, reminder_id: &str) -> Option<&ServiceReminder> {
        self.service_reminders.iter().find(|r| r.id == reminder_id)
    }
}

fn default_consumption() -> f64 {
    DEFAULT_CONSUMPTION
}

/// Date inputs persist `""` when left blank; treat that (and any other
/// unparseable value) as "no date".
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_lenient_date))
}

/// `YYYY-MM-DD`, or a full ISO timestamp of which only the date part is used.
pub(crate) fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
