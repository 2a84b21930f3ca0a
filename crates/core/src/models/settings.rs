use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::car::{Car, ServiceReminder};

/// Fuel price assumed when none was ever configured (EUR per liter).
pub const DEFAULT_FUEL_PRICE: f64 = 1.65;

/// Color scheme preference. Only stored; applying it is up to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the platform setting. Unknown stored values read as this.
    #[default]
    #[serde(other)]
    System,
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
            ThemeMode::System => write!(f, "system"),
        }
    }
}

/// Current (multi-car) settings shape.
///
/// Every field except `cars` has a default, so a stored object is read as a
/// shallow merge of its values over the defaults. Fields this version does
/// not know about are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// EUR per liter
    #[serde(default = "default_fuel_price")]
    pub fuel_price: f64,

    pub cars: Vec<Car>,

    /// Car selected in the UI. Should reference an existing car.
    #[serde(default)]
    pub last_active_car_id: String,

    #[serde(default)]
    pub theme: ThemeMode,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    /// Hard defaults: no cars. Used when the stored blob is unreadable.
    fn default() -> Self {
        Self {
            fuel_price: DEFAULT_FUEL_PRICE,
            cars: Vec::new(),
            last_active_car_id: String::new(),
            theme: ThemeMode::System,
            extra: Map::new(),
        }
    }
}

impl AppSettings {
    /// First-run settings: hard defaults plus one default car, selected.
    pub fn first_run() -> Self {
        let car = Car::default_car(super::car::DEFAULT_CONSUMPTION, Vec::new());
        Self {
            last_active_car_id: car.id.clone(),
            cars: vec![car],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn car(&self, car_id: &str) -> Option<&Car> {
        self.cars.iter().find(|c| c.id == car_id)
    }

    pub fn car_mut(&mut self, car_id: &str) -> Option<&mut Car> {
        self.cars.iter_mut().find(|c| c.id == car_id)
    }

    /// The selected car, falling back to the first car when the selection
    /// is empty or dangling.
    #[must_use]
    pub fn active_car(&self) -> Option<&Car> {
        self.car(&self.last_active_car_id).or_else(|| self.cars.first())
    }
}

fn default_fuel_price() -> f64 {
    DEFAULT_FUEL_PRICE
}

/// Settings written by the single-car version: everything lived at the top
/// level and there was no `cars` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySettingsV0 {
    #[serde(default)]
    pub fuel_price: Option<f64>,

    #[serde(default)]
    pub average_consumption: Option<f64>,

    /// Single service interval in km
    #[serde(default)]
    pub service_interval: Option<f64>,

    #[serde(default)]
    pub service_name: Option<String>,

    #[serde(default)]
    pub last_service_odometer: Option<f64>,

    /// Later single-car builds stored a reminder list directly
    #[serde(default)]
    pub service_reminders: Option<Vec<ServiceReminder>>,

    #[serde(default)]
    pub theme: Option<ThemeMode>,
}

/// A persisted settings blob, classified by schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredSettings {
    /// Pre multi-car shape (no `cars` field)
    Legacy(LegacySettingsV0),
    /// Multi-car shape
    Current(AppSettings),
}
