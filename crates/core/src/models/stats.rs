use serde::{Deserialize, Serialize};

/// Aggregate figures for one car's trips. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    /// Sum of all trip distances, km
    pub total_distance: f64,

    /// Distance driven in the current calendar month, km
    pub monthly_distance: f64,

    /// Localized month name, first letter capitalized (empty without a car)
    pub current_month_name: String,

    pub current_year: i32,

    /// EUR
    pub total_cost: f64,

    /// Liters
    pub total_fuel: f64,

    /// total_distance / trip count, or 0 without trips
    pub average_trip_distance: f64,
}

impl HistoryStats {
    /// All-zero stats for when no car is selected.
    pub fn empty(current_year: i32) -> Self {
        Self {
            total_distance: 0.0,
            monthly_distance: 0.0,
            current_month_name: String::new(),
            current_year,
            total_cost: 0.0,
            total_fuel: 0.0,
            average_trip_distance: 0.0,
        }
    }
}
