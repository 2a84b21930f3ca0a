use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A completed start-to-end drive with its computed fuel use and cost.
///
/// Fuel price and consumption are snapshots taken when the trip was closed;
/// later settings changes never alter an existing trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Unique identifier
    pub id: String,

    /// Owning car. Empty only for records written before multi-car support;
    /// those are backfilled on load.
    #[serde(default, deserialize_with = "null_as_default")]
    pub car_id: String,

    /// Day the trip started
    pub date: NaiveDate,

    /// Display time (`HH:MM`), not sortable
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,

    /// end_odometer - start_odometer, rounded to 2 decimals
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance_km: f64,

    /// EUR per liter at the time the trip was closed
    #[serde(default, deserialize_with = "null_as_default")]
    pub fuel_price_at_time: f64,

    /// L/100 km at the time the trip was closed
    #[serde(default, deserialize_with = "null_as_default")]
    pub consumption_at_time: f64,

    /// EUR
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cost: f64,

    /// Liters
    #[serde(default, deserialize_with = "null_as_default")]
    pub fuel_consumed: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub start_odometer: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub end_odometer: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_gps: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_gps: Option<String>,
}

impl Trip {
    /// `true` when the record predates multi-car support.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.car_id.trim().is_empty()
    }
}

/// The single in-flight trip. Becomes a [`Trip`] when finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrip {
    #[serde(default, deserialize_with = "null_as_default")]
    pub car_id: String,

    pub start_date: NaiveDate,

    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,

    pub start_odometer: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_gps: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Older records sometimes hold `null` where a value was never set. Read
/// that as the field's default instead of rejecting the whole record.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
