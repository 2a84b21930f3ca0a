use chrono::NaiveDateTime;

use crate::errors::CoreError;
use crate::models::car::Car;
use crate::models::trip::{ActiveTrip, Trip};

/// Opens and closes trips: odometer validation, distance/fuel/cost math,
/// and the price/consumption snapshot.
///
/// Pure: callers decide where the resulting records go.
pub struct TripService;

impl TripService {
    pub fn new() -> Self {
        Self
    }

    /// Build the active trip for `car`, starting at `start_odometer`.
    pub fn start(
        &self,
        car: &Car,
        start_odometer: f64,
        note: Option<String>,
        start_gps: Option<String>,
        at: NaiveDateTime,
    ) -> Result<ActiveTrip, CoreError> {
        validate_reading(start_odometer)?;
        Ok(ActiveTrip {
            car_id: car.id.clone(),
            start_date: at.date(),
            start_time: display_time(at),
            start_odometer,
            start_gps,
            note: non_blank(note),
        })
    }

    /// Close `active` at `end_odometer`, snapshotting `consumption`
    /// (L/100 km) and `fuel_price` (EUR/L).
    #[allow(clippy::too_many_arguments)]
    pub fn finish(
        &self,
        active: &ActiveTrip,
        end_odometer: f64,
        consumption: f64,
        fuel_price: f64,
        note: Option<String>,
        end_gps: Option<String>,
        at: NaiveDateTime,
    ) -> Result<Trip, CoreError> {
        validate_reading(end_odometer)?;
        if end_odometer <= active.start_odometer {
            return Err(CoreError::InvalidTripInput(format!(
                "End odometer ({end_odometer}) must be greater than start odometer ({})",
                active.start_odometer
            )));
        }

        let distance = end_odometer - active.start_odometer;
        let fuel_consumed = distance / 100.0 * consumption;
        let total_cost = fuel_consumed * fuel_price;

        Ok(Trip {
            id: uuid::Uuid::new_v4().to_string(),
            car_id: active.car_id.clone(),
            date: active.start_date,
            start_time: active.start_time.clone(),
            end_time: display_time(at),
            distance_km: round2(distance),
            fuel_price_at_time: fuel_price,
            consumption_at_time: consumption,
            total_cost: round2(total_cost),
            fuel_consumed: round2(fuel_consumed),
            note: non_blank(note).or_else(|| active.note.clone()),
            start_odometer: active.start_odometer,
            end_odometer,
            start_gps: active.start_gps.clone(),
            end_gps,
        })
    }
}

impl Default for TripService {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a user-typed odometer reading. Accepts a decimal comma.
pub fn parse_odometer(input: &str) -> Result<f64, CoreError> {
    let normalized = input.trim().replace(',', ".");
    let value: f64 = normalized.parse().map_err(|_| {
        CoreError::InvalidTripInput(format!("'{}' is not a number", input.trim()))
    })?;
    validate_reading(value)?;
    Ok(value)
}

fn validate_reading(value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::InvalidTripInput(format!(
            "Odometer reading must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn display_time(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

fn non_blank(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Round to 2 decimal places (cents, hundredths of a liter / km).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
