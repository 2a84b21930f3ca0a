use chrono::{Datelike, Locale, NaiveDate};

use crate::models::car::Car;
use crate::models::stats::HistoryStats;
use crate::models::trip::Trip;

/// Derives per-car totals from the trip list.
///
/// Linear scans only; a personal logbook holds thousands of trips at most.
pub struct StatsService;

impl StatsService {
    pub fn new() -> Self {
        Self
    }

    /// Stats for `car`'s trips as of `today`. Zeroed when there is no car.
    pub fn compute_stats(
        &self,
        trips: &[Trip],
        car: Option<&Car>,
        today: NaiveDate,
        locale: Locale,
    ) -> HistoryStats {
        let Some(car) = car else {
            return HistoryStats::empty(today.year());
        };

        let mut count = 0usize;
        let mut total_distance = 0.0;
        let mut monthly_distance = 0.0;
        let mut total_cost = 0.0;
        let mut total_fuel = 0.0;

        for trip in trips.iter().filter(|t| t.car_id == car.id) {
            count += 1;
            total_distance += trip.distance_km;
            total_cost += trip.total_cost;
            total_fuel += trip.fuel_consumed;
            if trip.date.year() == today.year() && trip.date.month() == today.month() {
                monthly_distance += trip.distance_km;
            }
        }

        HistoryStats {
            total_distance,
            monthly_distance,
            current_month_name: month_name(today, locale),
            current_year: today.year(),
            total_cost,
            total_fuel,
            average_trip_distance: if count > 0 {
                total_distance / count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Full localized month name with the first letter upper-cased.
pub fn month_name(date: NaiveDate, locale: Locale) -> String {
    let name = date.format_localized("%B", locale).to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
