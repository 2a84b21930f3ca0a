// ═══════════════════════════════════════════════════════════════════
// Stats Tests — per-car totals, calendar month, averages
// ═══════════════════════════════════════════════════════════════════

use chrono::{Locale, NaiveDate};
use trip_logbook_core::models::car::Car;
use trip_logbook_core::models::stats::HistoryStats;
use trip_logbook_core::models::trip::Trip;
use trip_logbook_core::services::stats_service::{month_name, StatsService};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn car(id: &str) -> Car {
    Car {
        id: id.into(),
        name: format!("Car {id}"),
        license_plate: String::new(),
        is_default: false,
        average_consumption: 6.5,
        service_reminders: Vec::new(),
    }
}

fn trip(car_id: &str, on: NaiveDate, distance_km: f64, total_cost: f64, fuel_consumed: f64) -> Trip {
    Trip {
        id: format!("{car_id}-{on}-{distance_km}"),
        car_id: car_id.into(),
        date: on,
        start_time: "07:00".into(),
        end_time: "08:00".into(),
        distance_km,
        fuel_price_at_time: 1.65,
        consumption_at_time: 6.5,
        total_cost,
        fuel_consumed,
        note: None,
        start_odometer: 0.0,
        end_odometer: distance_km,
        start_gps: None,
        end_gps: None,
    }
}

fn today() -> NaiveDate {
    date(2025, 3, 15)
}

mod compute_stats {
    use super::*;

    #[test]
    fn totals_and_current_month() {
        let trips = vec![
            trip("A", date(2025, 3, 2), 10.0, 5.0, 1.0),
            trip("A", date(2025, 2, 20), 20.0, 8.0, 2.0),
        ];
        let a = car("A");
        let stats = StatsService::new().compute_stats(&trips, Some(&a), today(), Locale::en_US);

        assert_eq!(stats.total_distance, 30.0);
        assert_eq!(stats.monthly_distance, 10.0);
        assert_eq!(stats.average_trip_distance, 15.0);
        assert_eq!(stats.total_cost, 13.0);
        assert_eq!(stats.total_fuel, 3.0);
        assert_eq!(stats.current_year, 2025);
        assert_eq!(stats.current_month_name, "March");
    }

    #[test]
    fn other_cars_are_ignored() {
        let trips = vec![
            trip("A", date(2025, 3, 2), 10.0, 5.0, 1.0),
            trip("B", date(2025, 3, 3), 500.0, 80.0, 30.0),
        ];
        let a = car("A");
        let stats = StatsService::new().compute_stats(&trips, Some(&a), today(), Locale::en_US);
        assert_eq!(stats.total_distance, 10.0);
        assert_eq!(stats.total_cost, 5.0);
    }

    #[test]
    fn same_month_of_previous_year_is_not_monthly() {
        let trips = vec![
            trip("A", date(2024, 3, 10), 50.0, 0.0, 0.0),
            trip("A", date(2025, 3, 31), 7.0, 0.0, 0.0),
        ];
        let a = car("A");
        let stats = StatsService::new().compute_stats(&trips, Some(&a), date(2025, 3, 1), Locale::en_US);
        assert_eq!(stats.monthly_distance, 7.0);
        assert_eq!(stats.total_distance, 57.0);
    }

    #[test]
    fn car_without_trips_has_zero_average() {
        let a = car("A");
        let stats = StatsService::new().compute_stats(&[], Some(&a), today(), Locale::en_US);
        assert_eq!(stats.average_trip_distance, 0.0);
        assert_eq!(stats.total_distance, 0.0);
        assert_eq!(stats.current_month_name, "March");
    }

    #[test]
    fn no_car_gives_zeroed_stats() {
        let trips = vec![trip("A", date(2025, 3, 2), 10.0, 5.0, 1.0)];
        let stats = StatsService::new().compute_stats(&trips, None, today(), Locale::en_US);
        assert_eq!(stats, HistoryStats::empty(2025));
        assert_eq!(stats.current_month_name, "");
    }
}

mod month_names {
    use super::*;

    #[test]
    fn english_month() {
        assert_eq!(month_name(date(2025, 10, 1), Locale::en_US), "October");
    }

    #[test]
    fn slovak_month_is_capitalized() {
        let name = month_name(date(2025, 10, 1), Locale::sk_SK);
        assert!(!name.is_empty());
        assert!(name.chars().next().unwrap().is_uppercase());
        assert!(name.chars().skip(1).all(|c| !c.is_uppercase()));
    }
}
