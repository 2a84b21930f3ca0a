use chrono::NaiveDate;
use csv::WriterBuilder;
use quick_xml::se::{QuoteLevel, Serializer};
use serde::Serialize;

use crate::errors::CoreError;
use crate::models::trip::Trip;

/// Column headers shared by every export format.
pub const EXPORT_HEADERS: [&str; 12] = [
    "Date",
    "Start",
    "End",
    "Distance (km)",
    "Odometer start",
    "Odometer end",
    "GPS start",
    "GPS end",
    "Fuel price (EUR/L)",
    "Consumption (L/100km)",
    "Total cost (EUR)",
    "Note",
];

/// Byte order mark so spreadsheet apps detect UTF-8.
const BOM: &str = "\u{FEFF}";

/// Supported tabular export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Semicolon separated, decimal commas (Central European Excel)
    Csv,
    /// SpreadsheetML 2003 XML, opens as `.xls`
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Spreadsheet => "xls",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Spreadsheet => "application/vnd.ms-excel",
        }
    }

    /// Suggested download name, e.g. `trip_log_2025-03-09.csv`.
    pub fn file_name(&self, today: NaiveDate) -> String {
        format!("trip_log_{}.{}", today.format("%Y-%m-%d"), self.extension())
    }
}

/// Renders a car's trips as CSV or SpreadsheetML.
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    pub fn export(
        &self,
        format: ExportFormat,
        trips: &[Trip],
        car_id: &str,
    ) -> Result<String, CoreError> {
        match format {
            ExportFormat::Csv => self.export_csv(trips, car_id),
            ExportFormat::Spreadsheet => self.export_spreadsheet(trips, car_id),
        }
    }

    /// CSV with `;` separators, decimal commas and a UTF-8 BOM.
    pub fn export_csv(&self, trips: &[Trip], car_id: &str) -> Result<String, CoreError> {
        let trips = Self::trips_for_car(trips, car_id)?;

        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_writer(BOM.as_bytes().to_vec());
        writer.write_record(EXPORT_HEADERS)?;

        for trip in trips {
            writer.write_record([
                trip.date.format("%Y-%m-%d").to_string(),
                trip.start_time.clone(),
                trip.end_time.clone(),
                decimal_comma(trip.distance_km),
                decimal_comma(trip.start_odometer),
                decimal_comma(trip.end_odometer),
                trip.start_gps.clone().unwrap_or_default(),
                trip.end_gps.clone().unwrap_or_default(),
                decimal_comma(trip.fuel_price_at_time),
                decimal_comma(trip.consumption_at_time),
                decimal_comma(trip.total_cost),
                trip.note.clone().unwrap_or_default(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| CoreError::Serialization(format!("CSV is not valid UTF-8: {e}")))
    }

    /// SpreadsheetML 2003 workbook with a single "Trips" worksheet.
    pub fn export_spreadsheet(&self, trips: &[Trip], car_id: &str) -> Result<String, CoreError> {
        let trips = Self::trips_for_car(trips, car_id)?;

        let mut rows = Vec::with_capacity(trips.len() + 1);
        rows.push(Row {
            cells: EXPORT_HEADERS.iter().map(|h| Cell::text(h)).collect(),
        });
        for trip in trips {
            rows.push(Row {
                cells: vec![
                    Cell::text(&trip.date.format("%Y-%m-%d").to_string()),
                    Cell::text(&trip.start_time),
                    Cell::text(&trip.end_time),
                    Cell::number(trip.distance_km),
                    Cell::number(trip.start_odometer),
                    Cell::number(trip.end_odometer),
                    Cell::text(trip.start_gps.as_deref().unwrap_or("")),
                    Cell::text(trip.end_gps.as_deref().unwrap_or("")),
                    Cell::number(trip.fuel_price_at_time),
                    Cell::number(trip.consumption_at_time),
                    Cell::number(trip.total_cost),
                    Cell::text(trip.note.as_deref().unwrap_or("")),
                ],
            });
        }

        let workbook = Workbook {
            xmlns: SPREADSHEET_NS,
            xmlns_ss: SPREADSHEET_NS,
            worksheet: Worksheet {
                name: "Trips",
                table: Table { rows },
            },
        };

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?mso-application progid=\"Excel.Sheet\"?>\n",
        );
        let mut serializer = Serializer::new(&mut xml);
        serializer.set_quote_level(QuoteLevel::Full);
        workbook
            .serialize(serializer)
            .map_err(|e| CoreError::Serialization(format!("Failed to write SpreadsheetML: {e}")))?;
        xml.push('\n');
        Ok(xml)
    }

    fn trips_for_car<'a>(trips: &'a [Trip], car_id: &str) -> Result<Vec<&'a Trip>, CoreError> {
        let selected: Vec<&Trip> = trips.iter().filter(|t| t.car_id == car_id).collect();
        if selected.is_empty() {
            return Err(CoreError::NothingToExport);
        }
        Ok(selected)
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

fn decimal_comma(value: f64) -> String {
    value.to_string().replace('.', ",")
}

// ═══════════════════════════════════════════════════════════════════
// SpreadsheetML document
// ═══════════════════════════════════════════════════════════════════

const SPREADSHEET_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

#[derive(Serialize)]
struct Workbook<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@xmlns:ss")]
    xmlns_ss: &'a str,
    #[serde(rename = "Worksheet")]
    worksheet: Worksheet<'a>,
}

#[derive(Serialize)]
struct Worksheet<'a> {
    #[serde(rename = "@ss:Name")]
    name: &'a str,
    #[serde(rename = "Table")]
    table: Table,
}

#[derive(Serialize)]
struct Table {
    #[serde(rename = "Row")]
    rows: Vec<Row>,
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "Cell")]
    cells: Vec<Cell>,
}

#[derive(Serialize)]
struct Cell {
    #[serde(rename = "Data")]
    data: Data,
}

#[derive(Serialize)]
struct Data {
    #[serde(rename = "@ss:Type")]
    kind: &'static str,
    #[serde(rename = "$text")]
    value: String,
}

impl Cell {
    fn text(value: &str) -> Self {
        Self {
            data: Data {
                kind: "String",
                value: value.to_string(),
            },
        }
    }

    fn number(value: f64) -> Self {
        Self {
            data: Data {
                kind: "Number",
                value: value.to_string(),
            },
        }
    }
}
