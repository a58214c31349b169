//! Column validation and typed record conversion
//!
//! The uploaded table is only trusted after [`validate`] has confirmed the
//! five required columns and converted every row into an
//! [`EnrollmentRecord`]. Aggregation never sees untyped cells.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{GenerationError, ReportError, SchemaError};
use crate::loader::RawTable;
use crate::record::{EnrollmentDataset, EnrollmentRecord};

pub const FULL_NAME: &str = "Nombre y apellidos completos";
pub const STARTED_AT: &str = "Hora de inicio";
pub const COURSE: &str = "Curso de interés";
pub const EMAIL: &str = "Correo de contacto";
pub const PHONE: &str = "Número de contacto";

/// Required column identifiers, in the order missing ones are reported
pub const REQUIRED_COLUMNS: [&str; 5] = [FULL_NAME, STARTED_AT, COURSE, EMAIL, PHONE];

/// Display format for timestamps everywhere in the report
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_INPUT_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

// 9999-12-31 as an Excel serial day
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Required columns absent from `headers`, in required order
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.as_ref().trim() == **required))
        .map(|required| required.to_string())
        .collect()
}

/// Position of each required column in `headers`
///
/// # Errors
/// * [`SchemaError::MissingColumns`] listing every absent column
pub fn column_positions<S: AsRef<str>>(headers: &[S]) -> Result<[usize; 5], SchemaError> {
    let missing = missing_columns(headers);
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    let mut positions = [0usize; 5];
    for (slot, required) in positions.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
        // presence was checked above
        *slot = headers
            .iter()
            .position(|h| h.as_ref().trim() == *required)
            .unwrap_or_default();
    }
    Ok(positions)
}

/// Turn an untyped table into an enrollment dataset
///
/// The column check runs first; when it fails no row is looked at.
///
/// # Errors
/// * [`ReportError::Schema`] when required columns are missing
/// * [`ReportError::Generation`] when a start time is blank or cannot be
///   read as a date-time; other cells are taken as written
pub fn validate(table: &RawTable) -> Result<EnrollmentDataset, ReportError> {
    let positions = column_positions(&table.headers)?;
    let [name_col, start_col, course_col, email_col, phone_col] = positions;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let cell = |col: usize| -> String {
            row.cells
                .get(col)
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        };

        let raw_start = cell(start_col);
        let started_at = parse_timestamp(&raw_start).ok_or_else(|| {
            let reason = if raw_start.is_empty() {
                "empty cell".to_string()
            } else {
                format!("\"{}\" is not a date-time", raw_start)
            };
            GenerationError::InvalidValue {
                row: row.number,
                column: STARTED_AT.to_string(),
                reason,
            }
        })?;

        records.push(EnrollmentRecord {
            full_name: cell(name_col),
            started_at,
            course: cell(course_col),
            email: cell(email_col),
            phone: cell(phone_col),
        });
    }

    log::debug!("validated {} enrollment rows", records.len());
    Ok(EnrollmentDataset::new(records))
}

/// Parse a start timestamp as written in a spreadsheet cell
///
/// Accepts ISO-like and day-first date-times, bare dates (midnight) and
/// Excel serial day numbers.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for format in DATETIME_INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    for format in DATE_INPUT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    value.parse::<f64>().ok().and_then(excel_serial_to_datetime)
}

/// Convert an Excel serial day number (1900 date system) to a date-time
///
/// Fractions are rounded to the nearest second.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}
