use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, DurationRound};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::error::GenerationError;
use crate::schema::DATETIME_FORMAT;

/// Untyped table as read from an uploaded file
///
/// Headers come from the first row; every other non-empty row becomes a
/// [`RawRow`]. Nothing here knows which columns are required.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// One data row with its 1-based spreadsheet row number
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<String>,
}

impl RawTable {
    /// Build a table from a header and data rows numbered from row 2
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| RawRow {
                number: i + 2,
                cells,
            })
            .collect();
        RawTable { headers, rows }
    }

    /// First `n` rows keyed by header, for the preview panel
    pub fn head(&self, n: usize) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(c, header)| {
                        let value = row.cells.get(c).cloned().unwrap_or_default();
                        (header.clone(), serde_json::Value::String(value))
                    })
                    .collect()
            })
            .collect()
    }

    fn push_row(&mut self, number: usize, cells: Vec<String>) {
        if cells.iter().all(|c| c.trim().is_empty()) {
            return;
        }
        self.rows.push(RawRow { number, cells });
    }
}

/// Load a table from CSV text
///
/// The first line is the header. Fields may be quoted, with `""` standing
/// for a literal quote and line breaks allowed inside quotes. A header
/// containing `;` but no `,` switches the delimiter to `;`.
///
/// # Errors
/// * Returns an error if the content is not UTF-8 or has no header line
///
/// # Examples
/// ```
/// use enrollment_report::loader::from_csv;
///
/// let table = from_csv(b"a,b\n1,\"x, y\"\n").unwrap();
/// assert_eq!(table.headers, vec!["a", "b"]);
/// assert_eq!(table.rows[0].cells[1], "x, y");
/// ```
pub fn from_csv(bytes: &[u8]) -> Result<RawTable, GenerationError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| GenerationError::Unreadable(format!("CSV is not UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let first_line = text.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains(';') && !first_line.contains(',') {
        ';'
    } else {
        ','
    };

    let mut records = parse_csv(text, delimiter).into_iter();
    let (_, headers) = records
        .next()
        .ok_or_else(|| GenerationError::Unreadable("CSV file is empty".to_string()))?;

    let mut table = RawTable {
        headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
        rows: Vec::new(),
    };
    for (line, cells) in records {
        table.push_row(line, cells);
    }

    Ok(table)
}

/// Load a table from the first worksheet of a workbook
///
/// Date cells are rendered as `YYYY-MM-DD HH:MM:SS` and whole floats lose
/// their fractional part, so phone numbers stored as numbers read back as
/// typed.
///
/// # Errors
/// * Returns an error if the bytes are not a workbook calamine can open,
///   or the workbook has no sheets
pub fn from_excel(bytes: &[u8]) -> Result<RawTable, GenerationError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    // Get the first worksheet
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| GenerationError::Unreadable("No sheets found in Excel file".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let (first_row, _) = range.start().unwrap_or((0, 0));

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Err(GenerationError::Unreadable("Excel sheet is empty".to_string())),
    };

    let mut table = RawTable {
        headers,
        rows: Vec::new(),
    };
    for (offset, row) in rows.enumerate() {
        let number = first_row as usize + offset + 2;
        table.push_row(number, row.iter().map(cell_text).collect());
    }

    Ok(table)
}

/// Detect file type and load the appropriate format
///
/// # Examples
/// ```no_run
/// use enrollment_report::loader::load_table;
///
/// let bytes = std::fs::read("inscripciones.xlsx").unwrap();
/// match load_table("inscripciones.xlsx", &bytes) {
///     Ok(table) => println!("Loaded {} rows", table.rows.len()),
///     Err(e) => eprintln!("Error loading file: {}", e),
/// }
/// ```
pub fn load_table(filename: &str, bytes: &[u8]) -> Result<RawTable, GenerationError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(bytes),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => from_excel(bytes),
        Some(ext) => Err(GenerationError::Unreadable(format!(
            "Unsupported file extension: {}",
            ext
        ))),
        None => Err(GenerationError::Unreadable(
            "File has no extension".to_string(),
        )),
    }
}

/// Read a table from disk, dispatching on the file extension
pub fn load_file(path: impl AsRef<Path>) -> Result<RawTable, GenerationError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    load_table(filename, &bytes)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        // as_datetime honors the workbook's 1900/1904 date system
        Data::DateTime(dt) => match dt
            .as_datetime()
            .and_then(|parsed| parsed.duration_round(Duration::seconds(1)).ok())
        {
            Some(parsed) => parsed.format(DATETIME_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

// Split CSV text into records, each tagged with the line it starts on
fn parse_csv(text: &str, delimiter: char) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // Double quote inside quoted field - add a single quote
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            '\n' if in_quotes => {
                line += 1;
                field.push('\n');
            }
            '\r' if !in_quotes => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }

    // Add the last record when the text does not end with a newline
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::cell_text;
    use calamine::{Data, ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn date_cells_follow_the_workbook_date_system() {
        let from_1900 = Data::DateTime(ExcelDateTime::new(
            45_292.375,
            ExcelDateTimeType::DateTime,
            false,
        ));
        let from_1904 = Data::DateTime(ExcelDateTime::new(
            43_830.375,
            ExcelDateTimeType::DateTime,
            true,
        ));

        assert_eq!(cell_text(&from_1900), "2024-01-01 09:00:00");
        assert_eq!(cell_text(&from_1904), "2024-01-01 09:00:00");
        println!("✓ 1900 and 1904 serials of the same instant read the same");
    }

    #[test]
    fn date_cells_round_to_the_nearest_second() {
        // 09:00:00 minus a quarter second
        let serial = 45_292.375 - 0.25 / 86_400.0;
        let cell = Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_text(&cell), "2024-01-01 09:00:00");
        println!("✓ Sub-second noise does not shift the displayed time");
    }

    #[test]
    fn whole_floats_drop_the_fraction() {
        assert_eq!(cell_text(&Data::Float(3_001_234_567.0)), "3001234567");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
