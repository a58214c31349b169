use chrono::NaiveDate;
use enrollment_report::error::{GenerationError, ReportError, SchemaError};
use enrollment_report::loader::RawTable;
use enrollment_report::schema::{
    REQUIRED_COLUMNS, excel_serial_to_datetime, missing_columns, parse_timestamp, validate,
};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

#[test]
fn all_columns_present_reports_nothing_missing() {
    assert!(missing_columns(&REQUIRED_COLUMNS).is_empty());

    let mut shuffled = headers(&REQUIRED_COLUMNS);
    shuffled.reverse();
    shuffled.push("Columna extra".to_string());
    assert!(missing_columns(&shuffled).is_empty());
    println!("✓ Column order and extra columns do not matter");
}

#[test]
fn missing_email_column_is_named() {
    println!("\n====== Testing missing columns ======");
    let table = RawTable::new(
        headers(&[
            "Nombre y apellidos completos",
            "Hora de inicio",
            "Curso de interés",
            "Número de contacto",
        ]),
        vec![row(&["Ana", "2024-01-01 09:00:00", "Python", "111"])],
    );

    assert_eq!(missing_columns(&table.headers), vec!["Correo de contacto"]);

    let err = validate(&table).unwrap_err();
    assert_eq!(err.kind(), "schema");
    assert_eq!(err.missing_columns(), ["Correo de contacto".to_string()]);
    assert!(matches!(
        err,
        ReportError::Schema(SchemaError::MissingColumns(ref missing)) if missing.len() == 1
    ));
    assert!(err.to_string().contains("Correo de contacto"));
    println!("✓ Exactly the missing column is reported: {}", err);
}

#[test]
fn missing_columns_follow_required_order() {
    let missing = missing_columns(&["Curso de interés", "Otra"]);
    assert_eq!(
        missing,
        vec![
            "Nombre y apellidos completos",
            "Hora de inicio",
            "Correo de contacto",
            "Número de contacto",
        ]
    );
    println!("✓ Missing columns are listed in required order");
}

#[test]
fn validates_rows_into_records() {
    let table = RawTable::new(
        headers(&[
            "Número de contacto",
            "Correo de contacto",
            "Curso de interés",
            "Hora de inicio",
            "Nombre y apellidos completos",
        ]),
        vec![
            row(&["111", "ana@x.com", "Python", "2024-01-01 09:00:00", "Ana"]),
            row(&["222", "luis@x.com", "Excel", "2024-01-02 10:00:00", "Luis"]),
        ],
    );

    let dataset = validate(&table).unwrap();
    assert_eq!(dataset.len(), 2);
    let first = &dataset.records()[0];
    assert_eq!(first.full_name, "Ana");
    assert_eq!(first.course, "Python");
    assert_eq!(first.email, "ana@x.com");
    assert_eq!(first.phone, "111");
    assert_eq!(
        first.started_at,
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    );
    println!("✓ Columns are matched by name, not by position");
}

#[test]
fn header_only_table_gives_empty_dataset() {
    let table = RawTable::new(headers(&REQUIRED_COLUMNS), Vec::new());
    let dataset = validate(&table).unwrap();
    assert!(dataset.is_empty());
    println!("✓ Header-only table passes the column check with no records");
}

#[test]
fn blank_text_cells_are_kept_as_written() {
    let table = RawTable::new(
        headers(&REQUIRED_COLUMNS),
        vec![row(&["Luis", "2024-01-02 10:00:00", "Excel", "  ", "222"])],
    );

    let dataset = validate(&table).unwrap();
    assert_eq!(dataset.records()[0].email, "");
    println!("✓ Blank email is not rejected, only column presence is checked");
}

#[test]
fn blank_start_time_is_a_generation_error() {
    let table = RawTable::new(
        headers(&REQUIRED_COLUMNS),
        vec![
            row(&["Ana", "2024-01-01 09:00:00", "Python", "a@x.com", "111"]),
            row(&["Luis", "", "Excel", "l@x.com", "222"]),
        ],
    );

    let err = validate(&table).unwrap_err();
    assert_eq!(err.kind(), "generation");
    assert!(err.missing_columns().is_empty());
    match err {
        ReportError::Generation(GenerationError::InvalidValue { row, column, reason }) => {
            assert_eq!(row, 3);
            assert_eq!(column, "Hora de inicio");
            assert_eq!(reason, "empty cell");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    println!("✓ Blank start time is reported with its sheet row");
}

#[test]
fn unparseable_start_time_is_a_generation_error() {
    let table = RawTable::new(
        headers(&REQUIRED_COLUMNS),
        vec![row(&["Ana", "ayer por la tarde", "Python", "a@x.com", "111"])],
    );

    let err = validate(&table).unwrap_err();
    assert!(matches!(
        err,
        ReportError::Generation(GenerationError::InvalidValue { row: 2, .. })
    ));
    assert!(err.to_string().starts_with("Error al procesar el archivo:"));
    println!("✓ Bad timestamp message: {}", err);
}

#[test]
fn parses_common_timestamp_shapes() {
    println!("\n====== Testing parse_timestamp ======");
    let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();

    for input in [
        "2024-03-05 14:30:00",
        "2024-03-05T14:30:00",
        "2024-03-05 14:30",
        "05/03/2024 14:30:00",
        "05/03/2024 14:30",
        " 2024-03-05 14:30:00 ",
    ] {
        assert_eq!(parse_timestamp(input), Some(expected), "input {:?}", input);
        println!("✓ Parsed {:?}", input);
    }

    let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(parse_timestamp("2024-03-05"), Some(midnight));
    assert_eq!(parse_timestamp("no es fecha"), None);
    assert_eq!(parse_timestamp(""), None);
}

#[test]
fn converts_excel_serial_numbers() {
    let noon = excel_serial_to_datetime(45_292.5).unwrap();
    assert_eq!(
        noon,
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    );
    assert_eq!(parse_timestamp("45292.5"), Some(noon));
    assert_eq!(excel_serial_to_datetime(-1.0), None);
    assert_eq!(excel_serial_to_datetime(f64::NAN), None);
    println!("✓ Serial 45292.5 is 2024-01-01 12:00:00");
}
