#![cfg(not(tarpaulin_include))]

use chrono::{NaiveDate, NaiveDateTime};
use enrollment_report::record::{EnrollmentDataset, EnrollmentRecord};
use enrollment_report::report::ReportGenerator;
use std::fs;
use std::path::Path;

const OUTPUT_DIR: &str = "report_output";

fn at(day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 3, day)?.and_hms_opt(hour, minute, 0)
}

fn sample_dataset() -> Option<EnrollmentDataset> {
    let rows = [
        ("Ana Pérez", at(1, 9, 15)?, "Python básico", "ana@example.com", "3001234567"),
        ("Luis Gómez", at(2, 10, 0)?, "Excel avanzado", "luis@example.com", "3109876543"),
        ("Ana Pérez", at(3, 14, 30)?, "Excel avanzado", "ana@example.com", "3001234567"),
        ("María Rodríguez", at(4, 8, 45)?, "Diseño gráfico", "maria@example.com", "3204567890"),
        ("Carlos Núñez", at(5, 16, 20)?, "Python básico", "carlos@example.com", "3157654321"),
        ("Sofía Herrera", at(6, 11, 5)?, "Python básico", "sofia@example.com", "3012223344"),
    ];
    Some(
        rows.into_iter()
            .map(|(name, started_at, course, email, phone)| {
                EnrollmentRecord::new(name, started_at, course, email, phone)
            })
            .collect(),
    )
}

/// Writes a sample report built from a small in-memory dataset
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = sample_dataset().ok_or("invalid sample timestamp")?;
    let generator = ReportGenerator::default();

    let pdf = generator.generate(&dataset)?;

    fs::create_dir_all(OUTPUT_DIR)?;
    let file_path = Path::new(OUTPUT_DIR).join(&generator.config().filename);
    fs::write(&file_path, &pdf)?;

    println!(
        "Created report for {} records at {}",
        dataset.len(),
        file_path.display()
    );

    Ok(())
}
