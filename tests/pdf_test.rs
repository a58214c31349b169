use chrono::{NaiveDate, NaiveDateTime};
use enrollment_report::pdf::{Align, Font, PageCanvas, PdfWriter, count_pages, text_width};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;

// Keeps every warning logged while this test binary runs
struct WarningRecorder;

static WARNINGS: Mutex<Vec<String>> = Mutex::new(Vec::new());
static RECORDER: WarningRecorder = WarningRecorder;

impl Log for WarningRecorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut warnings) = WARNINGS.lock() {
                warnings.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn measures_helvetica_text() {
    println!("\n====== Testing text_width ======");
    // "Hi" = H(722) + i(222) at 10pt
    assert!((text_width("Hi", 10.0, Font::Regular) - 9.44).abs() < 1e-4);
    // Bold i is wider than regular i
    assert!(text_width("i", 10.0, Font::Bold) > text_width("i", 10.0, Font::Regular));
    assert_eq!(text_width("", 12.0, Font::Regular), 0.0);
    assert!(text_width("Número", 10.0, Font::Regular) > 0.0);
    println!("✓ Widths follow the Helvetica metrics");
}

#[test]
fn writes_a_well_formed_document() {
    println!("\n====== Testing PdfWriter ======");
    let mut writer = PdfWriter::new("Reporte (prueba)");
    for _ in 0..3 {
        let mut canvas = PageCanvas::new(595.0, 842.0);
        canvas.set_fill_color((0, 0, 0));
        canvas.text(100.0, 700.0, 12.0, Font::Bold, Align::Center, "Título");
        canvas.line(10.0, 10.0, 100.0, 10.0);
        canvas.rect(10.0, 20.0, 30.0, 40.0, true);
        writer.add_page(canvas);
    }
    assert_eq!(writer.page_count(), 3);

    let pdf = writer.finish(created());
    assert!(pdf.starts_with(b"%PDF-1.4\n"));
    assert!(pdf.ends_with(b"%%EOF\n"));
    assert_eq!(count_pages(&pdf), Some(3));
    println!("✓ Header, trailer and page tree present");

    assert!(contains(&pdf, b"/BaseFont /Helvetica "));
    assert!(contains(&pdf, b"/BaseFont /Helvetica-Bold "));
    assert!(contains(&pdf, b"/Title (Reporte \\(prueba\\))"));
    assert!(contains(&pdf, b"/CreationDate (D:20240506070809)"));
    assert!(contains(&pdf, b"/MediaBox [0 0 595 842]"));
    println!("✓ Fonts, info dictionary and media box written");

    // "Título" in WinAnsi: 0xED for í
    assert!(contains(&pdf, b"(T\xEDtulo) Tj"));
    assert!(contains(&pdf, b"re f"));
    println!("✓ Accented text is WinAnsi encoded");
}

#[test]
fn xref_offsets_point_at_objects() {
    let mut writer = PdfWriter::new("xref");
    writer.add_page(PageCanvas::new(100.0, 100.0));
    let pdf = writer.finish(created());

    let marker = b"startxref\n";
    let start = pdf
        .windows(marker.len())
        .rposition(|w| w == marker)
        .unwrap()
        + marker.len();
    let tail = std::str::from_utf8(&pdf[start..]).unwrap();
    let xref_at: usize = tail.lines().next().unwrap().parse().unwrap();

    let xref = std::str::from_utf8(&pdf[xref_at..]).unwrap();
    assert!(xref.starts_with("xref\n0 8\n"));

    let entries: Vec<usize> = xref
        .lines()
        .skip(3)
        .take(7)
        .map(|line| line[..10].parse().unwrap())
        .collect();
    for (i, offset) in entries.iter().enumerate() {
        let expected = format!("{} 0 obj", i + 1);
        assert!(
            pdf[*offset..].starts_with(expected.as_bytes()),
            "object {} not at offset {}",
            i + 1,
            offset
        );
    }
    println!("✓ Every xref entry points at its object");
}

#[test]
fn count_pages_ignores_non_pdf_input() {
    assert_eq!(count_pages(b"not a pdf"), None);
    assert_eq!(count_pages(b""), None);
    println!("✓ count_pages returns None for garbage");
}

#[test]
fn unencodable_characters_are_replaced_and_logged() {
    println!("\n====== Testing WinAnsi fallback ======");
    // another test may have installed the recorder already
    let _ = log::set_logger(&RECORDER);
    log::set_max_level(LevelFilter::Warn);

    let mut canvas = PageCanvas::new(200.0, 200.0);
    canvas.text(10.0, 10.0, 10.0, Font::Regular, Align::Left, "Ωmega Øre");
    canvas.text(10.0, 30.0, 10.0, Font::Regular, Align::Left, "Señora");
    let mut writer = PdfWriter::new("fallback");
    writer.add_page(canvas);
    let pdf = writer.finish(created());

    assert!(contains(&pdf, b"(?mega \xD8re) Tj"));
    assert!(contains(&pdf, b"(Se\xF1ora) Tj"));
    println!("✓ Ω prints as '?', Latin-1 letters keep their codes");

    let warnings = WARNINGS.lock().unwrap();
    let matching: Vec<&String> = warnings.iter().filter(|w| w.contains("Ωmega")).collect();
    assert_eq!(matching.len(), 1);
    assert!(matching[0].starts_with("1 character(s)"));
    assert!(!warnings.iter().any(|w| w.contains("Señora")));
    println!("✓ One warning for the run with a replaced character: {}", matching[0]);
}
