//! Minimal PDF 1.4 writer
//!
//! Pages are drawn on a [`PageCanvas`] in PDF user space (points, origin at
//! the bottom-left corner) and handed to a [`PdfWriter`], which takes
//! ownership of the canvas. Text uses the standard Type1 Helvetica faces with
//! WinAnsiEncoding, so no font data is embedded and Spanish accents render
//! without extra setup.

use chrono::NaiveDateTime;
use std::fmt::Write as _;

const PRODUCER: &str = "enrollment-report";

// Helvetica advance widths (1/1000 em) for ' '..='~'
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

// Helvetica-Bold advance widths (1/1000 em) for ' '..='~'
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Font faces available on every page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

/// Horizontal anchoring of a text run relative to its x coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Width in points of `text` set in `font` at `size`
pub fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let widths = font.widths();
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => widths[c as usize - 32] as u32,
            c if c.is_uppercase() => 722,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Drawing surface for one page
///
/// Owns the page's content stream until the page is added to a
/// [`PdfWriter`]; after that the canvas no longer exists.
#[derive(Debug)]
pub struct PageCanvas {
    width: f32,
    height: f32,
    content: Vec<u8>,
}

impl PageCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        PageCanvas {
            width,
            height,
            content: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_fill_color(&mut self, (r, g, b): (u8, u8, u8)) {
        self.op(&format!("{} {} {} rg", unit(r), unit(g), unit(b)));
    }

    pub fn set_stroke_color(&mut self, (r, g, b): (u8, u8, u8)) {
        self.op(&format!("{} {} {} RG", unit(r), unit(g), unit(b)));
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.op(&format!("{} w", num(width)));
    }

    /// Single-line text with its baseline at `y`
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, align: Align, text: &str) {
        let x = match align {
            Align::Left => x,
            Align::Center => x - text_width(text, size, font) / 2.0,
        };
        self.op(&format!(
            "BT /{} {} Tf {} {} Td",
            font.resource_name(),
            num(size),
            num(x),
            num(y)
        ));
        self.show_text(text);
        self.op("ET");
    }

    /// Text rotated counter-clockwise by `degrees` around its start point
    pub fn text_rotated(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        degrees: f32,
        text: &str,
    ) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.op(&format!(
            "BT /{} {} Tf {} {} {} {} {} {} Tm",
            font.resource_name(),
            num(size),
            num(cos),
            num(sin),
            num(-sin),
            num(cos),
            num(x),
            num(y)
        ));
        self.show_text(text);
        self.op("ET");
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.op(&format!(
            "{} {} m {} {} l S",
            num(x1),
            num(y1),
            num(x2),
            num(y2)
        ));
    }

    /// Rectangle with its lower-left corner at (`x`, `y`)
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: bool) {
        let paint = if fill { "f" } else { "S" };
        self.op(&format!(
            "{} {} {} {} re {}",
            num(x),
            num(y),
            num(w),
            num(h),
            paint
        ));
    }

    fn show_text(&mut self, text: &str) {
        self.content.push(b'(');
        self.content.extend_from_slice(&encode_text(text));
        self.content.extend_from_slice(b") Tj\n");
    }

    fn op(&mut self, op: &str) {
        self.content.extend_from_slice(op.as_bytes());
        self.content.push(b'\n');
    }
}

struct PageData {
    width: f32,
    height: f32,
    content: Vec<u8>,
}

/// Collects finished pages and serializes them into one document
pub struct PdfWriter {
    title: String,
    pages: Vec<PageData>,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        PdfWriter {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    /// Append a page; the canvas is consumed and its drawing state released
    pub fn add_page(&mut self, canvas: PageCanvas) {
        let PageCanvas {
            width,
            height,
            content,
        } = canvas;
        self.pages.push(PageData {
            width,
            height,
            content,
        });
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize catalog, page tree, fonts, info and xref table
    pub fn finish(self, created: NaiveDateTime) -> Vec<u8> {
        // 1 catalog, 2 page tree, 3-4 fonts, 5 info, then page + content pairs
        let object_count = 5 + self.pages.len() * 2;
        let mut offsets = vec![0usize; object_count + 1];
        let mut pdf: Vec<u8> = Vec::new();

        pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        offsets[1] = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        let kids = (0..self.pages.len())
            .map(|i| format!("{} 0 R", 6 + i * 2))
            .collect::<Vec<_>>()
            .join(" ");
        offsets[2] = pdf.len();
        pdf.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids,
                self.pages.len()
            )
            .as_bytes(),
        );

        for (id, base_font) in [(3, "Helvetica"), (4, "Helvetica-Bold")] {
            offsets[id] = pdf.len();
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
                    id, base_font
                )
                .as_bytes(),
            );
        }

        offsets[5] = pdf.len();
        pdf.extend_from_slice(b"5 0 obj\n<< /Title (");
        pdf.extend_from_slice(&encode_text(&self.title));
        pdf.extend_from_slice(
            format!(
                ") /Producer ({}) /CreationDate (D:{}) >>\nendobj\n",
                PRODUCER,
                created.format("%Y%m%d%H%M%S")
            )
            .as_bytes(),
        );

        for (i, page) in self.pages.iter().enumerate() {
            let page_id = 6 + i * 2;
            let content_id = page_id + 1;

            offsets[page_id] = pdf.len();
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n",
                    page_id,
                    num(page.width),
                    num(page.height),
                    content_id
                )
                .as_bytes(),
            );

            offsets[content_id] = pdf.len();
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Length {} >>\nstream\n",
                    content_id,
                    page.content.len()
                )
                .as_bytes(),
            );
            pdf.extend_from_slice(&page.content);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_position = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", object_count + 1);
        for offset in &offsets[1..] {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            xref_position
        );
        pdf.extend_from_slice(xref.as_bytes());

        pdf
    }
}

/// Page count declared by the page tree of a serialized document
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use enrollment_report::pdf::{count_pages, PageCanvas, PdfWriter};
///
/// let mut writer = PdfWriter::new("demo");
/// writer.add_page(PageCanvas::new(100.0, 100.0));
/// let created = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// assert_eq!(count_pages(&writer.finish(created)), Some(1));
/// ```
pub fn count_pages(pdf: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(pdf);
    let tree = text.find("/Type /Pages")?;
    let count = text[tree..].find("/Count ")? + tree + "/Count ".len();
    text[count..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()
}

/// Encode text as a WinAnsi PDF string body, escaping delimiters
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0usize;
    for c in text.chars() {
        let byte = match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                c as u8
            }
            '\n' | '\r' | '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => {
                replaced += 1;
                b'?'
            }
        };
        out.push(byte);
    }
    if replaced > 0 {
        log::warn!(
            "{} character(s) in \"{}\" have no WinAnsi code and print as '?'",
            replaced,
            text
        );
    }
    out
}

fn unit(component: u8) -> String {
    num(component as f32 / 255.0)
}

// Compact decimal form accepted by every PDF reader
fn num(value: f32) -> String {
    let value = if value.abs() < 0.0005 { 0.0 } else { value };
    let mut s = format!("{:.3}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
