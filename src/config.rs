use serde::{Deserialize, Serialize};

/// Name offered to the browser for the generated document
pub const REPORT_FILENAME: &str = "Reporte_Personas_Inscritas.pdf";

/// Points per inch in PDF user space
const POINTS_PER_INCH: f32 = 72.0;

/// Layout and wording of the generated report
///
/// Built once at startup and shared read-only; nothing in the report
/// pipeline mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Page width in points
    pub page_width: f32,

    /// Page height in points
    pub page_height: f32,

    /// Bold heading of the cover page
    pub title: String,

    /// Closing line of the cover page
    pub attribution: String,

    /// Caption of the chart page
    pub chart_title: String,

    /// Label under the course axis
    pub x_label: String,

    /// Label beside the count axis
    pub y_label: String,

    /// Font size of the attendee tables
    pub table_font_size: f32,

    /// Row height multiplier over the default table row
    pub row_scale: f32,

    /// Document title stored in the PDF info dictionary
    pub document_title: String,

    /// File name used for downloads
    pub filename: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_width: 8.27 * POINTS_PER_INCH,
            page_height: 11.69 * POINTS_PER_INCH,
            title: "INFORME DE PERSONAS INSCRITAS".to_string(),
            attribution: "Elaborado por: Laura Valentina Jimenez Benavides".to_string(),
            chart_title: "Inscripciones por curso".to_string(),
            x_label: "Curso de interés".to_string(),
            y_label: "Número de inscritos".to_string(),
            table_font_size: 8.0,
            row_scale: 1.5,
            document_title: "Reporte de Personas Inscritas".to_string(),
            filename: REPORT_FILENAME.to_string(),
        }
    }
}

/// Settings of the upload web server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub page_title: String,
    pub page_icon: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,

    pub report: ReportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            page_title: "Generador de Reportes".to_string(),
            page_icon: "📊".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            report: ReportConfig::default(),
        }
    }
}
