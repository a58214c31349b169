#![cfg(feature = "web")]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode a generated document as base64
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// `data:` URL carrying a base64 PDF
///
/// # Examples
/// ```
/// use enrollment_report::downloader::pdf_data_url;
///
/// assert_eq!(pdf_data_url("JVBERg=="), "data:application/pdf;base64,JVBERg==");
/// ```
pub fn pdf_data_url(b64_pdf: &str) -> String {
    format!("data:application/pdf;base64,{}", b64_pdf)
}

/// Download link for a base64 PDF with the given file name
pub fn download_link(b64_pdf: &str, filename: &str) -> String {
    format!(
        "<a href=\"{}\" download=\"{}\" class=\"btn\">⬇️ Descargar Reporte PDF</a>",
        pdf_data_url(b64_pdf),
        escape_attr(filename)
    )
}

/// Inline preview frame for a base64 PDF
pub fn preview_embed(b64_pdf: &str) -> String {
    format!(
        "<iframe src=\"{}\" width=\"100%\" height=\"500\" type=\"application/pdf\"></iframe>",
        pdf_data_url(b64_pdf)
    )
}

/// HTML shown after a successful generation: message, link and preview
pub fn report_fragment(pdf: &[u8], filename: &str) -> String {
    let b64_pdf = to_base64(pdf);
    format!(
        "<div class=\"success\">¡Informe generado con éxito!</div>\n{}\n<h3>Vista previa del informe</h3>\n{}\n",
        download_link(&b64_pdf, filename),
        preview_embed(&b64_pdf)
    )
}

/// Escape text for use inside HTML content or attribute values
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
