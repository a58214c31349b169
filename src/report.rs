//! Report generation
//!
//! [`ReportGenerator::build`] turns a dataset into a [`ReportDocument`], an
//! ordered list of page descriptions: the cover, the chart, then one attendee
//! table per course in first-seen order. [`ReportGenerator::render`] draws
//! each page on its own canvas and hands it to the PDF writer, which
//! consumes the canvas. The whole pipeline is synchronous and keeps no
//! state between calls.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::error::GenerationError;
use crate::graph::{ChartBar, ChartOptions, draw_course_chart};
use crate::pdf::{Align, Font, PageCanvas, PdfWriter, text_width};
use crate::record::EnrollmentDataset;
use crate::schema::{DATETIME_FORMAT, EMAIL, FULL_NAME, PHONE};

// Cover page layout, as fractions of the page height measured from the bottom
const COVER_TITLE_Y: f32 = 0.95;
const COVER_RULE_Y: f32 = 0.90;
const COVER_BODY_Y: [f32; 3] = [0.80, 0.75, 0.70];
const COVER_FOOTER_Y: [f32; 2] = [0.60, 0.55];
const COVER_LEFT: f32 = 0.05;
const COVER_FRAME_INSET: f32 = 18.0;

// Table page layout in points
const TABLE_TITLE_GAP: f32 = 60.0;
const TABLE_TOP_GAP: f32 = 90.0;
const TABLE_BOTTOM_GAP: f32 = 40.0;
const TABLE_SIDE_MARGIN: f32 = 36.0;
const CELL_PADDING: f32 = 6.0;
const MIN_TABLE_FONT: f32 = 4.0;

/// Column headings of every attendee table
pub const TABLE_COLUMNS: [&str; 3] = [FULL_NAME, EMAIL, PHONE];

/// Aggregate figures shown on the cover page and in the preview panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub distinct_enrollees: usize,
    pub course_count: usize,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
}

impl ReportSummary {
    /// Compute the summary of a dataset
    ///
    /// # Errors
    /// * [`GenerationError::EmptyDataset`] when there is no record to take
    ///   the enrollment period from
    pub fn of(dataset: &EnrollmentDataset) -> Result<Self, GenerationError> {
        let (period_start, period_end) = dataset.period().ok_or(GenerationError::EmptyDataset)?;
        Ok(ReportSummary {
            distinct_enrollees: dataset.distinct_enrollees(),
            course_count: dataset.course_count(),
            period_start,
            period_end,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverPage {
    pub title: String,
    pub summary: ReportSummary,
    pub generated_at: NaiveDateTime,
    pub attribution: String,
}

impl CoverPage {
    /// Body lines in top-to-bottom order
    pub fn body_lines(&self) -> [String; 3] {
        [
            format!("Número de inscritos: {}", self.summary.distinct_enrollees),
            format!(
                "Fecha de inicio de inscripciones: {}",
                self.summary.period_start.format(DATETIME_FORMAT)
            ),
            format!(
                "Fecha de fin de inscripciones: {}",
                self.summary.period_end.format(DATETIME_FORMAT)
            ),
        ]
    }

    /// Generation time and attribution lines
    pub fn footer_lines(&self) -> [String; 2] {
        [
            format!(
                "Fecha y hora de elaboración: {}",
                self.generated_at.format(DATETIME_FORMAT)
            ),
            self.attribution.clone(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartPage {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<ChartBar>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl TableRow {
    fn cells(&self) -> [&str; 3] {
        [
            self.full_name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TablePage {
    pub course: String,
    pub title: String,
    pub rows: Vec<TableRow>,
}

/// One page of the report
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Page {
    Cover(CoverPage),
    Chart(ChartPage),
    Table(TablePage),
}

/// Ordered page descriptions, built fresh for every request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDocument {
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn cover(&self) -> Option<&CoverPage> {
        self.pages.iter().find_map(|page| match page {
            Page::Cover(cover) => Some(cover),
            _ => None,
        })
    }

    pub fn chart(&self) -> Option<&ChartPage> {
        self.pages.iter().find_map(|page| match page {
            Page::Chart(chart) => Some(chart),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TablePage> {
        self.pages.iter().filter_map(|page| match page {
            Page::Table(table) => Some(table),
            _ => None,
        })
    }
}

/// Builds and renders enrollment reports with a fixed configuration
#[derive(Clone, Debug, Default)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        ReportGenerator { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Generate the PDF report, stamped with the current local time
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use enrollment_report::record::{EnrollmentDataset, EnrollmentRecord};
    /// use enrollment_report::report::ReportGenerator;
    ///
    /// let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// let dataset = EnrollmentDataset::new(vec![
    ///     EnrollmentRecord::new("Ana Pérez", at, "Python", "a@x.com", "111"),
    /// ]);
    /// let pdf = ReportGenerator::default().generate(&dataset).unwrap();
    /// assert!(pdf.starts_with(b"%PDF-"));
    /// ```
    pub fn generate(&self, dataset: &EnrollmentDataset) -> Result<Vec<u8>, GenerationError> {
        self.generate_at(dataset, Local::now().naive_local())
    }

    /// Generate the PDF report with an explicit generation timestamp
    pub fn generate_at(
        &self,
        dataset: &EnrollmentDataset,
        generated_at: NaiveDateTime,
    ) -> Result<Vec<u8>, GenerationError> {
        let document = self.build(dataset, generated_at)?;
        self.render(&document, generated_at)
    }

    /// Lay out the report pages without drawing them
    ///
    /// # Errors
    /// * [`GenerationError::EmptyDataset`] for a dataset without records
    pub fn build(
        &self,
        dataset: &EnrollmentDataset,
        generated_at: NaiveDateTime,
    ) -> Result<ReportDocument, GenerationError> {
        let summary = ReportSummary::of(dataset)?;
        let groups = dataset.course_groups();
        log::info!(
            "building report for {} records, {} enrollees, {} courses",
            dataset.len(),
            summary.distinct_enrollees,
            groups.len()
        );

        let mut pages = Vec::with_capacity(2 + groups.len());
        pages.push(Page::Cover(CoverPage {
            title: self.config.title.clone(),
            summary,
            generated_at,
            attribution: self.config.attribution.clone(),
        }));

        pages.push(Page::Chart(ChartPage {
            title: self.config.chart_title.clone(),
            x_label: self.config.x_label.clone(),
            y_label: self.config.y_label.clone(),
            bars: groups
                .iter()
                .map(|group| ChartBar {
                    course: group.course.to_string(),
                    count: group.len(),
                })
                .collect(),
        }));

        for group in &groups {
            pages.push(Page::Table(TablePage {
                course: group.course.to_string(),
                title: format!("Personas inscritas en {}", group.course),
                rows: group
                    .records
                    .iter()
                    .map(|record| TableRow {
                        full_name: record.full_name.clone(),
                        email: record.email.clone(),
                        phone: record.phone.clone(),
                    })
                    .collect(),
            }));
        }

        Ok(ReportDocument { pages })
    }

    /// Draw every page and serialize the document
    pub fn render(
        &self,
        document: &ReportDocument,
        created: NaiveDateTime,
    ) -> Result<Vec<u8>, GenerationError> {
        let mut writer = PdfWriter::new(&self.config.document_title);

        for (number, page) in document.pages.iter().enumerate() {
            let mut canvas = PageCanvas::new(self.config.page_width, self.config.page_height);
            match page {
                Page::Cover(cover) => self.draw_cover(&mut canvas, cover),
                Page::Chart(chart) => draw_course_chart(
                    &mut canvas,
                    &chart.bars,
                    &ChartOptions {
                        title: chart.title.clone(),
                        x_label: chart.x_label.clone(),
                        y_label: chart.y_label.clone(),
                    },
                )?,
                Page::Table(table) => self.draw_table(&mut canvas, table),
            }
            writer.add_page(canvas);
            log::debug!("rendered page {}/{}", number + 1, document.page_count());
        }

        let pdf = writer.finish(created);
        log::info!(
            "report rendered: {} pages, {} bytes",
            document.page_count(),
            pdf.len()
        );
        Ok(pdf)
    }

    fn draw_cover(&self, canvas: &mut PageCanvas, cover: &CoverPage) {
        let width = canvas.width();
        let height = canvas.height();
        let left = width * COVER_LEFT;

        canvas.set_stroke_color((0, 0, 0));
        canvas.set_line_width(2.0);
        canvas.rect(
            COVER_FRAME_INSET,
            COVER_FRAME_INSET,
            width - 2.0 * COVER_FRAME_INSET,
            height - 2.0 * COVER_FRAME_INSET,
            false,
        );

        canvas.set_fill_color((0, 0, 0));
        canvas.text(
            width / 2.0,
            top_baseline(height * COVER_TITLE_Y, 16.0),
            16.0,
            Font::Bold,
            Align::Center,
            &cover.title,
        );

        let rule_y = top_baseline(height * COVER_RULE_Y, 12.0);
        canvas.set_line_width(1.0);
        canvas.line(width * 0.2, rule_y, width * 0.8, rule_y);

        for (line, y) in cover.body_lines().iter().zip(COVER_BODY_Y) {
            let baseline = top_baseline(height * y, 12.0);
            canvas.text(left, baseline, 12.0, Font::Regular, Align::Left, line);
        }
        for (line, y) in cover.footer_lines().iter().zip(COVER_FOOTER_Y) {
            let baseline = top_baseline(height * y, 10.0);
            canvas.text(left, baseline, 10.0, Font::Regular, Align::Left, line);
        }
    }

    fn draw_table(&self, canvas: &mut PageCanvas, table: &TablePage) {
        let width = canvas.width();
        let height = canvas.height();

        canvas.set_fill_color((0, 0, 0));
        canvas.text(
            width / 2.0,
            height - TABLE_TITLE_GAP,
            12.0,
            Font::Regular,
            Align::Center,
            &table.title,
        );

        let layout = TableLayout::fit(table, &self.config, width - 2.0 * TABLE_SIDE_MARGIN);
        let table_height = layout.row_height * (table.rows.len() + 1) as f32;
        let available = height - TABLE_TOP_GAP - TABLE_BOTTOM_GAP;
        let top = if table_height <= available {
            TABLE_BOTTOM_GAP + (available + table_height) / 2.0
        } else {
            log::warn!(
                "table for \"{}\" has {} rows and runs past the page; extra rows are clipped",
                table.course,
                table.rows.len()
            );
            height - TABLE_TOP_GAP
        };
        let left = (width - layout.total_width()) / 2.0;

        let header = TABLE_COLUMNS;
        canvas.set_line_width(0.5);
        canvas.set_stroke_color((0, 0, 0));
        for (i, cells) in std::iter::once(header)
            .chain(table.rows.iter().map(TableRow::cells))
            .enumerate()
        {
            let bottom = top - layout.row_height * (i + 1) as f32;
            if bottom + layout.row_height < 0.0 {
                break;
            }
            let font = if i == 0 { Font::Bold } else { Font::Regular };
            let baseline = bottom + (layout.row_height - layout.font_size * 0.7) / 2.0;

            let mut x = left;
            for (cell, column_width) in cells.iter().zip(layout.column_widths) {
                canvas.rect(x, bottom, column_width, layout.row_height, false);
                canvas.text(
                    x + column_width / 2.0,
                    baseline,
                    layout.font_size,
                    font,
                    Align::Center,
                    cell,
                );
                x += column_width;
            }
        }
    }
}

/// Font size, column widths and row height of one attendee table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableLayout {
    pub font_size: f32,
    pub column_widths: [f32; 3],
    pub row_height: f32,
}

impl TableLayout {
    /// Size columns to their widest cell, shrinking the font to fit `max_width`
    pub fn fit(table: &TablePage, config: &ReportConfig, max_width: f32) -> Self {
        let natural = Self::with_font(table, config, config.table_font_size);
        let total = natural.total_width();
        if total <= max_width {
            return natural;
        }
        let scaled = (config.table_font_size * max_width / total).max(MIN_TABLE_FONT);
        Self::with_font(table, config, scaled)
    }

    fn with_font(table: &TablePage, config: &ReportConfig, font_size: f32) -> Self {
        let mut column_widths = [0.0f32; 3];
        for (c, heading) in TABLE_COLUMNS.iter().enumerate() {
            column_widths[c] = text_width(heading, font_size, Font::Bold);
        }
        for row in &table.rows {
            for (c, cell) in row.cells().iter().enumerate() {
                column_widths[c] = column_widths[c].max(text_width(cell, font_size, Font::Regular));
            }
        }
        for w in column_widths.iter_mut() {
            *w += 2.0 * CELL_PADDING;
        }

        TableLayout {
            font_size,
            column_widths,
            row_height: (font_size + 6.0) * config.row_scale,
        }
    }

    pub fn total_width(&self) -> f32 {
        self.column_widths.iter().sum()
    }
}

// Baseline for text whose top edge sits at `top`
fn top_baseline(top: f32, size: f32) -> f32 {
    top - 0.75 * size
}
