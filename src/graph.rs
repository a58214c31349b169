use plotters::prelude::*;
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind, FontStyle, FontTransform,
};
use serde::Serialize;
use std::convert::Infallible;

use crate::error::GenerationError;
use crate::pdf::{Align, Font, PageCanvas, text_width};

/// The 20-color "tab20" categorical palette, cycled when there are more bars
pub const TAB20: [RGBColor; 20] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

// Height of the area under the plot reserved for the rotated course names
const X_LABEL_AREA: u32 = 170;
const LABEL_ANGLE: f32 = 45.0;
const LABEL_SIZE: f32 = 9.0;

/// One bar of the enrollments-per-course chart
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub course: String,
    pub count: usize,
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,
}

/// Color of the bar at `index`
pub fn bar_color(index: usize) -> RGBColor {
    TAB20[index % TAB20.len()]
}

/// Plotters drawing backend that paints onto a PDF page
///
/// Backend coordinates are points with the origin at the top-left corner,
/// flipped to PDF user space on the way out. Text is set in Helvetica and
/// measured with its AFM widths, so no system fonts are needed.
pub struct PdfBackend<'a> {
    canvas: &'a mut PageCanvas,
    size: (u32, u32),
}

impl<'a> PdfBackend<'a> {
    pub fn new(canvas: &'a mut PageCanvas) -> Self {
        let size = (canvas.width() as u32, canvas.height() as u32);
        PdfBackend { canvas, size }
    }

    fn to_page(&self, (x, y): BackendCoord) -> (f32, f32) {
        (x as f32, self.canvas.height() - y as f32)
    }
}

fn text_font<S: BackendTextStyle>(style: &S) -> Font {
    match style.style() {
        FontStyle::Bold => Font::Bold,
        _ => Font::Regular,
    }
}

// Counter-clockwise angle in PDF space for a plotters transform
fn transform_angle(transform: &FontTransform) -> f32 {
    match transform {
        FontTransform::None => 0.0,
        FontTransform::Rotate90 => -90.0,
        FontTransform::Rotate180 => 180.0,
        FontTransform::Rotate270 => 90.0,
    }
}

impl DrawingBackend for PdfBackend<'_> {
    type ErrorType = Infallible;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        if color.alpha == 0.0 {
            return Ok(());
        }
        let (x, y) = self.to_page(point);
        self.canvas.set_fill_color(color.rgb);
        self.canvas.rect(x, y - 1.0, 1.0, 1.0, true);
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }
        let (x1, y1) = self.to_page(from);
        let (x2, y2) = self.to_page(to);
        self.canvas.set_stroke_color(color.rgb);
        self.canvas.set_line_width(style.stroke_width() as f32);
        self.canvas.line(x1, y1, x2, y2);
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }
        let (left, top) = self.to_page(upper_left);
        let (right, bottom) = self.to_page(bottom_right);
        if fill {
            self.canvas.set_fill_color(color.rgb);
        } else {
            self.canvas.set_stroke_color(color.rgb);
            self.canvas.set_line_width(style.stroke_width() as f32);
        }
        self.canvas
            .rect(left, bottom, right - left, top - bottom, fill);
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        let color = style.color();
        if color.alpha == 0.0 || text.is_empty() {
            return Ok(());
        }
        let size = style.size() as f32;
        let font = text_font(style);
        let width = text_width(text, size, font);
        let anchor = style.anchor();

        // offsets along the text direction and along its "down" direction
        let along = match anchor.h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        let down = match anchor.v_pos {
            VPos::Top => 0.75 * size,
            VPos::Center => 0.35 * size,
            VPos::Bottom => -0.2 * size,
        };

        let angle = transform_angle(&style.transform());
        let (sin, cos) = angle.to_radians().sin_cos();
        let (x, y) = self.to_page(pos);
        let start_x = x + along * cos + down * sin;
        let start_y = y + along * sin - down * cos;

        self.canvas.set_fill_color(color.rgb);
        if angle == 0.0 {
            self.canvas
                .text(start_x, start_y, size, font, Align::Left, text);
        } else {
            self.canvas
                .text_rotated(start_x, start_y, size, font, angle, text);
        }
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Infallible>> {
        let size = style.size() as f32;
        let width = text_width(text, size, text_font(style)).ceil() as u32;
        let height = size.ceil() as u32;
        match style.transform() {
            FontTransform::Rotate90 | FontTransform::Rotate270 => Ok((height, width)),
            _ => Ok((width, height)),
        }
    }
}

fn chart_error<E: std::error::Error>(err: E) -> GenerationError {
    GenerationError::Chart(err.to_string())
}

/// Draws the enrollments-per-course bar chart onto a page
///
/// One bar per course in the given order, each colored from [`TAB20`] and
/// annotated with its count. Course names are set at 45° below the axis in
/// an enlarged bottom margin, shortened with an ellipsis when they would run
/// past it.
///
/// # Arguments
/// * `canvas` - Page to draw on
/// * `bars` - Course names and counts, in display order
/// * `options` - Chart and axis titles
///
/// # Returns
/// * `Ok(())` or a [`GenerationError::Chart`] carrying the plotters error
pub fn draw_course_chart(
    canvas: &mut PageCanvas,
    bars: &[ChartBar],
    options: &ChartOptions,
) -> Result<(), GenerationError> {
    let bar_count = bars.len().max(1) as i32;
    let max_count = bars.iter().map(|b| b.count).max().unwrap_or(0) as i32;
    let y_top = max_count + (max_count / 10).max(1);
    let page_height = canvas.height();

    let label_anchors: Vec<BackendCoord> = {
        let root = PdfBackend::new(canvas).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                &options.title,
                ("Helvetica", 16).into_font().style(FontStyle::Bold),
            )
            .margin(40)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(50)
            .build_cartesian_2d((0..bar_count).into_segmented(), 0..y_top)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .axis_desc_style(("Helvetica", 12))
            .label_style(("Helvetica", 9))
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let i = i as i32;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0),
                        (SegmentValue::Exact(i + 1), bar.count as i32),
                    ],
                    bar_color(i as usize).filled(),
                );
                rect.set_margin(0, 0, 6, 6);
                rect
            }))
            .map_err(chart_error)?;

        let annotation = ("Helvetica", 10)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                EmptyElement::at((SegmentValue::CenterOf(i as i32), bar.count as i32))
                    + Text::new(bar.count.to_string(), (0, -3), annotation.clone())
            }))
            .map_err(chart_error)?;

        (0..bars.len())
            .map(|i| chart.backend_coord(&(SegmentValue::CenterOf(i as i32), 0)))
            .collect()
    };

    // rotated course names, right-aligned under their bar
    let (sin, cos) = LABEL_ANGLE.to_radians().sin_cos();
    let max_width = (X_LABEL_AREA as f32 - 40.0) / sin;
    canvas.set_fill_color((0, 0, 0));
    for (bar, (x, y)) in bars.iter().zip(label_anchors) {
        let label = fit_label(&bar.course, max_width);
        let width = text_width(&label, LABEL_SIZE, Font::Regular);
        let end_x = x as f32 + 3.0;
        let end_y = page_height - y as f32 - 12.0;
        canvas.text_rotated(
            end_x - width * cos,
            end_y - width * sin,
            LABEL_SIZE,
            Font::Regular,
            LABEL_ANGLE,
            &label,
        );
    }

    Ok(())
}

// Shorten `label` with an ellipsis so it fits in `max_width` points
fn fit_label(label: &str, max_width: f32) -> String {
    if text_width(label, LABEL_SIZE, Font::Regular) <= max_width {
        return label.to_string();
    }
    let mut fitted: String = label.to_string();
    while !fitted.is_empty()
        && text_width(&format!("{}…", fitted), LABEL_SIZE, Font::Regular) > max_width
    {
        fitted.pop();
    }
    format!("{}…", fitted.trim_end())
}
