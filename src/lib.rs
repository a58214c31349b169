/*!
# Enrollment Report

A generator of PDF enrollment reports from spreadsheet uploads, built in Rust.

## Overview

An administrator uploads an Excel workbook (or CSV export) of course
enrollment records. The application checks that the required columns are
present, shows a preview with summary statistics, and produces a multi-page
PDF that can be downloaded or previewed in the browser.

## Report Layout

1. **Cover page** - title, number of distinct enrollees, first and last
   enrollment dates, generation timestamp and attribution
2. **Chart page** - bar chart of enrollments per course, one color per course
3. **Table pages** - one page per course listing name, email and phone of
   each enrollee

## Modules

- **loader**: Reads `.xlsx`/`.csv` uploads into a raw header-plus-rows table
- **schema**: Required columns, validation and timestamp parsing
- **record**: Enrollment records, the dataset and its per-course groups
- **report**: Page model construction and PDF rendering
- **graph**: Bar chart drawn with plotters onto a PDF page
- **pdf**: Minimal PDF writer with the standard Helvetica fonts
- **config**: Report and server settings
- **error**: Schema and generation error kinds
- **app** (`web` feature): Routing and handlers
- **downloader** (`web` feature): Download link and inline preview markup

## REST API Endpoints

- `GET /` - Upload page
- `POST /api/preview` - Data preview and statistics as JSON
- `POST /api/report` - Generated report as an HTML fragment
- `POST /api/report.pdf` - Generated report as a PDF attachment
*/

pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod pdf;
pub mod record;
pub mod report;
pub mod schema;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod downloader;

/// Re-export the commonly used types
pub use config::{ReportConfig, ServerConfig};
pub use error::{GenerationError, ReportError, SchemaError};
pub use loader::{RawTable, load_table};
pub use record::{EnrollmentDataset, EnrollmentRecord};
pub use report::{ReportDocument, ReportGenerator};
pub use schema::{REQUIRED_COLUMNS, missing_columns, validate};
