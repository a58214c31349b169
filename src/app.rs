#![cfg(feature = "web")]

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::downloader::{escape_attr, report_fragment};
use crate::error::{GenerationError, ReportError};
use crate::loader::{RawTable, load_table};
use crate::record::EnrollmentDataset;
use crate::report::{ReportGenerator, ReportSummary};
use crate::schema::validate;

/// Rows shown in the preview panel
const PREVIEW_ROWS: usize = 5;

/// Read-only state shared by every request
pub struct AppState {
    config: ServerConfig,
    generator: ReportGenerator,
    landing: String,
}

/// A file received from the upload form
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(Serialize)]
struct PreviewStats {
    total_enrollees: usize,
    course_count: usize,
    period: String,
}

#[derive(Serialize)]
struct PreviewResponse {
    status: &'static str,
    preview: Vec<serde_json::Map<String, serde_json::Value>>,
    stats: PreviewStats,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    kind: &'static str,
    message: String,
    missing_columns: Vec<String>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let landing = include_str!("./static/index.html")
            .replace("{{page_title}}", &escape_attr(&config.page_title))
            .replace("{{page_icon}}", &escape_attr(&config.page_icon));
        AppState {
            generator: ReportGenerator::new(config.report.clone()),
            config,
            landing,
        }
    }
}

/// Build the application router
pub fn router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let app_state = Arc::new(AppState::new(config));

    Router::new()
        .route("/", get(serve_landing))
        .route("/api/preview", post(preview_upload))
        .route("/api/report", post(generate_report))
        .route("/api/report.pdf", post(download_report))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let app = router(config);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_landing(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.landing.clone())
}

async fn preview_upload(multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let result = tokio::task::spawn_blocking(move || -> Result<PreviewResponse, ReportError> {
        let (table, dataset) = load_dataset(&upload)?;
        let summary = ReportSummary::of(&dataset)?;
        Ok(PreviewResponse {
            status: "ok",
            preview: table.head(PREVIEW_ROWS),
            stats: PreviewStats {
                total_enrollees: summary.distinct_enrollees,
                course_count: summary.course_count,
                period: format!(
                    "{} - {}",
                    summary.period_start.date(),
                    summary.period_end.date()
                ),
            },
        })
    })
    .await;

    match result {
        Ok(Ok(preview)) => Json(preview).into_response(),
        Ok(Err(err)) => error_json(&err),
        Err(join_err) => internal_error(join_err.to_string()),
    }
}

async fn generate_report(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let filename = state.config.report.filename.clone();
    match render_upload(state, upload).await {
        Ok(pdf) => Html(report_fragment(&pdf, &filename)).into_response(),
        Err(err) => error_html(&err),
    }
}

async fn download_report(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let filename = state.config.report.filename.clone();
    match render_upload(state, upload).await {
        Ok(pdf) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/pdf")
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .body(Body::from(pdf))
            .unwrap_or_else(|e| internal_error(e.to_string())),
        Err(err) => error_json(&err),
    }
}

// Validate and render off the async workers; generation is CPU-bound
async fn render_upload(state: Arc<AppState>, upload: Upload) -> Result<Vec<u8>, ReportError> {
    tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ReportError> {
        let (_, dataset) = load_dataset(&upload)?;
        let pdf = state.generator.generate(&dataset)?;
        log::info!(
            "generated report for \"{}\" ({} bytes)",
            upload.filename,
            pdf.len()
        );
        Ok(pdf)
    })
    .await
    .map_err(|join_err| {
        ReportError::Generation(GenerationError::Io(std::io::Error::other(
            join_err.to_string(),
        )))
    })?
}

fn load_dataset(upload: &Upload) -> Result<(RawTable, EnrollmentDataset), ReportError> {
    let table = load_table(&upload.filename, &upload.bytes)?;
    let dataset = validate(&table)?;
    Ok((table, dataset))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.xlsx").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(e.to_string()))?;
        if bytes.is_empty() {
            return Err(bad_request("No file data received".to_string()));
        }
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(bad_request("No file data received".to_string()))
}

fn status_for(err: &ReportError) -> StatusCode {
    match err {
        ReportError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReportError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_json(err: &ReportError) -> Response {
    log::warn!("upload rejected: {}", err);
    let body = ErrorResponse {
        status: "error",
        kind: err.kind(),
        message: err.to_string(),
        missing_columns: err.missing_columns().to_vec(),
    };
    (status_for(err), Json(body)).into_response()
}

fn error_html(err: &ReportError) -> Response {
    log::warn!("report not generated: {}", err);
    let html = format!(
        "<div class=\"error\" data-kind=\"{}\">{}</div>",
        err.kind(),
        escape_attr(&err.to_string())
    );
    (status_for(err), Html(html)).into_response()
}

fn bad_request(message: String) -> Response {
    let body = ErrorResponse {
        status: "error",
        kind: "request",
        message,
        missing_columns: Vec::new(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn internal_error(message: String) -> Response {
    log::error!("request failed: {}", message);
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
