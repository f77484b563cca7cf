//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! stacking library. The synchronous pipeline runs on the blocking pool.

use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::{HealthResponse, StackRequest, TextStackQuery};
use super::error::AppError;
use super::state::AppState;
use crate::config::StackConfig;
use crate::error::StackResult;
use crate::models::Measurement;
use crate::output::StackReport;
use crate::parsing::{parse_str, IndexRange};
use crate::stacking::StackPipeline;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check() -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
    }))
}

// =============================================================================
// Stacking
// =============================================================================

fn stack_to_report(
    config: StackConfig,
    measurements: Vec<Measurement>,
    range: IndexRange,
) -> StackResult<StackReport> {
    let pipeline = StackPipeline::with_config(config.clone())?;
    let measurements = range.apply(measurements)?;
    let outcome = pipeline.process(&measurements)?;
    Ok(StackReport::new(config, &outcome))
}

async fn run_blocking<F>(job: F) -> Result<StackReport, AppError>
where
    F: FnOnce() -> StackResult<StackReport> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(AppError::from)
}

/// POST /v1/stack
///
/// Stack measurements sent as JSON.
pub async fn stack_measurements(
    State(state): State<AppState>,
    Json(request): Json<StackRequest>,
) -> HandlerResult<StackReport> {
    let range = request.index_range();
    let config = request
        .config
        .unwrap_or_else(|| state.default_config.as_ref().clone());
    let source = request.source;
    let measurements = request.measurements;

    let mut report = run_blocking(move || stack_to_report(config, measurements, range)).await?;
    report.source = source;

    Ok(Json(report))
}

/// POST /v1/stack/text
///
/// Stack a light-curve file sent as the raw request body.
pub async fn stack_text(
    State(state): State<AppState>,
    Query(query): Query<TextStackQuery>,
    body: String,
) -> HandlerResult<StackReport> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Request body is empty".to_string()));
    }

    let config = query.apply_to(&state.default_config);
    let range = query.index_range();
    let format = query.format;
    let source = query.source;

    let report = run_blocking(move || {
        let parsed = parse_str(&body, format, &config.parser)?;
        let report = stack_to_report(config, parsed.measurements, range)?;
        Ok(report
            .with_input_text(&body)
            .with_parse_report(parsed.report))
    })
    .await?;

    Ok(Json(StackReport { source, ..report }))
}
