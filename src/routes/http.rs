// HTTP handlers: version, history fetch (overview + per-series), live window

use std::time::Instant;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::MonitorError;
use crate::models::{AggregateRecord, Granularity};
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FetchRequest {
    #[serde(default)]
    client_timezone: Option<String>,
}

/// Dashboard payload: last day (hourly), last week and month (daily), last year (monthly).
#[derive(Debug, Serialize)]
struct MonitorOverview {
    #[serde(rename = "1_day")]
    one_day: Vec<AggregateRecord>,
    #[serde(rename = "1_week")]
    one_week: Vec<AggregateRecord>,
    #[serde(rename = "30_days")]
    thirty_days: Vec<AggregateRecord>,
    #[serde(rename = "12_months")]
    twelve_months: Vec<AggregateRecord>,
}

/// POST /fetch_monitor_data: body `{"client_timezone": "..."}`; Content-Type is not required.
pub(super) async fn fetch_monitor_data(State(state): State<AppState>, body: Bytes) -> Response {
    let started = Instant::now();
    let response = match parse_fetch_request(&body) {
        Ok(request) => match overview(&state, request.client_timezone.as_deref()).await {
            Ok(overview) => Json(overview).into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => error_body(
            StatusCode::BAD_REQUEST,
            format!("invalid request body: {}", e),
        ),
    };
    tracing::info!(
        method = "POST",
        path = "/fetch_monitor_data",
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

fn parse_fetch_request(body: &[u8]) -> serde_json::Result<FetchRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FetchRequest::default());
    }
    serde_json::from_slice(body)
}

async fn overview(
    state: &AppState,
    timezone: Option<&str>,
) -> Result<MonitorOverview, MonitorError> {
    let counts = &state.config.query;
    let monitor = &state.monitor;
    Ok(MonitorOverview {
        one_day: monitor
            .query(Granularity::Hourly, timezone, counts.hourly_count)
            .await?,
        one_week: monitor
            .query(Granularity::Daily, timezone, counts.weekly_count)
            .await?,
        thirty_days: monitor
            .query(Granularity::Daily, timezone, counts.monthly_days_count)
            .await?,
        twelve_months: monitor
            .query(Granularity::Monthly, timezone, counts.yearly_count)
            .await?,
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    timezone: Option<String>,
    limit: Option<usize>,
}

/// GET /api/history/{granularity}?timezone=&limit=: one series, display-ready.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Path(granularity): Path<Granularity>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AggregateRecord>>, MonitorError> {
    let counts = &state.config.query;
    let limit = params.limit.unwrap_or(match granularity {
        Granularity::Hourly => counts.hourly_count,
        Granularity::Daily => counts.monthly_days_count,
        Granularity::Monthly => counts.yearly_count,
    });
    let records = state
        .monitor
        .query(granularity, params.timezone.as_deref(), limit)
        .await?;
    Ok(Json(records))
}

/// GET /api/window: accumulated statistics of the current (unflushed) hour.
pub(super) async fn window_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.window())
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = ?self, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error_body(status, self.to_string())
    }
}
