use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{AgentId, CallId};
use super::repository::{AnalyticsRepository, RepositoryError};
use super::scoring::{Precision, ScoreConfig};
use super::service::{
    AnalyticsService, AnalyticsServiceError, CallListQuery, DEFAULT_AUDIT_LIMIT,
    DEFAULT_PAGE_SIZE,
};
use super::timeframe::{parse_date, resolve_range, DateRange, Timeframe};

/// Router builder exposing the scoring, audit, validation and duration endpoints.
pub fn analytics_router<R>(service: Arc<AnalyticsService<R>>) -> Router
where
    R: AnalyticsRepository + 'static,
{
    Router::new()
        .route("/api/v1/calls", get(list_calls_handler::<R>))
        .route("/api/v1/calls/:call_id", get(call_detail_handler::<R>))
        .route("/api/v1/scorecard/agents", get(scorecard_handler::<R>))
        .route("/api/v1/scorecard/leaderboard", get(leaderboard_handler::<R>))
        .route("/api/v1/scorecard/validation", get(validation_handler::<R>))
        .route("/api/v1/ai-audit", get(audit_list_handler::<R>))
        .route("/api/v1/ai-audit/:call_id", get(audit_call_handler::<R>))
        .route("/api/v1/duration-analysis", get(duration_handler::<R>))
        .route(
            "/api/v1/config/score",
            get(score_config_handler::<R>).put(update_score_config_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WindowParams {
    timeframe: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    precision: Option<String>,
}

impl WindowParams {
    fn range(&self, default: Timeframe) -> Result<DateRange, AnalyticsServiceError> {
        let timeframe = match self.timeframe.as_deref() {
            Some(value) if !value.trim().is_empty() => value
                .parse::<Timeframe>()
                .map_err(AnalyticsServiceError::InvalidQuery)?,
            _ => default,
        };
        let start = optional_date(self.start_date.as_deref())?;
        let end = optional_date(self.end_date.as_deref())?;
        Ok(resolve_range(timeframe, start, end, Utc::now()))
    }

    fn precision(&self) -> Result<Option<Precision>, AnalyticsServiceError> {
        self.precision
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<Precision>())
            .transpose()
            .map_err(AnalyticsServiceError::InvalidQuery)
    }
}

fn optional_date(
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, AnalyticsServiceError> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(parse_date)
        .transpose()
        .map_err(AnalyticsServiceError::InvalidQuery)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallListParams {
    page: Option<usize>,
    page_size: Option<usize>,
    agent_id: Option<String>,
    include_details: Option<bool>,
    timeframe: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl CallListParams {
    fn window(&self) -> WindowParams {
        WindowParams {
            timeframe: self.timeframe.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            precision: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaderboardParams {
    timeframe: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    precision: Option<String>,
    min_calls: Option<usize>,
}

impl LeaderboardParams {
    fn window(&self) -> WindowParams {
        WindowParams {
            timeframe: self.timeframe.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            precision: self.precision.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuditParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

pub(crate) async fn list_calls_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<CallListParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    let params = match query_params(params) {
        Ok(params) => params,
        Err(error) => return error_response(error),
    };
    let query = match params.window().range(Timeframe::All) {
        Ok(range) => CallListQuery {
            range,
            agent_id: params
                .agent_id
                .filter(|value| !value.trim().is_empty())
                .map(AgentId),
            page: params.page.unwrap_or(1),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            include_details: params.include_details.unwrap_or(false),
        },
        Err(error) => return error_response(error),
    };

    respond(service.list_calls(&query))
}

pub(crate) async fn call_detail_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    Path(call_id): Path<String>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    respond(service.call_detail(&CallId(call_id)))
}

pub(crate) async fn scorecard_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    match query_params(params).and_then(|params| params.range(Timeframe::default())) {
        Ok(range) => respond(service.agent_scorecard(&range)),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn leaderboard_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    let request = query_params(params).and_then(|params| {
        let window = params.window();
        let range = window.range(Timeframe::ThreeMonths)?;
        let precision = window.precision()?;
        Ok((range, precision, params.min_calls))
    });
    match request {
        Ok((range, precision, min_calls)) => {
            let config = service.analysis_config();
            respond(service.leaderboard(
                &range,
                precision.unwrap_or(config.precision),
                min_calls.unwrap_or(config.min_agent_calls),
            ))
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validation_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    let request = query_params(params).and_then(|params| {
        let range = params.range(Timeframe::ThreeMonths)?;
        Ok((range, params.precision()?))
    });
    match request {
        Ok((range, precision)) => respond(service.validation_report(&range, precision)),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_list_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<AuditParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    let params = match query_params(params) {
        Ok(params) => params,
        Err(error) => return error_response(error),
    };
    respond(service.audit_calls(
        params.limit.unwrap_or(DEFAULT_AUDIT_LIMIT),
        params.offset.unwrap_or(0),
    ))
}

pub(crate) async fn audit_call_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    Path(call_id): Path<String>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    respond(service.audit_call(&CallId(call_id)))
}

pub(crate) async fn duration_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    match query_params(params).and_then(|params| params.range(Timeframe::ThirtyDays)) {
        Ok(range) => respond(service.duration_report(&range)),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_config_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    respond(service.score_config())
}

pub(crate) async fn update_score_config_handler<R>(
    State(service): State<Arc<AnalyticsService<R>>>,
    axum::Json(config): axum::Json<ScoreConfig>,
) -> Response
where
    R: AnalyticsRepository + 'static,
{
    respond(service.update_score_config(config))
}

/// Malformed query strings answer with the same JSON error body as every
/// other bad request.
fn query_params<T>(
    params: Result<Query<T>, QueryRejection>,
) -> Result<T, AnalyticsServiceError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| AnalyticsServiceError::InvalidQuery(rejection.body_text()))
}

fn respond<T: serde::Serialize>(result: Result<T, AnalyticsServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AnalyticsServiceError) -> Response {
    let status = match &error {
        AnalyticsServiceError::CallNotFound(_)
        | AnalyticsServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AnalyticsServiceError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        AnalyticsServiceError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalyticsServiceError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %error, "analytics request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
