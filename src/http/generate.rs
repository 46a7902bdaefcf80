//! Generation endpoint.
//!
//! `GET` queries or lists tasks, `POST` submits a job, anything else is 405.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequest, Query, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::http::request::request_id;
use crate::http::response::{relay, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::{JobKind, Page, SubmitRequest};

/// Query string accepted on `GET`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub task_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: JobKind,
    #[serde(default)]
    pub list: bool,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

/// Entry point mounted on the generation path.
pub async fn generate_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(&request);

    let result = match method {
        Method::GET => {
            let parsed = Query::<TaskQuery>::try_from_uri(request.uri());
            match parsed {
                Ok(Query(query)) => query_tasks(&state, query).await,
                Err(e) => Err(ApiError::MalformedBody(e.body_text())),
            }
        }
        Method::POST => submit_task(&state, request).await,
        _ => Err(ApiError::MethodNotAllowed),
    };
    let response = result.unwrap_or_else(IntoResponse::into_response);

    let status = response.status();
    metrics::record_request(method.as_str(), status.as_u16(), start);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        status = %status,
        latency_ms = start.elapsed().as_millis() as u64,
        "Handled generation request"
    );
    response
}

async fn query_tasks(state: &AppState, query: TaskQuery) -> Result<Response, ApiError> {
    match query.task_id.as_deref().filter(|id| !id.is_empty()) {
        Some(task_id) => {
            tracing::debug!(task_id, kind = ?query.kind, "Querying task");
            Ok(relay(state.upstream.query(query.kind, task_id).await?))
        }
        None if query.list => {
            let defaults = Page::default();
            let page = Page {
                number: query.page_num.unwrap_or(defaults.number),
                size: query.page_size.unwrap_or(defaults.size),
            };
            Ok(relay(state.upstream.list(query.kind, page).await?))
        }
        None => Err(ApiError::MissingParameter("task_id")),
    }
}

async fn submit_task(state: &AppState, request: Request<Body>) -> Result<Response, ApiError> {
    let Json(submission) = Json::<SubmitRequest>::from_request(request, state)
        .await
        .map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let kind = submission.kind;
    let upstream = match kind {
        JobKind::Generate => {
            let body = submission.into_generation(&state.defaults)?;
            tracing::debug!(
                model = %body.model_name,
                aspect_ratio = body.aspect_ratio.as_str(),
                has_image = body.image.is_some(),
                "Submitting generation"
            );
            state.upstream.submit(kind, &body).await?
        }
        JobKind::Expand => {
            let body = submission.into_expansion()?;
            tracing::debug!("Submitting expansion");
            state.upstream.submit(kind, &body).await?
        }
    };

    Ok(relay(upstream))
}
