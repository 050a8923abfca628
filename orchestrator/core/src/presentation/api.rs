// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Help desk HTTP API
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/api/help-requests` | File an escalation, returns `{requestId}` |
//! | `GET` | `/api/help-requests?status=` | List requests, newest first |
//! | `GET` | `/api/help-requests/{id}` | One request |
//! | `PUT` | `/api/help-requests/{id}/resolve` | Record the supervisor answer |
//! | `GET` | `/api/knowledge-base` | Knowledge entries, newest first |
//! | `POST` | `/api/knowledge-base/match` | Run the matcher for `{query}` |
//! | `GET` | `/api/events` | Domain events as server-sent events |
//! | `GET` | `/health` | Liveness |

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::help_desk::{HelpDeskError, HelpDeskService};
use crate::domain::escalation::{EscalationId, EscalationReceipt, EscalationStatus, NewEscalation};
use crate::infrastructure::event_bus::{DomainEvent, EventBus, EventBusError};

pub struct AppState {
    pub help_desk: Arc<HelpDeskService>,
    pub event_bus: EventBus,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(help_desk: Arc<HelpDeskService>, event_bus: EventBus) -> Self {
        Self {
            help_desk,
            event_bus,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: Arc<AppState>, cors_allowed_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/help-requests",
            post(create_request_handler).get(list_requests_handler),
        )
        .route("/api/help-requests/{id}", get(get_request_handler))
        .route("/api/help-requests/{id}/resolve", put(resolve_request_handler))
        .route("/api/knowledge-base", get(knowledge_base_handler))
        .route("/api/knowledge-base/match", post(match_handler))
        .route("/api/events", get(stream_events_handler))
        .layer(cors_layer(cors_allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// CORS for the supervisor dashboard. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {}", o)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<HelpDeskError> for ApiError {
    fn from(err: HelpDeskError) -> Self {
        let status = match &err {
            HelpDeskError::NotFound(_) => StatusCode::NOT_FOUND,
            HelpDeskError::AlreadyResolved(_) => StatusCode::CONFLICT,
            HelpDeskError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HelpDeskError::Storage(_) | HelpDeskError::Unavailable(_) => {
                error!(error = %err, "Help desk request failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn parse_id(id: &str) -> Result<EscalationId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid help request id: {}", id)))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_request_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewEscalation>, JsonRejection>,
) -> Result<(StatusCode, Json<EscalationReceipt>), ApiError> {
    let Json(intake) = payload?;
    let request = state.help_desk.create(intake).await?;
    Ok((StatusCode::CREATED, Json(EscalationReceipt { request_id: request.id })))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
}

async fn list_requests_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<EscalationStatus>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let requests = state.help_desk.list(status).await?;
    Ok(Json(requests).into_response())
}

async fn get_request_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let request = state.help_desk.get(parse_id(&id)?).await?;
    Ok(Json(request).into_response())
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    answer: String,
}

async fn resolve_request_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ResolveBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let receipt = state.help_desk.resolve(id, &body.answer).await?;
    Ok(Json(receipt).into_response())
}

async fn knowledge_base_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let entries = state.help_desk.knowledge_base().await?;
    Ok(Json(entries).into_response())
}

#[derive(Debug, Deserialize)]
struct MatchBody {
    query: String,
}

async fn match_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MatchBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let decision = state.help_desk.match_query(&body.query).await?;
    Ok(Json(decision).into_response())
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::Escalation(e) => e.event_type(),
        DomainEvent::Knowledge(e) => e.event_type(),
    }
}

async fn stream_events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.event_bus.subscribe();

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let sse = Event::default().event(event_name(&event)).json_data(&event);
                    return Some((sse, receiver));
                }
                Err(EventBusError::Lagged(missed)) => {
                    warn!(missed, "Dashboard event stream lagged");
                }
                Err(_) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
