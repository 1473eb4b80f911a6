//! # Resolver API
//!
//! Endpoints for the three-stage pipeline and the standalone tools.
//!
//! `POST /api/resolve` answers with an SSE stream: one `step` event per
//! progress update (same `id` means "replace that row"), then exactly one
//! terminal `result` or `error` event. Each request gets its own channel
//! and its own pipeline run; a client that disconnects simply stops the
//! stream while the run finishes into the void.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};

use pkgdoctor_core::models::ConflictRequest;
use pkgdoctor_core::pipeline::Resolver;
use pkgdoctor_core::skills::{SimulateSkill, SolveSkill};
use pkgdoctor_core::DoctorError;

use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// requirements.txt content
    pub requirements: String,
    /// Terminal output showing the conflict
    pub error_log: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub package_name: String,
    #[serde(default = "default_python_version")]
    pub python_version: String,
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_python_version() -> String {
    "3.10".to_string()
}

fn default_platform() -> String {
    "linux".to_string()
}

#[derive(OpenApi)]
#[openapi(
    paths(resolve, solve, simulate, tools),
    components(schemas(ResolveRequest, SimulateRequest))
)]
struct ApiDoc;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/resolve", post(resolve))
        .route("/api/tools", get(tools))
        .route("/api/tools/solve", post(solve))
        .route("/api/tools/simulate", post(simulate))
}

pub async fn openapi_json() -> Json<Value> {
    Json(serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|_| json!({})))
}

fn sse_event<T: Serialize>(name: &'static str, payload: &T) -> Event {
    match Event::default().event(name).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "failed to serialize SSE payload");
            Event::default().event("error").data("{\"message\":\"serialization failed\"}")
        }
    }
}

fn bad_gateway(error: DoctorError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": error.to_string() })),
    )
}

/// Run the three-stage pipeline, streaming progress as it happens.
#[utoipa::path(
    post,
    path = "/api/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "SSE stream of step events followed by one result or error event")
    )
)]
async fn resolve(
    State(state): State<AppState>,
    Json(body): Json<ResolveRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let request = ConflictRequest::new(body.requirements, body.error_log);
    let (out_tx, out_rx) = mpsc::channel::<Event>(64);
    let (step_tx, mut step_rx) = mpsc::channel(64);

    // Forward step events live while the pipeline runs.
    let forward_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(step) = step_rx.recv().await {
            if forward_tx.send(sse_event("step", &step)).await.is_err() {
                break;
            }
        }
    });

    let backend = state.backend.clone();
    tokio::spawn(async move {
        let mut resolver = Resolver::new(backend).with_step_channel(step_tx);
        let outcome = resolver.resolve(&request).await;
        // Close the step channel so every step is flushed before the
        // terminal event.
        drop(resolver);
        let _ = forwarder.await;
        let event = match outcome {
            Ok(result) => sse_event("result", &result),
            Err(e) => sse_event("error", &json!({ "message": e.to_string() })),
        };
        let _ = out_tx.send(event).await;
    });

    Sse::new(ReceiverStream::new(out_rx).map(Ok::<Event, Infallible>)).keep_alive(KeepAlive::default())
}

/// Tool declarations for tool-calling hosts.
#[utoipa::path(
    get,
    path = "/api/tools",
    responses((status = 200, description = "Declarations of the standalone tool operations"))
)]
async fn tools() -> Json<Value> {
    Json(json!([
        SolveSkill::tool_declaration(),
        SimulateSkill::tool_declaration(),
    ]))
}

/// One-shot conflict resolution without the pipeline.
#[utoipa::path(
    post,
    path = "/api/tools/solve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolution result"),
        (status = 502, description = "Reasoning backend unavailable")
    )
)]
async fn solve(
    State(state): State<AppState>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let request = ConflictRequest::new(body.requirements, body.error_log);
    match SolveSkill::run(state.backend.as_ref(), &request).await {
        Ok(result) => Ok(Json(serde_json::to_value(result).unwrap_or_default())),
        Err(e) => Err(bad_gateway(e)),
    }
}

/// Predict a pip install before running it.
#[utoipa::path(
    post,
    path = "/api/tools/simulate",
    request_body = SimulateRequest,
    responses(
        (status = 200, description = "Simulation report"),
        (status = 502, description = "Reasoning backend unavailable")
    )
)]
async fn simulate(
    State(state): State<AppState>,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match SimulateSkill::run(
        state.backend.as_ref(),
        &body.package_name,
        &body.python_version,
        &body.platform,
    )
    .await
    {
        Ok(report) => Ok(Json(serde_json::to_value(report).unwrap_or_default())),
        Err(e) => Err(bad_gateway(e)),
    }
}
