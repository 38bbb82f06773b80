// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin test endpoint for sending a push notification directly.
//!
//! Delivery failures are not surfaced as HTTP errors; the response is a
//! per-chunk summary and the endpoint answers 200 as long as the request
//! itself was well-formed.

use crate::error::AppError;
use crate::services::dispatch::PushRequest;
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Send routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/send", post(send_push).options(preflight))
}

/// Bare OPTIONS request. Real browser preflights carry
/// Access-Control-Request-Method and are answered by the CORS layer
/// before routing.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Per-chunk entry in the response summary.
#[derive(Serialize)]
struct ChunkSummary {
    size: usize,
    status: u16,
    ok: bool,
}

#[derive(Serialize)]
struct SendResponse {
    recipients: usize,
    chunks: Vec<ChunkSummary>,
}

/// Handle a manual send request (POST).
///
/// Body: `{to: string|[string], title, body, data?, sound?}`. Missing
/// `to`/`title`/`body` is a 400; the request is parsed by hand so the
/// error message can name the offending field.
async fn send_push(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<SendResponse>, AppError> {
    let to = parse_recipients(&payload)?;
    let title = require_string(&payload, "title")?;
    let body = require_string(&payload, "body")?;

    let request = PushRequest {
        to,
        title,
        body,
        data: payload.get("data").cloned(),
        sound: payload
            .get("sound")
            .and_then(|v| v.as_str())
            .map(String::from),
    };

    let recipients = request.to.len();
    let results = state.dispatcher.dispatch(&request).await;

    tracing::info!(
        recipients,
        chunks = results.len(),
        "Manual push dispatch complete"
    );

    Ok(Json(SendResponse {
        recipients,
        chunks: results
            .iter()
            .map(|r| ChunkSummary {
                size: r.chunk_size,
                status: r.http_status,
                ok: r.ok,
            })
            .collect(),
    }))
}

/// `to` may be a single address or a list of addresses.
fn parse_recipients(payload: &serde_json::Value) -> Result<Vec<String>, AppError> {
    match payload.get("to") {
        Some(serde_json::Value::String(s)) => Ok(vec![s.clone()]),
        Some(serde_json::Value::Array(items)) => Ok(items
            .iter()
            .filter_map(|v| v.as_str())
            .map(String::from)
            .collect()),
        Some(_) => Err(AppError::BadRequest(
            "'to' must be a string or a list of strings".to_string(),
        )),
        None => Err(AppError::BadRequest("Missing field 'to'".to_string())),
    }
}

fn require_string(payload: &serde_json::Value, field: &str) -> Result<String, AppError> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest(format!("Missing field '{}'", field)))
}
