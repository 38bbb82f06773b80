// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intake for document change events.
//!
//! The document store's change-delivery mechanism is external; it POSTs
//! `{document, before?, after?}` here, where `document` is the document
//! path and the snapshots are plain JSON. The endpoint always answers 200
//! to the event source: expected failures are logged at their origin and
//! must never cause the event to be retried against an already-committed
//! data mutation.

use crate::db::collections;
use crate::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Event routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events", post(handle_event))
}

/// A document change event: `before`/`after` are absent when the document
/// did not exist on that side of the change.
#[derive(Deserialize, Debug)]
struct ChangeEvent {
    /// Document path, e.g. `rides/abc` or `rides/abc/participants/u1`.
    document: String,
    #[serde(default)]
    before: Option<serde_json::Value>,
    #[serde(default)]
    after: Option<serde_json::Value>,
}

/// Handle an incoming change event (POST).
///
/// The body is taken raw rather than through the JSON extractor: a
/// syntactically broken payload must still be answered with 200, and the
/// extractor would reject it before this handler runs.
async fn handle_event(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let event: ChangeEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse change event");
            return StatusCode::OK; // Never trigger event-source retries
        }
    };

    let segments: Vec<&str> = event.document.split('/').filter(|s| !s.is_empty()).collect();

    tracing::info!(
        document = %event.document,
        existed_before = event.before.is_some(),
        exists_after = event.after.is_some(),
        "Change event received"
    );

    match segments.as_slice() {
        [collections::USERS, _uid] => {
            if event.before.is_none() {
                if let Some(user) = decode(event.after, "user") {
                    if let Err(e) = state.handlers.on_user_created(&user).await {
                        tracing::error!(error = %e, "User-created handler failed");
                    }
                }
            }
        }
        [collections::RIDES, ride_id] => match (event.before, event.after) {
            (None, Some(after)) => {
                if let Some(ride) = decode(Some(after), "ride") {
                    if let Err(e) = state.handlers.on_ride_created(ride_id, &ride).await {
                        tracing::error!(ride_id, error = %e, "Ride-created handler failed");
                    }
                }
            }
            (Some(before), Some(after)) => {
                let decoded = decode(Some(before), "ride").zip(decode(Some(after), "ride"));
                if let Some((before, after)) = decoded {
                    if let Err(e) = state
                        .handlers
                        .on_ride_updated(ride_id, &before, &after)
                        .await
                    {
                        tracing::error!(ride_id, error = %e, "Ride-updated handler failed");
                    }
                }
            }
            (Some(_), None) => {
                tracing::debug!(ride_id, "Ride deleted, nothing to do");
            }
            (None, None) => {}
        },
        [collections::RIDES, ride_id, collections::PARTICIPANTS, _user_id] => {
            if let Err(e) = state
                .handlers
                .on_participant_written(ride_id, event.before.is_some(), event.after.is_some())
                .await
            {
                tracing::error!(ride_id, error = %e, "Participant handler failed");
            }
        }
        [collections::BOARD_POSTS, _post_id] => {
            if event.before.is_none() {
                if let Some(post) = decode(event.after, "board post") {
                    if let Err(e) = state.handlers.on_board_post_created(&post).await {
                        tracing::error!(error = %e, "Board-post handler failed");
                    }
                }
            }
        }
        _ => {
            tracing::debug!(document = %event.document, "Ignoring event for unhandled document path");
        }
    }

    StatusCode::OK
}

/// Deserialize a snapshot, logging (not propagating) failures.
fn decode<T: DeserializeOwned>(snapshot: Option<serde_json::Value>, kind: &str) -> Option<T> {
    let value = snapshot?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::error!(kind, error = %e, "Failed to decode document snapshot");
            None
        }
    }
}
