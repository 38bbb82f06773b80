// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push fan-out: recipient normalization, chunked dispatch, ticket
//! interpretation, and invalid-token collection.
//!
//! Expo accepts at most 100 messages per request, so recipients are
//! partitioned by count (never by payload size). One chunk's failure
//! never aborts the rest of the batch; provider-side errors are logged
//! and reflected in the per-chunk results, never thrown.

use crate::services::expo::{ExpoClient, PushEnvelope, PushMessage, TicketStatus};
use crate::services::reclaim::TokenReclaimer;
use std::collections::HashSet;

/// Expo's per-request message limit.
pub const CHUNK_SIZE: usize = 100;

const DEFAULT_SOUND: &str = "default";
const DEFAULT_CHANNEL: &str = "default";

/// A notification to fan out. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub to: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub sound: Option<String>,
}

/// Outcome of one provider request.
#[derive(Debug)]
pub struct ChunkResult {
    pub chunk_size: usize,
    /// HTTP status, or 0 when the request never got a response.
    pub http_status: u16,
    pub ok: bool,
    pub response: ProviderResponse,
}

/// The provider's response body. Parse failure is a first-class outcome
/// carrying the raw body, not an error.
#[derive(Debug)]
pub enum ProviderResponse {
    Parsed(PushEnvelope),
    Unparsed(String),
}

/// Chunked push dispatcher.
#[derive(Clone)]
pub struct PushDispatcher {
    expo: ExpoClient,
    reclaimer: TokenReclaimer,
}

impl PushDispatcher {
    pub fn new(expo: ExpoClient, reclaimer: TokenReclaimer) -> Self {
        Self { expo, reclaimer }
    }

    /// Send a notification to every recipient in the request.
    ///
    /// Returns one `ChunkResult` per provider request, in chunk order.
    /// Never fails on provider-side errors; tokens the provider flags as
    /// permanently dead are handed to the reclaimer afterwards, with the
    /// reclaimer's own errors caught and logged rather than propagated.
    pub async fn dispatch(&self, request: &PushRequest) -> Vec<ChunkResult> {
        let tokens = normalize_recipients(&request.to);
        if tokens.is_empty() {
            tracing::debug!("No push recipients after normalization, skipping dispatch");
            return Vec::new();
        }

        let sound = request.sound.as_deref().unwrap_or(DEFAULT_SOUND);
        let mut results = Vec::with_capacity(tokens.len().div_ceil(CHUNK_SIZE));
        let mut invalid_tokens: HashSet<String> = HashSet::new();

        for (index, chunk) in tokens.chunks(CHUNK_SIZE).enumerate() {
            let messages: Vec<PushMessage> = chunk
                .iter()
                .map(|token| PushMessage {
                    to: token,
                    title: &request.title,
                    body: &request.body,
                    data: request.data.as_ref(),
                    sound,
                    channel_id: DEFAULT_CHANNEL,
                })
                .collect();

            let result = match self.expo.send_chunk(&messages).await {
                Ok((status, body)) => {
                    let ok = (200..300).contains(&status);
                    if !ok {
                        tracing::error!(
                            chunk = index,
                            status,
                            "Push provider returned non-success status"
                        );
                    }

                    match serde_json::from_str::<PushEnvelope>(&body) {
                        Ok(envelope) => {
                            if let Some(errors) = &envelope.errors {
                                for error in errors {
                                    tracing::error!(
                                        chunk = index,
                                        code = error.code.as_deref().unwrap_or("unknown"),
                                        message = error.message.as_deref().unwrap_or(""),
                                        "Push provider reported batch-level error"
                                    );
                                }
                            }
                            invalid_tokens.extend(collect_invalid_tokens(chunk, &envelope));

                            ChunkResult {
                                chunk_size: chunk.len(),
                                http_status: status,
                                ok,
                                response: ProviderResponse::Parsed(envelope),
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                chunk = index,
                                error = %e,
                                "Unparseable push provider response body"
                            );
                            ChunkResult {
                                chunk_size: chunk.len(),
                                http_status: status,
                                ok,
                                response: ProviderResponse::Unparsed(body),
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        chunk = index,
                        size = chunk.len(),
                        error = %e,
                        "Push chunk transport failure, continuing with remaining chunks"
                    );
                    ChunkResult {
                        chunk_size: chunk.len(),
                        http_status: 0,
                        ok: false,
                        response: ProviderResponse::Unparsed(String::new()),
                    }
                }
            };

            results.push(result);
        }

        if !invalid_tokens.is_empty() {
            tracing::info!(
                count = invalid_tokens.len(),
                "Reclaiming permanently invalid push tokens"
            );
            // Post-dispatch cleanup with its own error boundary: a failed
            // reclamation never turns into a dispatch failure.
            if let Err(e) = self.reclaimer.reclaim(&invalid_tokens).await {
                tracing::error!(error = %e, "Token reclamation failed");
            }
        }

        results
    }
}

/// Drop empty entries and deduplicate, preserving first-seen order.
pub fn normalize_recipients(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|token| !token.trim().is_empty())
        .filter(|token| seen.insert(token.as_str()))
        .cloned()
        .collect()
}

/// Collect tokens whose tickets carry a permanent-invalidity error.
///
/// Ticket `i` corresponds to chunk token `i`; the alignment is strictly
/// positional. A ticket count mismatch is a protocol violation and voids
/// classification for the whole chunk.
pub fn collect_invalid_tokens(chunk: &[String], envelope: &PushEnvelope) -> Vec<String> {
    let Some(tickets) = &envelope.data else {
        return Vec::new();
    };

    if tickets.len() != chunk.len() {
        tracing::warn!(
            tickets = tickets.len(),
            tokens = chunk.len(),
            "Ticket count does not match chunk size, skipping classification"
        );
        return Vec::new();
    }

    let mut invalid = Vec::new();
    for (token, ticket) in chunk.iter().zip(tickets) {
        if ticket.is_permanent_failure() {
            tracing::info!(
                code = ticket.error_code().unwrap_or("unknown"),
                "Push token permanently undeliverable"
            );
            invalid.push(token.clone());
        } else if ticket.status == TicketStatus::Error {
            tracing::warn!(
                code = ticket.error_code().unwrap_or("unknown"),
                message = ticket.message.as_deref().unwrap_or(""),
                "Transient push delivery failure"
            );
        }
    }
    invalid
}
