// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Expo push API client and wire protocol types.
//!
//! One HTTP POST carries one chunk: a JSON array with one message entry
//! per recipient. The response envelope's `data[i]` ticket corresponds to
//! request entry `i` (positional, guaranteed by the protocol).

use crate::error::AppError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Expo push send endpoint.
const PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Cap on one chunk request. A hung provider connection must not stall
/// the rest of the batch indefinitely.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Ticket error codes meaning the token will never accept deliveries
/// again: device unregistered, token unknown to the underlying provider,
/// or revoked push credentials. Everything else is transient.
const PERMANENT_ERRORS: [&str; 3] = ["DeviceNotRegistered", "NotRegistered", "InvalidCredentials"];

/// Expo push API client.
#[derive(Clone)]
pub struct ExpoClient {
    http: reqwest::Client,
    url: String,
    access_token: Option<String>,
}

impl ExpoClient {
    /// Create a new client. The access token is optional; without it
    /// requests are sent unauthenticated.
    pub fn new(access_token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building push HTTP client")?;

        Ok(Self {
            http,
            url: PUSH_URL.to_string(),
            access_token,
        })
    }

    /// Send one chunk of messages.
    ///
    /// Returns the HTTP status and raw response body; interpreting the
    /// body is the dispatcher's job. A transport failure (connect error,
    /// timeout) surfaces as `AppError::Provider`.
    pub async fn send_chunk(&self, messages: &[PushMessage<'_>]) -> Result<(u16, String), AppError> {
        let mut request = self.http.post(&self.url).json(messages);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to read response body: {}", e)))?;

        Ok((status, body))
    }
}

/// One request entry, addressed to a single recipient token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage<'a> {
    pub to: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a serde_json::Value>,
    pub sound: &'a str,
    pub channel_id: &'a str,
}

/// Response envelope. Both fields are optional on the wire; a top-level
/// `errors` list signals a batch-level failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEnvelope {
    #[serde(default)]
    pub data: Option<Vec<PushTicket>>,
    #[serde(default)]
    pub errors: Option<Vec<PushEnvelopeError>>,
}

/// Per-recipient delivery ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct PushTicket {
    pub status: TicketStatus,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<TicketDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketDetails {
    #[serde(default)]
    pub error: Option<String>,
}

/// Batch-level error entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelopeError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PushTicket {
    /// Error code for an error ticket, if the provider supplied one.
    pub fn error_code(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.error.as_deref())
    }

    /// Whether this ticket marks its token as permanently undeliverable.
    pub fn is_permanent_failure(&self) -> bool {
        self.status == TicketStatus::Error
            && self
                .error_code()
                .is_some_and(|code| PERMANENT_ERRORS.contains(&code))
    }
}
