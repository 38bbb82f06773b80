// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride-Notify API Server
//!
//! Backend notification engine for the community ride board: push
//! fan-out for ride/board/user events and transactional participant
//! counter maintenance.

use ride_notify::{
    config::Config,
    db::FirestoreDb,
    services::{
        EventHandlers, ExpoClient, ParticipantCounter, PushDispatcher, RecipientDirectory,
        TokenReclaimer,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Ride-Notify API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Push pipeline: provider client, reclaimer, dispatcher
    let expo =
        ExpoClient::new(config.expo_access_token.clone()).expect("Failed to build push client");
    let reclaimer = TokenReclaimer::new(db.clone());
    let dispatcher = PushDispatcher::new(expo, reclaimer);
    tracing::info!(
        authenticated = config.expo_access_token.is_some(),
        "Expo push client initialized"
    );

    // Event reaction wiring
    let recipients = RecipientDirectory::new(db.clone());
    let counter = ParticipantCounter::new(db.clone());
    let handlers = EventHandlers::new(recipients, dispatcher.clone(), counter);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        dispatcher,
        handlers,
    });

    // Build router
    let app = ride_notify::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ride_notify=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
