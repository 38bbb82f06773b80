// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride-Notify: push notification and counter-consistency backend for the
//! community ride board.
//!
//! Reacts to document change events by fanning out Expo push
//! notifications and keeping the split participant counters consistent.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{EventHandlers, PushDispatcher};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub dispatcher: PushDispatcher,
    pub handlers: EventHandlers,
}
