// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Core services: push fan-out, token reclamation, counters, handlers.

pub mod counter;
pub mod dispatch;
pub mod expo;
pub mod handlers;
pub mod recipients;
pub mod reclaim;

pub use counter::ParticipantCounter;
pub use dispatch::{PushDispatcher, PushRequest};
pub use expo::ExpoClient;
pub use handlers::EventHandlers;
pub use recipients::{Audience, NotificationCategory, RecipientDirectory};
pub use reclaim::TokenReclaimer;
