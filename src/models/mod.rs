// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document models stored in Firestore.

pub mod post;
pub mod ride;
pub mod user;

pub use post::BoardPost;
pub use ride::{CountSource, Participant, Ride, RideStatus};
pub use user::{User, UserRole};
