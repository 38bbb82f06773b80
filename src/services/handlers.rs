// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event handlers: thin orchestration from document change events to
//! recipient selection, push dispatch, and counter maintenance.
//!
//! A failed notification or counter update must never prevent the
//! underlying data mutation (which already committed), so each sub-step
//! has its own error boundary and failures are logged, not re-thrown.

use crate::error::AppError;
use crate::models::{BoardPost, Ride, User, UserRole};
use crate::services::counter::ParticipantCounter;
use crate::services::dispatch::{ChunkResult, PushDispatcher, PushRequest};
use crate::services::recipients::{Audience, NotificationCategory, RecipientDirectory};

/// Composes the core components into end-to-end event reactions.
#[derive(Clone)]
pub struct EventHandlers {
    recipients: RecipientDirectory,
    dispatcher: PushDispatcher,
    counter: ParticipantCounter,
}

impl EventHandlers {
    pub fn new(
        recipients: RecipientDirectory,
        dispatcher: PushDispatcher,
        counter: ParticipantCounter,
    ) -> Self {
        Self {
            recipients,
            dispatcher,
            counter,
        }
    }

    /// Ride created: initialize the split counters and announce the ride.
    pub async fn on_ride_created(&self, ride_id: &str, ride: &Ride) -> Result<(), AppError> {
        // Counter init first: yields self = 0, total = len(manualParticipants)
        if let Err(e) = self.counter.refresh_for_manual_change(ride_id).await {
            tracing::error!(ride_id, error = %e, "Failed to initialize ride counters");
        }

        let body = ride
            .title
            .clone()
            .unwrap_or_else(|| "A new ride has been posted.".to_string());

        self.notify(
            Audience::Approved,
            Some(NotificationCategory::NewRides),
            "New ride posted",
            &body,
            serde_json::json!({ "type": "rideCreated", "rideId": ride_id }),
        )
        .await;

        Ok(())
    }

    /// Ride updated: announce a transition into cancelled, and refresh the
    /// total when the manual roster size changed.
    pub async fn on_ride_updated(
        &self,
        ride_id: &str,
        before: &Ride,
        after: &Ride,
    ) -> Result<(), AppError> {
        if became_cancelled(before, after) {
            let title = after
                .title
                .clone()
                .unwrap_or_else(|| "A ride".to_string());

            self.notify(
                Audience::Approved,
                Some(NotificationCategory::RideChanges),
                "Ride cancelled",
                &format!("\"{}\" has been cancelled.", title),
                serde_json::json!({ "type": "rideCancelled", "rideId": ride_id }),
            )
            .await;
        }

        if before.manual_participants.len() != after.manual_participants.len() {
            if let Err(e) = self.counter.refresh_for_manual_change(ride_id).await {
                tracing::error!(ride_id, error = %e, "Failed to refresh total for manual roster change");
            }
        }

        Ok(())
    }

    /// Participant document written: apply the membership delta, then run
    /// the self-healing reconciliation regardless of the delta.
    pub async fn on_participant_written(
        &self,
        ride_id: &str,
        existed_before: bool,
        exists_after: bool,
    ) -> Result<(), AppError> {
        match (existed_before, exists_after) {
            (false, true) => {
                if let Err(e) = self.counter.apply_delta(ride_id, 1).await {
                    tracing::error!(ride_id, error = %e, "Failed to apply join delta");
                }
            }
            (true, false) => {
                if let Err(e) = self.counter.apply_delta(ride_id, -1).await {
                    tracing::error!(ride_id, error = %e, "Failed to apply leave delta");
                }
            }
            // In-place update: membership unchanged, no delta
            _ => {}
        }

        if let Err(e) = self.counter.reconcile(ride_id).await {
            tracing::error!(ride_id, error = %e, "Failed to reconcile participant counters");
        }

        Ok(())
    }

    /// User created: tell the owners a new user awaits approval.
    pub async fn on_user_created(&self, user: &User) -> Result<(), AppError> {
        if !should_announce_new_user(user) {
            tracing::debug!("New user does not need an approval notice, skipping");
            return Ok(());
        }

        let name = user
            .display_name
            .clone()
            .unwrap_or_else(|| "A new user".to_string());

        self.notify(
            Audience::Owners,
            None,
            "New user awaiting approval",
            &format!("{} is waiting for approval.", name),
            serde_json::json!({ "type": "userAwaitingApproval" }),
        )
        .await;

        Ok(())
    }

    /// Board post created: announce it to the approved audience.
    pub async fn on_board_post_created(&self, post: &BoardPost) -> Result<(), AppError> {
        let title = post
            .title
            .clone()
            .unwrap_or_else(|| "New post".to_string());
        let body = match &post.author_name {
            Some(author) => format!("\"{}\" by {}", title, author),
            None => format!("\"{}\"", title),
        };

        self.notify(
            Audience::Approved,
            Some(NotificationCategory::BoardPosts),
            "New board post",
            &body,
            serde_json::json!({ "type": "boardPostCreated" }),
        )
        .await;

        Ok(())
    }

    /// Select recipients and dispatch, logging chunk-level outcomes.
    /// Selection failure is logged here, never propagated.
    async fn notify(
        &self,
        audience: Audience,
        category: Option<NotificationCategory>,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) {
        let selection = match self.recipients.select_recipients(audience, category).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Recipient selection failed, dropping notification");
                return;
            }
        };

        let request = PushRequest {
            to: selection.tokens,
            title: title.to_string(),
            body: body.to_string(),
            data: Some(data),
            sound: None,
        };

        let results = self.dispatcher.dispatch(&request).await;
        log_chunk_outcomes(title, selection.considered_users, &results);
    }
}

/// Did the ride transition *into* cancelled? Cancelled-to-cancelled and
/// any transition not landing on cancelled are no-ops.
pub fn became_cancelled(before: &Ride, after: &Ride) -> bool {
    !before.is_cancelled() && after.is_cancelled()
}

/// Does a freshly-created user need an "awaiting approval" notice?
/// Disabled and already-approved users don't; neither do owners/admins
/// about themselves.
pub fn should_announce_new_user(user: &User) -> bool {
    if user.is_disabled() || user.is_approved() {
        return false;
    }
    !matches!(user.role, Some(UserRole::Owner) | Some(UserRole::Admin))
}

fn log_chunk_outcomes(event: &str, considered_users: usize, results: &[ChunkResult]) {
    let failed = results.iter().filter(|r| !r.ok).count();
    tracing::info!(
        event,
        considered_users,
        chunks = results.len(),
        failed_chunks = failed,
        "Push dispatch complete"
    );
}
