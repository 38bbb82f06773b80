// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional participant-counter maintenance.
//!
//! `participantsCountTotal` must equal `participantsCountSelf +
//! len(manualParticipants)` at the end of every successful transaction.
//! Self-joins and manual roster edits are independent event streams, so
//! each operation only recomputes the partition it owns and re-derives
//! the total.

use crate::db::FirestoreDb;
use crate::error::AppError;

/// Maintains a ride's split participant counters.
#[derive(Clone)]
pub struct ParticipantCounter {
    db: FirestoreDb,
}

impl ParticipantCounter {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Apply a +1/-1 self-join delta inside a transaction.
    ///
    /// A delta that would push the count negative (duplicate leave event)
    /// is clamped at zero. A missing ride is a benign no-op.
    pub async fn apply_delta(&self, ride_id: &str, delta: i64) -> Result<(), AppError> {
        let rid = ride_id.to_string();
        let updated = self
            .db
            .update_ride_atomic(ride_id, move |ride| {
                let (base_self, source) = ride.base_self_count();
                let next_self = (base_self + delta).max(0);
                if base_self + delta < 0 {
                    tracing::warn!(
                        ride_id = %rid,
                        base_self,
                        delta,
                        "Participant delta clamped at zero (possible lost decrement)"
                    );
                }
                tracing::debug!(
                    ride_id = %rid,
                    base_self,
                    ?source,
                    delta,
                    "Applying participant delta"
                );
                ride.with_counters(next_self, next_self + ride.manual_count())
            })
            .await?;

        match updated {
            Some(ride) => tracing::info!(
                ride_id,
                delta,
                self_count = ride.participants_count_self,
                total = ride.participants_count_total,
                "Participant counters updated"
            ),
            None => tracing::info!(ride_id, "Ride no longer exists, skipping counter delta"),
        }
        Ok(())
    }

    /// Overwrite the self-joined count with the sub-collection's actual
    /// cardinality, regardless of what the delta path last wrote.
    ///
    /// Run on every participant trigger as a self-healing pass: the
    /// counter converges even if individual delta events were lost,
    /// duplicated, or raced.
    pub async fn reconcile(&self, ride_id: &str) -> Result<(), AppError> {
        let actual = self.db.count_ride_participants(ride_id).await? as i64;

        let updated = self
            .db
            .update_ride_atomic(ride_id, move |ride| {
                ride.with_counters(actual, actual + ride.manual_count())
            })
            .await?;

        match updated {
            Some(ride) => tracing::info!(
                ride_id,
                self_count = actual,
                total = ride.participants_count_total,
                "Participant counters reconciled"
            ),
            None => tracing::info!(ride_id, "Ride no longer exists, skipping reconciliation"),
        }
        Ok(())
    }

    /// Recompute the total after the manual roster changed.
    ///
    /// Never changes the self partition's value; re-writing it through the
    /// fallback chain backfills documents from before the split schema.
    pub async fn refresh_for_manual_change(&self, ride_id: &str) -> Result<(), AppError> {
        let rid = ride_id.to_string();
        let updated = self
            .db
            .update_ride_atomic(ride_id, move |ride| {
                let (base_self, source) = ride.base_self_count();
                tracing::debug!(
                    ride_id = %rid,
                    base_self,
                    ?source,
                    "Refreshing total for manual roster change"
                );
                ride.with_counters(base_self, base_self + ride.manual_count())
            })
            .await?;

        match updated {
            Some(ride) => tracing::info!(
                ride_id,
                self_count = ride.participants_count_self,
                total = ride.participants_count_total,
                "Participant total refreshed for manual roster change"
            ),
            None => tracing::info!(ride_id, "Ride no longer exists, skipping manual refresh"),
        }
        Ok(())
    }
}
