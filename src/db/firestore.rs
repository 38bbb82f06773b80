// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (recipient queries, token reclamation)
//! - Rides (counter transactions, participant counting)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Participant, Ride, User};
use firestore::paths_camel_case;
use std::sync::Arc;

/// Update mask for the counter transaction. Documents also carry fields
/// owned by the mobile app (description, dates, creator); writes from
/// this service must never touch those.
fn ride_counter_fields() -> Vec<String> {
    paths_camel_case!(Ride::{participants_count_self, participants_count_total})
}

/// Update mask for token reclamation: only the token list is rewritten.
fn user_token_fields() -> Vec<String> {
    paths_camel_case!(User::{expo_push_tokens})
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Raw client handle, or an error if offline. Integration tests use
    /// this to seed documents the service itself never creates.
    pub fn client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Fetch all user documents.
    ///
    /// The user base of a single community is small (hundreds, not
    /// millions), so recipient filtering happens in memory.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch all users whose token set contains the given push token.
    pub async fn users_holding_token(&self, token: &str) -> Result<Vec<User>, AppError> {
        let token = token.to_string();
        self.client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("expoPushTokens").array_contains(token.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove one push token from every given user record.
    ///
    /// A single batch write (not a transaction): removal is unconditional,
    /// so there is no read-then-write dependency, and filtering a token out
    /// of a list that no longer contains it is a no-op.
    pub async fn remove_token_from_users(
        &self,
        token: &str,
        users: &[User],
    ) -> Result<usize, AppError> {
        let client = self.client()?;

        let batch_writer = client
            .create_simple_batch_writer()
            .await
            .map_err(|e| AppError::Database(format!("Failed to create batch writer: {}", e)))?;
        let mut batch = batch_writer.new_batch();

        let mut updated = 0;
        for user in users {
            let Some(uid) = user.uid.as_deref() else {
                tracing::warn!("User document without id in token query, skipping");
                continue;
            };

            let mut cleaned = user.clone();
            cleaned.expo_push_tokens.retain(|t| t != token);

            client
                .fluent()
                .update()
                .fields(user_token_fields())
                .in_col(collections::USERS)
                .document_id(uid)
                .object(&cleaned)
                .add_to_batch(&mut batch)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add user update to batch: {}", e))
                })?;
            updated += 1;
        }

        if updated > 0 {
            batch
                .write()
                .await
                .map_err(|e| AppError::Database(format!("Batch write failed: {}", e)))?;
        }

        Ok(updated)
    }

    // ─── Ride Operations ─────────────────────────────────────────

    /// Get a ride by ID.
    pub async fn get_ride(&self, ride_id: &str) -> Result<Option<Ride>, AppError> {
        self.client()?
            .fluent()
            .select()
            .by_id_in(collections::RIDES)
            .obj()
            .one(ride_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the documents in the ride's `participants` sub-collection.
    ///
    /// This is the authoritative self-joined count used by the
    /// reconciliation pass.
    pub async fn count_ride_participants(&self, ride_id: &str) -> Result<usize, AppError> {
        let client = self.client()?;

        let parent_path = client
            .parent_path(collections::RIDES, ride_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let participants: Vec<Participant> = client
            .fluent()
            .select()
            .from(collections::PARTICIPANTS)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(participants.len())
    }

    /// Atomically read-modify-write a ride's counter fields.
    ///
    /// Runs inside `run_transaction`, so the read goes through the
    /// transaction's consistency selector and registers the document for
    /// conflict detection; a commit conflict with a concurrent writer is
    /// retried with fresh data by the client library. The write carries a
    /// field mask restricted to the two counter fields, leaving the rest
    /// of the document (including fields this service does not model)
    /// untouched.
    ///
    /// Returns `None` (without writing) if the ride no longer exists.
    pub async fn update_ride_atomic<F>(
        &self,
        ride_id: &str,
        mutate: F,
    ) -> Result<Option<Ride>, AppError>
    where
        F: Fn(&Ride) -> Ride + Send + Sync + 'static,
    {
        let client = self.client()?;
        let ride_id = ride_id.to_string();
        let mutate = Arc::new(mutate);

        let result: firestore::FirestoreResult<Option<Ride>> = client
            .run_transaction(move |db, transaction| {
                let ride_id = ride_id.clone();
                let mutate = mutate.clone();
                Box::pin(async move {
                    let current: Option<Ride> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::RIDES)
                        .obj()
                        .one(&ride_id)
                        .await?;

                    let Some(ride) = current else {
                        return Ok(None);
                    };

                    let updated = mutate(&ride);

                    db.fluent()
                        .update()
                        .fields(ride_counter_fields())
                        .in_col(collections::RIDES)
                        .document_id(&ride_id)
                        .object(&updated)
                        .add_to_transaction(transaction)?;

                    Ok(Some(updated))
                })
            })
            .await;

        result.map_err(|e| AppError::Database(format!("Ride counter transaction failed: {}", e)))
    }
}
