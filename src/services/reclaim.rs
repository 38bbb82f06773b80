// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invalid push-token reclamation.
//!
//! Best-effort cleanup pass: a failure while reclaiming one token is
//! logged and does not prevent reclaiming the rest. Removal is idempotent,
//! so concurrent reclamation of the same token is safe.

use crate::db::FirestoreDb;
use crate::error::AppError;
use futures_util::{stream, StreamExt};
use std::collections::HashSet;

const MAX_CONCURRENT_RECLAIMS: usize = 10;

/// Removes permanently undeliverable tokens from every user holding them.
#[derive(Clone)]
pub struct TokenReclaimer {
    db: FirestoreDb,
}

impl TokenReclaimer {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Purge each token from all user records that contain it.
    pub async fn reclaim(&self, tokens: &HashSet<String>) -> Result<(), AppError> {
        stream::iter(tokens.iter().cloned())
            .for_each_concurrent(MAX_CONCURRENT_RECLAIMS, |token| async move {
                if let Err(e) = self.reclaim_one(&token).await {
                    tracing::error!(error = %e, "Failed to reclaim push token");
                }
            })
            .await;

        Ok(())
    }

    /// Remove one token from every holder in a single batch write.
    async fn reclaim_one(&self, token: &str) -> Result<(), AppError> {
        let holders = self.db.users_holding_token(token).await?;
        if holders.is_empty() {
            tracing::debug!("Invalid token not held by any user (already reclaimed)");
            return Ok(());
        }

        let updated = self.db.remove_token_from_users(token, &holders).await?;
        tracing::info!(users = updated, "Removed invalid push token from users");
        Ok(())
    }
}
