// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipient selection for push notifications.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;
use std::collections::HashSet;

/// Which slice of the user base a notification targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// All approved, non-disabled users.
    Approved,
    /// All users with the owner role (approval not required).
    Owners,
}

/// Per-event notification category, each with its own opt-out flag on the
/// user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    NewRides,
    RideChanges,
    BoardPosts,
}

/// Result of a recipient query.
#[derive(Debug)]
pub struct RecipientSelection {
    /// Deduplicated push tokens across all selected users. A token is a
    /// delivery address, not a per-user counter.
    pub tokens: Vec<String>,
    /// Number of user documents examined.
    pub considered_users: usize,
}

/// Read-only directory of push-eligible users.
#[derive(Clone)]
pub struct RecipientDirectory {
    db: FirestoreDb,
}

impl RecipientDirectory {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Select push tokens for an audience, honoring opt-out flags.
    pub async fn select_recipients(
        &self,
        audience: Audience,
        category: Option<NotificationCategory>,
    ) -> Result<RecipientSelection, AppError> {
        let users = self.db.list_users().await?;
        let considered_users = users.len();

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for user in &users {
            if !is_eligible(user, audience, category) {
                continue;
            }
            for token in &user.expo_push_tokens {
                if !token.is_empty() && seen.insert(token.clone()) {
                    tokens.push(token.clone());
                }
            }
        }

        tracing::debug!(
            considered = considered_users,
            tokens = tokens.len(),
            "Selected push recipients"
        );

        Ok(RecipientSelection {
            tokens,
            considered_users,
        })
    }
}

/// Eligibility predicate for one user.
pub fn is_eligible(
    user: &User,
    audience: Audience,
    category: Option<NotificationCategory>,
) -> bool {
    match audience {
        Audience::Approved => {
            if !user.is_approved() {
                return false;
            }
        }
        Audience::Owners => {
            if !user.is_owner() {
                return false;
            }
        }
    }

    if user.is_disabled() || user.notifications_disabled == Some(true) {
        return false;
    }

    let opted_out = match category {
        Some(NotificationCategory::NewRides) => user.notifications_disabled_for_new_rides,
        Some(NotificationCategory::RideChanges) => user.notifications_disabled_for_ride_changes,
        Some(NotificationCategory::BoardPosts) => user.notifications_disabled_for_board_posts,
        None => None,
    };

    opted_out != Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn approved_user() -> User {
        User {
            approved: Some(true),
            expo_push_tokens: vec!["tok".to_string()],
            ..User::default()
        }
    }

    #[test]
    fn test_approved_audience_requires_approval() {
        let mut user = approved_user();
        assert!(is_eligible(&user, Audience::Approved, None));

        user.approved = Some(false);
        assert!(!is_eligible(&user, Audience::Approved, None));

        user.approved = None;
        assert!(!is_eligible(&user, Audience::Approved, None));
    }

    #[test]
    fn test_disabled_user_excluded() {
        let mut user = approved_user();
        user.disabled = Some(true);
        assert!(!is_eligible(&user, Audience::Approved, None));
    }

    #[test]
    fn test_global_opt_out_excluded() {
        let mut user = approved_user();
        user.notifications_disabled = Some(true);
        assert!(!is_eligible(&user, Audience::Approved, None));
    }

    #[test]
    fn test_category_opt_out_only_applies_to_its_category() {
        let mut user = approved_user();
        user.notifications_disabled_for_new_rides = Some(true);

        assert!(!is_eligible(
            &user,
            Audience::Approved,
            Some(NotificationCategory::NewRides)
        ));
        assert!(is_eligible(
            &user,
            Audience::Approved,
            Some(NotificationCategory::BoardPosts)
        ));
        assert!(is_eligible(&user, Audience::Approved, None));
    }

    #[test]
    fn test_owners_audience_does_not_require_approval() {
        let user = User {
            role: Some(UserRole::Owner),
            approved: None,
            ..User::default()
        };
        assert!(is_eligible(&user, Audience::Owners, None));

        let member = approved_user();
        assert!(!is_eligible(&member, Audience::Owners, None));
    }
}
