//! User model for storage and recipient selection.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore (camelCase to match the mobile app).
///
/// Every field the mobile client may leave unset is optional so that
/// partially-written registration documents still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document ID, populated by the firestore crate on reads. Never
    /// written back into the document.
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
    /// Expo push tokens registered by this user's devices. A token may
    /// appear on multiple user records after an app reinstall.
    #[serde(default)]
    pub expo_push_tokens: Vec<String>,
    /// Global opt-out from all push notifications.
    #[serde(default)]
    pub notifications_disabled: Option<bool>,
    #[serde(default)]
    pub notifications_disabled_for_new_rides: Option<bool>,
    #[serde(default)]
    pub notifications_disabled_for_ride_changes: Option<bool>,
    #[serde(default)]
    pub notifications_disabled_for_board_posts: Option<bool>,
}

/// User role. Unknown values deserialize to `Unknown` rather than failing
/// the whole query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Member,
    Admin,
    Owner,
    #[serde(other)]
    Unknown,
}

impl User {
    pub fn is_disabled(&self) -> bool {
        self.disabled == Some(true)
    }

    pub fn is_approved(&self) -> bool {
        self.approved == Some(true)
    }

    pub fn is_owner(&self) -> bool {
        self.role == Some(UserRole::Owner)
    }
}
