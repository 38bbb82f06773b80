//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const RIDES: &str = "rides";
    /// Sub-collection under `rides/{id}` (existence-only membership)
    pub const PARTICIPANTS: &str = "participants";
    pub const BOARD_POSTS: &str = "boardPosts";
}
