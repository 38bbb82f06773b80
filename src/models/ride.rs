//! Ride model and the split participant-counter arithmetic.
//!
//! A ride's participant total is the sum of two independently-changing
//! parts: the self-joined count (derived from the `participants`
//! sub-collection) and the manually-added roster kept by staff. Keeping
//! the two addends separate lets join events and roster edits update the
//! total without reading each other's state.

use serde::{Deserialize, Serialize};

/// Ride document stored in Firestore (camelCase to match the mobile app).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<RideStatus>,
    /// Participant identifiers added by staff, not through self-join.
    #[serde(default)]
    pub manual_participants: Vec<String>,
    /// Count of self-joined participants.
    #[serde(default)]
    pub participants_count_self: Option<i64>,
    /// `participants_count_self + manual_participants.len()`.
    #[serde(default)]
    pub participants_count_total: Option<i64>,
    /// Single counter from before the split-counter schema.
    #[serde(default)]
    pub participants_count: Option<i64>,
}

/// Ride status. Unknown values deserialize to `Unknown` rather than
/// failing the whole event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Which migration strategy produced the self-joined base count.
///
/// Documents written before the split-counter schema carry only a total
/// (or only the legacy single counter); the strategies are evaluated in
/// this order until one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// `participantsCountSelf` was present.
    SplitField,
    /// Derived from `participantsCountTotal - len(manualParticipants)`.
    DerivedFromTotal,
    /// Derived from legacy `participantsCount - len(manualParticipants)`.
    DerivedFromLegacy,
    /// No counter field present at all.
    Default,
}

impl Ride {
    pub fn is_cancelled(&self) -> bool {
        self.status == Some(RideStatus::Cancelled)
    }

    pub fn manual_count(&self) -> i64 {
        self.manual_participants.len() as i64
    }

    /// Read the self-joined base count through the ordered fallback chain,
    /// clamped at zero. Returns the strategy that applied for log context.
    pub fn base_self_count(&self) -> (i64, CountSource) {
        let manual = self.manual_count();

        let (raw, source) = if let Some(count) = self.participants_count_self {
            (count, CountSource::SplitField)
        } else if let Some(total) = self.participants_count_total {
            (total - manual, CountSource::DerivedFromTotal)
        } else if let Some(total) = self.participants_count {
            (total - manual, CountSource::DerivedFromLegacy)
        } else {
            (0, CountSource::Default)
        };

        (raw.max(0), source)
    }

    /// Copy of this ride with both counter fields set.
    pub fn with_counters(&self, self_count: i64, total: i64) -> Ride {
        let mut ride = self.clone();
        ride.participants_count_self = Some(self_count);
        ride.participants_count_total = Some(total);
        ride
    }
}

/// Entry in the `rides/{id}/participants` sub-collection. Existence-only:
/// presence means the user has self-joined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
}
