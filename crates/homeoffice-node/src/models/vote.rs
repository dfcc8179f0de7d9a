//! Vote ledger entries.

use super::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A voter's vote for a candidate within a period.
///
/// Unique per (period, voter, target). Retracting deletes the row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub period_id: Uuid,
    pub voter_id: Uuid,
    pub target_user_id: Uuid,
    /// Always [`Vote::WEIGHT`]
    pub weight: u32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Every vote counts once.
    pub const WEIGHT: u32 = 1;

    pub fn new(period_id: Uuid, voter_id: Uuid, target_user_id: Uuid, comment: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            period_id,
            voter_id,
            target_user_id,
            weight: Self::WEIGHT,
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    /// A repeat vote only replaces the comment and refreshes `updated_at`.
    pub fn recast(&self, comment: Option<String>) -> Self {
        Self {
            comment,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// A vote joined with voter and target display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    #[serde(flatten)]
    pub vote: Vote,
    pub voter: Option<UserSummary>,
    pub target_user: Option<UserSummary>,
}
