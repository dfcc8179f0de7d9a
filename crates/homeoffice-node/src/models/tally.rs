//! Persisted tally rows.

use super::user::UserSummary;
use chrono::{DateTime, Utc};
use homeoffice_tally::CandidateTally;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable counting outcome for one candidate in one closed period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub id: Uuid,
    pub period_id: Uuid,
    pub user_id: Uuid,
    pub raw_votes: u32,
    pub counted_votes: u32,
    pub discarded_voter_id: Option<Uuid>,
    pub manager_included: bool,
    pub result_days: u8,
    /// Diagnostic tag, `<period>-<user>`
    pub calculation_seed: String,
    pub created_at: DateTime<Utc>,
}

impl Tally {
    /// Build the row for one candidate's outcome.
    pub fn from_outcome(
        period_id: Uuid,
        outcome: &CandidateTally,
        discarded_voter_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            period_id,
            user_id: outcome.user_id,
            raw_votes: outcome.raw_votes as u32,
            counted_votes: outcome.counted_votes as u32,
            discarded_voter_id,
            manager_included: outcome.manager_included,
            result_days: outcome.result_days,
            calculation_seed: format!("{}-{}", period_id, outcome.user_id),
            created_at: at,
        }
    }
}

/// Tally joined with candidate and discarded-voter display data.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TallyView {
    #[serde(flatten)]
    pub tally: Tally,
    pub user: Option<UserSummary>,
    pub discarded_voter: Option<UserSummary>,
}
