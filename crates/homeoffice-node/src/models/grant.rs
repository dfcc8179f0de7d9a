//! Home office day grants.

use super::user::UserSummary;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a grant came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantSource {
    /// Period tally
    Normal,
    Points,
    Special,
    Bonus,
}

/// A single redeemable home office day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeOfficeGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period_id: Option<Uuid>,
    /// Always 1 for tally grants
    pub days: u32,
    pub source: GrantSource,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl HomeOfficeGrant {
    /// One tally-awarded day, expiring `ttl` after `issued_at`.
    pub fn tally_day(user_id: Uuid, period_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            period_id: Some(period_id),
            days: 1,
            source: GrantSource::Normal,
            created_at: issued_at,
            expires_at: Some(issued_at + ttl),
            redeemed: false,
            redeemed_at: None,
            notes: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Not yet redeemed and not expired.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.redeemed && !self.is_expired(now)
    }
}

/// Per-user grant totals for the leaderboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrantStanding {
    pub user: UserSummary,
    pub total_days: u32,
    pub normal_days: u32,
    /// Days from any non-tally source
    pub bonus_days: u32,
    pub grants_count: u32,
}
