//! Grant queries.

use super::Service;
use crate::error::Result;
use crate::models::{GrantSource, GrantStanding, HomeOfficeGrant};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Which of a user's grants to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantFilter {
    #[default]
    All,
    /// Not redeemed and not expired, soonest expiry first
    Available,
    /// Redeemed, most recent first
    Redeemed,
}

impl GrantFilter {
    /// Map the `available` query flag.
    pub fn from_available(available: Option<bool>) -> Self {
        match available {
            None => GrantFilter::All,
            Some(true) => GrantFilter::Available,
            Some(false) => GrantFilter::Redeemed,
        }
    }
}

impl Service {
    /// A user's grants.
    pub fn grants_for(&self, user_id: Uuid, filter: GrantFilter) -> Result<Vec<HomeOfficeGrant>> {
        let now = Utc::now();
        let mut grants = self.storage.list_grants_for(user_id)?;

        match filter {
            GrantFilter::All => {
                grants.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
            }
            GrantFilter::Available => {
                grants.retain(|g| g.is_available(now));
                grants.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
            }
            GrantFilter::Redeemed => {
                grants.retain(|g| g.redeemed);
                grants.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
            }
        }
        Ok(grants)
    }

    /// Per-user grant totals, most days first.
    pub fn grant_leaderboard(&self) -> Result<Vec<GrantStanding>> {
        let users = self.user_index()?;
        let mut standings: HashMap<Uuid, GrantStanding> = HashMap::new();

        for grant in self.storage.list_grants()? {
            let Some(user) = users.get(&grant.user_id) else {
                continue;
            };
            let standing = standings.entry(grant.user_id).or_insert_with(|| GrantStanding {
                user: user.summary(),
                total_days: 0,
                normal_days: 0,
                bonus_days: 0,
                grants_count: 0,
            });
            standing.total_days += grant.days;
            standing.grants_count += 1;
            if grant.source == GrantSource::Normal {
                standing.normal_days += grant.days;
            } else {
                standing.bonus_days += grant.days;
            }
        }

        let mut standings: Vec<GrantStanding> = standings.into_values().collect();
        standings.sort_by(|a, b| {
            b.total_days
                .cmp(&a.total_days)
                .then_with(|| a.user.name.cmp(&b.user.name))
        });
        Ok(standings)
    }
}
