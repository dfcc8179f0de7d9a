//! Voting service: the operations behind the HTTP API and admin socket.
//!
//! - **Nominations**: nominate / withdraw, maintaining the candidate pool
//! - **Votes**: cast-or-update / retract
//! - **Periods**: open, list, close (validation + tally + grants)
//! - **Grants**: per-user grant lists and the grant leaderboard
//!
//! Every mutation runs inside one [`Storage::transaction`], so each call
//! either applies completely or not at all.

mod closing;
mod grants;
mod nominations;
mod periods;
mod votes;

pub use closing::{CloseRequest, ClosureSummary};
pub use grants::GrantFilter;
pub use nominations::NominationRequest;
pub use periods::OpenPeriodRequest;
pub use votes::VoteRequest;

use crate::error::{Error, Result};
use crate::models::{Period, User};
use crate::storage::Storage;
use chrono::Duration;
use homeoffice_tally::RolePolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Days a tally grant stays redeemable unless configured otherwise.
pub const DEFAULT_GRANT_TTL_DAYS: i64 = 60;

/// The voting service shared by all request handlers.
pub struct Service {
    storage: Arc<Storage>,
    policy: RolePolicy,
    grant_ttl: Duration,
    /// Source for the discard draw
    rng: Mutex<StdRng>,
    /// Periods with a closure in flight
    closing: Mutex<HashSet<Uuid>>,
}

impl Service {
    /// Create a service drawing discards from OS entropy.
    pub fn new(storage: Arc<Storage>, policy: RolePolicy) -> Self {
        Self {
            storage,
            policy,
            grant_ttl: Duration::days(DEFAULT_GRANT_TTL_DAYS),
            rng: Mutex::new(StdRng::from_entropy()),
            closing: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the discard random source (seeded sources make closures reproducible).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Set how long tally grants stay redeemable.
    pub fn with_grant_ttl(mut self, ttl: Duration) -> Self {
        self.grant_ttl = ttl;
        self
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Add or replace a directory user.
    pub fn put_user(&self, user: &User) -> Result<()> {
        self.storage.put_user(user)?;
        tracing::info!(user = %user.id, role = %user.role, active = user.active, "Stored user");
        Ok(())
    }

    /// List directory users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.storage.list_users()
    }

    /// Fetch a period or fail with `NotFound`.
    pub fn get_period(&self, period_id: Uuid) -> Result<Period> {
        self.require_period(period_id)
    }

    fn require_period(&self, period_id: Uuid) -> Result<Period> {
        self.storage
            .get_period(period_id)?
            .ok_or_else(|| Error::NotFound(format!("period {}", period_id)))
    }

    /// Fetch a period that still accepts nominations and votes.
    fn require_open_period(&self, storage: &Storage, period_id: Uuid) -> Result<Period> {
        let period = storage
            .get_period(period_id)?
            .ok_or_else(|| Error::NotFound(format!("period {}", period_id)))?;
        if !period.status.accepts_ballots() {
            return Err(Error::PeriodClosed(period_id));
        }
        Ok(period)
    }
}

/// Lock a mutex whose data stays valid even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
