//! Persistent storage using RocksDB.
//!
//! Records are JSON values under prefixed keys. Keys that carry a uniqueness
//! rule are built from the unique tuple itself, so a second record for the same
//! tuple can only overwrite, never duplicate:
//!
//! ```text
//! user:{id}
//! period:{id}
//! nomination:{period}:{nominator}:{nominee}   nomination-id:{id} → key
//! candidate:{period}:{user}
//! vote:{period}:{voter}:{target}
//! tally:{period}:{user}
//! grant:{user}:{id}
//! audit:{millis}:{id}
//! ```
//!
//! All writes go through [`Storage::transaction`]: mutations are staged in a
//! `WriteBatch` and applied in one atomic write while the write gate is held.
//! Check-then-write sequences inside one transaction are therefore serialized
//! against every other writer in the process.

use crate::error::{Error, Result};
use crate::models::{
    AuditEntry, Candidate, HomeOfficeGrant, Nomination, Period, Tally, User, Vote,
};
use rocksdb::{Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Deref;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// Storage backend for node data.
pub struct Storage {
    db: DB,
    write_gate: Mutex<()>,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            write_gate: Mutex::new(()),
        })
    }

    /// Run `f` as one atomic write.
    ///
    /// Nothing staged by `f` is persisted if it returns an error.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T>,
    {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|_| Error::Storage("write gate poisoned".into()))?;

        let mut txn = Txn {
            storage: self,
            batch: WriteBatch::default(),
        };
        let value = f(&mut txn)?;
        self.db.write(txn.batch)?;
        Ok(value)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let prefix = prefix.as_bytes();
        let mut items = Vec::new();

        let iter = self.db.prefix_iterator(prefix);
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix) {
                items.push(serde_json::from_slice(&value)?);
            } else {
                break;
            }
        }

        Ok(items)
    }

    // --- Users ---

    /// Get a user by ID.
    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.get_json(&format!("user:{}", id))
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.scan("user:")
    }

    /// Store a user.
    pub fn put_user(&self, user: &User) -> Result<()> {
        self.transaction(|txn| txn.put_user(user))
    }

    // --- Periods ---

    /// Get a period by ID.
    pub fn get_period(&self, id: Uuid) -> Result<Option<Period>> {
        self.get_json(&format!("period:{}", id))
    }

    /// List all periods, newest first.
    pub fn list_periods(&self) -> Result<Vec<Period>> {
        let mut periods: Vec<Period> = self.scan("period:")?;
        periods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(periods)
    }

    // --- Nominations ---

    /// Get the nomination for a (period, nominator, nominee) tuple.
    pub fn get_nomination(
        &self,
        period_id: Uuid,
        nominator_id: Uuid,
        nominee_id: Uuid,
    ) -> Result<Option<Nomination>> {
        self.get_json(&nomination_key(period_id, nominator_id, nominee_id))
    }

    /// Get a nomination by ID.
    pub fn find_nomination(&self, id: Uuid) -> Result<Option<Nomination>> {
        match self.get_json::<String>(&format!("nomination-id:{}", id))? {
            Some(key) => self.get_json(&key),
            None => Ok(None),
        }
    }

    /// List a period's nominations.
    pub fn list_nominations(&self, period_id: Uuid) -> Result<Vec<Nomination>> {
        self.scan(&format!("nomination:{}:", period_id))
    }

    /// Count the nominations targeting a nominee in a period.
    pub fn count_nominations_for(&self, period_id: Uuid, nominee_id: Uuid) -> Result<usize> {
        Ok(self
            .list_nominations(period_id)?
            .iter()
            .filter(|n| n.nominee_id == nominee_id)
            .count())
    }

    // --- Candidates ---

    /// Get a candidate.
    pub fn get_candidate(&self, period_id: Uuid, user_id: Uuid) -> Result<Option<Candidate>> {
        self.get_json(&candidate_key(period_id, user_id))
    }

    /// List a period's candidates.
    pub fn list_candidates(&self, period_id: Uuid) -> Result<Vec<Candidate>> {
        self.scan(&format!("candidate:{}:", period_id))
    }

    // --- Votes ---

    /// Get a vote.
    pub fn get_vote(&self, period_id: Uuid, voter_id: Uuid, target_id: Uuid) -> Result<Option<Vote>> {
        self.get_json(&vote_key(period_id, voter_id, target_id))
    }

    /// List a period's votes.
    pub fn list_votes(&self, period_id: Uuid) -> Result<Vec<Vote>> {
        self.scan(&format!("vote:{}:", period_id))
    }

    // --- Tallies and grants ---

    /// List a period's tallies.
    pub fn list_tallies(&self, period_id: Uuid) -> Result<Vec<Tally>> {
        self.scan(&format!("tally:{}:", period_id))
    }

    /// List a user's grants.
    pub fn list_grants_for(&self, user_id: Uuid) -> Result<Vec<HomeOfficeGrant>> {
        self.scan(&format!("grant:{}:", user_id))
    }

    /// List every grant.
    pub fn list_grants(&self) -> Result<Vec<HomeOfficeGrant>> {
        self.scan("grant:")
    }

    // --- Audit ---

    /// The most recent audit entries, newest first.
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let entries: Vec<AuditEntry> = self.scan("audit:")?;
        Ok(entries.into_iter().rev().take(limit).collect())
    }
}

/// Staged writes of an open [`Storage::transaction`].
///
/// Reads go straight to the database and do not see staged writes.
pub struct Txn<'a> {
    storage: &'a Storage,
    batch: WriteBatch,
}

impl Deref for Txn<'_> {
    type Target = Storage;

    fn deref(&self) -> &Storage {
        self.storage
    }
}

impl Txn<'_> {
    fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_vec(value)?;
        self.batch.put(key.as_bytes(), value);
        Ok(())
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn put_user(&mut self, user: &User) -> Result<()> {
        self.put(&format!("user:{}", user.id), user)
    }

    pub fn put_period(&mut self, period: &Period) -> Result<()> {
        self.put(&format!("period:{}", period.id), period)
    }

    pub fn put_nomination(&mut self, nomination: &Nomination) -> Result<()> {
        let key = nomination_key(
            nomination.period_id,
            nomination.nominator_id,
            nomination.nominee_id,
        );
        self.put(&format!("nomination-id:{}", nomination.id), &key)?;
        self.put(&key, nomination)
    }

    pub fn delete_nomination(&mut self, nomination: &Nomination) {
        let key = nomination_key(
            nomination.period_id,
            nomination.nominator_id,
            nomination.nominee_id,
        );
        self.batch.delete(format!("nomination-id:{}", nomination.id).as_bytes());
        self.batch.delete(key.as_bytes());
    }

    pub fn put_candidate(&mut self, candidate: &Candidate) -> Result<()> {
        self.put(&candidate_key(candidate.period_id, candidate.user_id), candidate)
    }

    pub fn delete_candidate(&mut self, period_id: Uuid, user_id: Uuid) {
        self.batch.delete(candidate_key(period_id, user_id).as_bytes());
    }

    pub fn put_vote(&mut self, vote: &Vote) -> Result<()> {
        self.put(&vote_key(vote.period_id, vote.voter_id, vote.target_user_id), vote)
    }

    pub fn delete_vote(&mut self, period_id: Uuid, voter_id: Uuid, target_id: Uuid) {
        self.batch.delete(vote_key(period_id, voter_id, target_id).as_bytes());
    }

    pub fn put_tally(&mut self, tally: &Tally) -> Result<()> {
        self.put(&format!("tally:{}:{}", tally.period_id, tally.user_id), tally)
    }

    pub fn put_grant(&mut self, grant: &HomeOfficeGrant) -> Result<()> {
        self.put(&format!("grant:{}:{}", grant.user_id, grant.id), grant)
    }

    pub fn put_audit(&mut self, entry: &AuditEntry) -> Result<()> {
        let millis = entry.created_at.timestamp_millis().max(0);
        self.put(&format!("audit:{:020}:{}", millis, entry.id), entry)
    }
}

fn nomination_key(period_id: Uuid, nominator_id: Uuid, nominee_id: Uuid) -> String {
    format!("nomination:{}:{}:{}", period_id, nominator_id, nominee_id)
}

fn candidate_key(period_id: Uuid, user_id: Uuid) -> String {
    format!("candidate:{}:{}", period_id, user_id)
}

fn vote_key(period_id: Uuid, voter_id: Uuid, target_id: Uuid) -> String {
    format!("vote:{}:{}:{}", period_id, voter_id, target_id)
}
