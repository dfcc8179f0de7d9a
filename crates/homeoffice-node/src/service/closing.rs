//! Period closure: validation gate, tally and grant issuance.
//!
//! A closure is one storage transaction. Tallies, grants, the audit entry and
//! the status flip are staged together and written at once, so a failure at
//! any point leaves the period OPEN with nothing persisted.

use super::{lock, Service};
use crate::error::{Error, Result};
use crate::models::{AuditAction, AuditEntry, HomeOfficeGrant, Period, Tally, TallyView};
use crate::storage::Storage;
use chrono::Utc;
use homeoffice_tally::{check_closure, tally_period, Actor, Ballot, ClosureCheck};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// Options for closing a period.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CloseRequest {
    /// Skip the missing-activity checks
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// What a successful closure wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureSummary {
    pub period: Period,
    pub discarded_voter_id: Option<Uuid>,
    pub tallies: Vec<Tally>,
    pub grants_issued: usize,
    pub forced: bool,
}

/// Marks a period as closing until dropped.
struct ClosureClaim<'a> {
    closing: &'a Mutex<HashSet<Uuid>>,
    period_id: Uuid,
}

impl Drop for ClosureClaim<'_> {
    fn drop(&mut self) {
        lock(self.closing).remove(&self.period_id);
    }
}

impl Service {
    /// Close a period, awarding home office days from its votes.
    ///
    /// Without `force`, missing votes, missing nominations or an empty
    /// candidate pool fail with [`Error::ValidationRequired`] and the period
    /// stays open.
    pub fn close_period(&self, period_id: Uuid, request: CloseRequest) -> Result<ClosureSummary> {
        let _claim = self.claim_closure(period_id)?;

        let summary = self.storage.transaction(|txn| {
            let period = txn
                .get_period(period_id)?
                .ok_or_else(|| Error::NotFound(format!("period {}", period_id)))?;
            if period.is_closed() {
                return Err(Error::InvalidState(format!(
                    "period {} is already closed",
                    period_id
                )));
            }

            if request.force {
                tracing::warn!(
                    period = %period_id,
                    actor = ?request.actor_id,
                    "Closing period with validation skipped"
                );
            } else if let ClosureCheck::ValidationRequired(report) =
                self.closure_check(txn, period_id)?
            {
                tracing::info!(period = %period_id, summary = %report.summary, "Closure blocked");
                return Err(Error::ValidationRequired(report));
            }

            let ballots = load_ballots(txn, period_id)?;
            let candidates: Vec<Uuid> = txn
                .list_candidates(period_id)?
                .into_iter()
                .map(|c| c.user_id)
                .collect();

            let outcome = {
                let mut rng = lock(&self.rng);
                tally_period(&ballots, &candidates, &mut *rng)
            };

            let now = Utc::now();
            let mut tallies = Vec::with_capacity(outcome.candidates.len());
            let mut grants_issued = 0;
            for candidate in &outcome.candidates {
                tracing::debug!(
                    period = %period_id,
                    user = %candidate.user_id,
                    raw = candidate.raw_votes,
                    counted = candidate.counted_votes,
                    manager = candidate.manager_included,
                    days = candidate.result_days,
                    "Candidate tallied"
                );
                let tally = Tally::from_outcome(period_id, candidate, outcome.discarded_voter, now);
                txn.put_tally(&tally)?;
                for _ in 0..candidate.result_days {
                    txn.put_grant(&HomeOfficeGrant::tally_day(
                        candidate.user_id,
                        period_id,
                        now,
                        self.grant_ttl,
                    ))?;
                    grants_issued += 1;
                }
                tallies.push(tally);
            }

            let action = if request.force {
                AuditAction::PeriodForceClosed
            } else {
                AuditAction::PeriodClosed
            };
            txn.put_audit(&AuditEntry::new(
                action,
                request.actor_id,
                period_id,
                serde_json::json!({
                    "discardedVoterId": outcome.discarded_voter,
                    "candidates": tallies.len(),
                    "grantsIssued": grants_issued,
                }),
                now,
            ))?;

            let closed = period.closed(now);
            txn.put_period(&closed)?;

            Ok(ClosureSummary {
                period: closed,
                discarded_voter_id: outcome.discarded_voter,
                tallies,
                grants_issued,
                forced: request.force,
            })
        })?;

        tracing::info!(
            period = %period_id,
            candidates = summary.tallies.len(),
            grants = summary.grants_issued,
            discarded = ?summary.discarded_voter_id,
            forced = summary.forced,
            "Period closed"
        );
        Ok(summary)
    }

    /// Run the closure validation without closing.
    pub fn preview_closure(&self, period_id: Uuid) -> Result<ClosureCheck> {
        self.require_period(period_id)?;
        self.closure_check(&self.storage, period_id)
    }

    /// A closed period's tallies, most days first.
    pub fn results(&self, period_id: Uuid) -> Result<Vec<TallyView>> {
        self.require_period(period_id)?;
        let users = self.user_index()?;

        let mut views: Vec<TallyView> = self
            .storage
            .list_tallies(period_id)?
            .into_iter()
            .map(|tally| TallyView {
                user: users.get(&tally.user_id).map(|u| u.summary()),
                discarded_voter: tally
                    .discarded_voter_id
                    .and_then(|id| users.get(&id))
                    .map(|u| u.summary()),
                tally,
            })
            .collect();
        views.sort_by(|a, b| {
            b.tally
                .result_days
                .cmp(&a.tally.result_days)
                .then(b.tally.counted_votes.cmp(&a.tally.counted_votes))
        });
        Ok(views)
    }

    fn claim_closure(&self, period_id: Uuid) -> Result<ClosureClaim<'_>> {
        if !lock(&self.closing).insert(period_id) {
            return Err(Error::InvalidState(format!(
                "period {} is already being closed",
                period_id
            )));
        }
        Ok(ClosureClaim {
            closing: &self.closing,
            period_id,
        })
    }

    fn closure_check(&self, storage: &Storage, period_id: Uuid) -> Result<ClosureCheck> {
        let mut eligible: Vec<Actor> = storage
            .list_users()?
            .iter()
            .filter(|u| u.active && self.policy.can_vote(u.role))
            .map(|u| u.actor())
            .collect();
        eligible.sort_by(|a, b| a.name.cmp(&b.name));

        let voters: HashSet<Uuid> = storage
            .list_votes(period_id)?
            .iter()
            .map(|v| v.voter_id)
            .collect();
        let nominators: HashSet<Uuid> = storage
            .list_nominations(period_id)?
            .iter()
            .map(|n| n.nominator_id)
            .collect();
        let candidate_count = storage.list_candidates(period_id)?.len();

        Ok(check_closure(&eligible, &voters, &nominators, candidate_count))
    }
}

/// The period's votes paired with each voter's current role.
fn load_ballots(storage: &Storage, period_id: Uuid) -> Result<Vec<Ballot>> {
    let roles: HashMap<Uuid, _> = storage
        .list_users()?
        .into_iter()
        .map(|u| (u.id, u.role))
        .collect();

    storage
        .list_votes(period_id)?
        .into_iter()
        .map(|vote| -> Result<Ballot> {
            let voter_role = roles.get(&vote.voter_id).copied().ok_or_else(|| {
                Error::Storage(format!("vote by unknown user {}", vote.voter_id))
            })?;
            Ok(Ballot {
                voter_id: vote.voter_id,
                voter_role,
                target_id: vote.target_user_id,
            })
        })
        .collect()
}
