//! Nomination registry and the candidate pool it maintains.

use super::Service;
use crate::error::{Error, Result};
use crate::models::{Candidate, CandidateView, Category, ContributionType, Nomination, NominationView};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum length of a nomination reason, in characters.
pub const MAX_REASON_LEN: usize = 500;

/// A request to nominate a member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NominationRequest {
    pub period_id: Uuid,
    pub nominator_id: Uuid,
    pub nominee_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub contribution_type: Option<ContributionType>,
}

impl NominationRequest {
    fn validate(&self) -> Result<()> {
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(Error::InvalidInput("reason must not be empty".into()));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(Error::InvalidInput(format!(
                "reason must be at most {} characters",
                MAX_REASON_LEN
            )));
        }
        Ok(())
    }
}

impl Service {
    /// Record a nomination and make the nominee a candidate of the period.
    pub fn nominate(&self, request: NominationRequest) -> Result<NominationView> {
        request.validate()?;

        let view = self.storage.transaction(|txn| {
            self.require_open_period(txn, request.period_id)?;

            let nominator = txn
                .get_user(request.nominator_id)?
                .filter(|u| u.active && self.policy.can_vote(u.role))
                .ok_or_else(|| {
                    Error::Forbidden(format!("user {} cannot nominate", request.nominator_id))
                })?;

            let nominee = txn
                .get_user(request.nominee_id)?
                .filter(|u| self.policy.can_be_nominated(u.role, u.active))
                .ok_or_else(|| {
                    Error::InvalidNominee(format!(
                        "user {} is not an active member",
                        request.nominee_id
                    ))
                })?;

            if txn
                .get_nomination(request.period_id, nominator.id, nominee.id)?
                .is_some()
            {
                return Err(Error::DuplicateNomination);
            }

            let nomination = Nomination {
                id: Uuid::new_v4(),
                period_id: request.period_id,
                nominator_id: nominator.id,
                nominee_id: nominee.id,
                reason: request.reason.trim().to_string(),
                project_id: request.project_id,
                category: request.category.unwrap_or_default(),
                contribution_type: request.contribution_type.unwrap_or_default(),
                created_at: Utc::now(),
            };
            txn.put_nomination(&nomination)?;

            if txn.get_candidate(request.period_id, nominee.id)?.is_none() {
                txn.put_candidate(&Candidate::new(nominee.id, request.period_id, nominee.role))?;
            }

            Ok(NominationView {
                nomination,
                nominator: Some(nominator.summary()),
                nominee: Some(nominee.summary()),
            })
        })?;

        tracing::info!(
            period = %view.nomination.period_id,
            nominator = %view.nomination.nominator_id,
            nominee = %view.nomination.nominee_id,
            "Nomination recorded"
        );
        Ok(view)
    }

    /// Delete a nomination, dropping the candidate when it was the last one.
    pub fn withdraw(&self, nomination_id: Uuid) -> Result<Nomination> {
        let (nomination, candidate_removed) = self.storage.transaction(|txn| {
            let nomination = txn
                .find_nomination(nomination_id)?
                .ok_or_else(|| Error::NotFound(format!("nomination {}", nomination_id)))?;
            self.require_open_period(txn, nomination.period_id)?;

            // Reads do not see the staged delete, so the count still includes it.
            let remaining = txn
                .count_nominations_for(nomination.period_id, nomination.nominee_id)?
                .saturating_sub(1);

            txn.delete_nomination(&nomination);
            if remaining == 0 {
                txn.delete_candidate(nomination.period_id, nomination.nominee_id);
            }
            Ok((nomination, remaining == 0))
        })?;

        tracing::info!(
            nomination = %nomination.id,
            period = %nomination.period_id,
            nominee = %nomination.nominee_id,
            candidate_removed,
            "Nomination withdrawn"
        );
        Ok(nomination)
    }

    /// A period's nominations, newest first, with display data for both users.
    pub fn list_nominations(&self, period_id: Uuid) -> Result<Vec<NominationView>> {
        self.require_period(period_id)?;
        let users = self.user_index()?;

        let mut nominations = self.storage.list_nominations(period_id)?;
        nominations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(nominations
            .into_iter()
            .map(|nomination| NominationView {
                nominator: users.get(&nomination.nominator_id).map(|u| u.summary()),
                nominee: users.get(&nomination.nominee_id).map(|u| u.summary()),
                nomination,
            })
            .collect())
    }

    /// A period's candidates who are still active, each with their nominations.
    pub fn list_candidates(&self, period_id: Uuid) -> Result<Vec<CandidateView>> {
        let nominations = self.list_nominations(period_id)?;
        let users = self.user_index()?;

        let mut views: Vec<CandidateView> = self
            .storage
            .list_candidates(period_id)?
            .into_iter()
            .filter_map(|candidate| {
                let user = users.get(&candidate.user_id).filter(|u| u.active)?;
                Some(CandidateView {
                    user: user.summary(),
                    role_at_period: candidate.role_at_period,
                    nominations: nominations
                        .iter()
                        .filter(|n| n.nomination.nominee_id == candidate.user_id)
                        .cloned()
                        .collect(),
                })
            })
            .collect();
        views.sort_by(|a, b| a.user.name.cmp(&b.user.name));
        Ok(views)
    }

    /// Directory users keyed by id.
    pub(super) fn user_index(&self) -> Result<HashMap<Uuid, crate::models::User>> {
        Ok(self
            .storage
            .list_users()?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }
}
