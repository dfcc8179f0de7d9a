//! Vote ledger.

use super::Service;
use crate::error::{Error, Result};
use crate::models::{Vote, VoteView};
use serde::Deserialize;
use uuid::Uuid;

/// Maximum length of a vote comment, in characters.
pub const MAX_COMMENT_LEN: usize = 200;

/// A vote for a candidate. Casting twice updates the comment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteRequest {
    pub period_id: Uuid,
    pub voter_id: Uuid,
    pub target_user_id: Uuid,
    #[serde(default)]
    pub comment: Option<String>,
}

impl VoteRequest {
    /// Trimmed comment, `None` when blank.
    fn comment(&self) -> Result<Option<String>> {
        let Some(comment) = self.comment.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(Error::InvalidInput(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }
        Ok((!comment.is_empty()).then(|| comment.to_string()))
    }
}

impl Service {
    /// Cast a vote, or refresh the comment of an existing one.
    pub fn cast_vote(&self, request: VoteRequest) -> Result<Vote> {
        let comment = request.comment()?;

        let (vote, updated) = self.storage.transaction(|txn| {
            self.require_open_period(txn, request.period_id)?;

            txn.get_user(request.voter_id)?
                .filter(|u| u.active && self.policy.can_vote(u.role))
                .ok_or_else(|| Error::Forbidden(format!("user {} cannot vote", request.voter_id)))?;

            if txn
                .get_candidate(request.period_id, request.target_user_id)?
                .is_none()
            {
                return Err(Error::InvalidCandidate(format!(
                    "user {} is not a candidate in period {}",
                    request.target_user_id, request.period_id
                )));
            }

            let existing =
                txn.get_vote(request.period_id, request.voter_id, request.target_user_id)?;
            let updated = existing.is_some();
            let vote = match existing {
                Some(vote) => vote.recast(comment),
                None => Vote::new(
                    request.period_id,
                    request.voter_id,
                    request.target_user_id,
                    comment,
                ),
            };
            txn.put_vote(&vote)?;
            Ok((vote, updated))
        })?;

        tracing::info!(
            period = %vote.period_id,
            voter = %vote.voter_id,
            target = %vote.target_user_id,
            updated,
            "Vote recorded"
        );
        Ok(vote)
    }

    /// Remove a vote. Returns whether one existed.
    pub fn retract_vote(&self, period_id: Uuid, voter_id: Uuid, target_user_id: Uuid) -> Result<bool> {
        let removed = self.storage.transaction(|txn| {
            self.require_open_period(txn, period_id)?;
            let exists = txn.get_vote(period_id, voter_id, target_user_id)?.is_some();
            if exists {
                txn.delete_vote(period_id, voter_id, target_user_id);
            }
            Ok(exists)
        })?;

        if removed {
            tracing::info!(period = %period_id, voter = %voter_id, target = %target_user_id, "Vote retracted");
        }
        Ok(removed)
    }

    /// A period's votes, newest first, with voter and target details.
    pub fn list_votes(&self, period_id: Uuid) -> Result<Vec<VoteView>> {
        self.require_period(period_id)?;
        let users = self.user_index()?;

        let mut votes = self.storage.list_votes(period_id)?;
        votes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(votes
            .into_iter()
            .map(|vote| VoteView {
                voter: users.get(&vote.voter_id).map(|u| u.summary()),
                target_user: users.get(&vote.target_user_id).map(|u| u.summary()),
                vote,
            })
            .collect())
    }
}
