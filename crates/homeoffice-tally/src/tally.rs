//! Per-candidate vote counting for a closing period.
//!
//! One discard draw is made per closure and applied to every candidate, then
//! each candidate's surviving votes are run through [`award_days`].

use crate::award::award_days;
use crate::discard::select_discarded_voter;
use crate::role::Role;
use rand::Rng;
use uuid::Uuid;

/// A single vote as seen by the tally: who cast it, under which role, for whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ballot {
    pub voter_id: Uuid,
    pub voter_role: Role,
    pub target_id: Uuid,
}

/// Counting outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTally {
    pub user_id: Uuid,
    /// Votes received before the discard
    pub raw_votes: usize,
    /// Votes left after the discarded voter's ballot is removed
    pub counted_votes: usize,
    /// A MANAGER is among the counted votes
    pub manager_included: bool,
    pub result_days: u8,
}

/// Counting outcome for a whole period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTally {
    /// Voter whose entire ballot was excluded, if any
    pub discarded_voter: Option<Uuid>,
    /// One entry per candidate, in candidate order
    pub candidates: Vec<CandidateTally>,
}

impl PeriodTally {
    /// Total home office days awarded across all candidates.
    pub fn total_days(&self) -> usize {
        self.candidates.iter().map(|c| c.result_days as usize).sum()
    }

    /// Look up a candidate's outcome.
    pub fn candidate(&self, user_id: Uuid) -> Option<&CandidateTally> {
        self.candidates.iter().find(|c| c.user_id == user_id)
    }
}

/// Draw the discarded voter from `rng` and count every candidate.
pub fn tally_period<R: Rng + ?Sized>(
    ballots: &[Ballot],
    candidates: &[Uuid],
    rng: &mut R,
) -> PeriodTally {
    let discarded = select_discarded_voter(ballots, rng);
    tally_with_discard(ballots, candidates, discarded)
}

/// Count every candidate with an already-chosen discarded voter.
pub fn tally_with_discard(
    ballots: &[Ballot],
    candidates: &[Uuid],
    discarded_voter: Option<Uuid>,
) -> PeriodTally {
    let candidates = candidates
        .iter()
        .map(|&user_id| count_candidate(ballots, user_id, discarded_voter))
        .collect();

    PeriodTally {
        discarded_voter,
        candidates,
    }
}

fn count_candidate(ballots: &[Ballot], user_id: Uuid, discarded: Option<Uuid>) -> CandidateTally {
    let received: Vec<&Ballot> = ballots.iter().filter(|b| b.target_id == user_id).collect();
    let counted: Vec<&Ballot> = received
        .iter()
        .copied()
        .filter(|b| Some(b.voter_id) != discarded)
        .collect();

    let counted_votes = counted.len();
    let manager_included = counted.iter().any(|b| b.voter_role == Role::Manager);

    CandidateTally {
        user_id,
        raw_votes: received.len(),
        counted_votes,
        manager_included,
        result_days: award_days(counted_votes, manager_included),
    }
}
