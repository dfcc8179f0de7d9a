//! Whole-ballot discard selection.
//!
//! At closure one voter is drawn uniformly at random from the discard pool and
//! every vote that voter cast in the period is dropped from every candidate's
//! counted tally. The pool holds each distinct MANAGER or LEADER* voter who cast
//! at least one vote:
//!
//! ```text
//! pool      = sort(distinct { b.voter | b ∈ ballots, discardable(b.role) })
//! discarded = pool[uniform(0, |pool|)]   or none if the pool is empty
//! ```
//!
//! The pool is sorted before the draw so a seeded source always picks the same
//! voter for the same ballots, whatever order they were loaded in.

use crate::tally::Ballot;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Distinct voters whose ballot may be discarded, in ascending id order.
pub fn discard_pool(ballots: &[Ballot]) -> Vec<Uuid> {
    ballots
        .iter()
        .filter(|b| b.voter_role.is_discardable())
        .map(|b| b.voter_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Draw the voter whose whole ballot is excluded from counting.
pub fn select_discarded_voter<R: Rng + ?Sized>(ballots: &[Ballot], rng: &mut R) -> Option<Uuid> {
    discard_pool(ballots).choose(rng).copied()
}
