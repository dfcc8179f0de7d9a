//! Home Office Vote Tally
//!
//! Pure decision logic for a home office voting period. Nothing here touches
//! storage or the clock; callers load the period's data, run the checks and
//! persist the outcome.
//!
//! # Closing a Period
//!
//! 1. [`check_closure`] verifies every eligible actor voted and nominated and
//!    that candidates exist. An operator may skip it with a forced close.
//! 2. [`tally_period`] draws one discarded voter from the injected random
//!    source and counts each candidate's remaining votes.
//! 3. [`award_days`] turns counted votes into home office days.
//!
//! # Award Rule
//!
//! - fewer than 2 counted votes → 0 days
//! - 2 counted votes → 1 day
//! - 3+ counted votes → 2 days, or 3 if a manager's vote is among them

mod award;
mod closure;
mod discard;
mod error;
mod role;
mod tally;

pub use award::{award_days, MAX_AWARD_DAYS, MIN_AWARD_VOTES, QUORUM_VOTES};
pub use closure::{check_closure, Actor, ClosureCheck, ClosureProblem, ClosureReport, ProblemKind};
pub use discard::{discard_pool, select_discarded_voter};
pub use error::RoleError;
pub use role::{Role, RolePolicy};
pub use tally::{tally_period, tally_with_discard, Ballot, CandidateTally, PeriodTally};
