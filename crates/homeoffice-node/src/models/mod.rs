//! Data models for the home office node.
//!
//! # Core Types
//!
//! - [`Period`] - A voting cycle and its OPEN → CLOSED lifecycle
//! - [`Nomination`] - A peer nomination; drives the [`Candidate`] pool
//! - [`Vote`] - One vote per (period, voter, target)
//! - [`Tally`] - Immutable counting outcome written at closure
//! - [`HomeOfficeGrant`] - A single redeemable day
//!
//! # Read Views
//!
//! [`NominationView`], [`CandidateView`], [`VoteView`], [`TallyView`] and
//! [`GrantStanding`] join rows with [`UserSummary`] display data.

mod audit;
mod grant;
mod nomination;
mod period;
mod tally;
mod user;
mod vote;

pub use audit::{AuditAction, AuditEntry};
pub use grant::{GrantSource, GrantStanding, HomeOfficeGrant};
pub use nomination::{Candidate, CandidateView, Category, ContributionType, Nomination, NominationView};
pub use period::{Period, PeriodStatus};
pub use tally::{Tally, TallyView};
pub use user::{User, UserSummary};
pub use vote::{Vote, VoteView};
