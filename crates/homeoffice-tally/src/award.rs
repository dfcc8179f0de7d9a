//! Day-award rule for counted votes.
//!
//! The number of home office days a candidate earns depends only on how many
//! votes survive the discard and whether a manager is among them:
//! - fewer than 2 counted votes → 0 days
//! - exactly 2 → 1 day
//! - 3 or more without a manager → 2 days
//! - 3 or more with a manager → 3 days

/// Counted votes needed for any award.
pub const MIN_AWARD_VOTES: usize = 2;

/// Counted votes needed for the full award tiers.
pub const QUORUM_VOTES: usize = 3;

/// Largest award a single period can produce.
pub const MAX_AWARD_DAYS: u8 = 3;

/// Days awarded for a given number of counted votes.
///
/// # Examples
///
/// ```
/// use homeoffice_tally::award_days;
///
/// assert_eq!(award_days(1, true), 0);
/// assert_eq!(award_days(2, true), 1);
/// assert_eq!(award_days(3, false), 2);
/// assert_eq!(award_days(3, true), 3);
/// ```
pub const fn award_days(counted_votes: usize, manager_included: bool) -> u8 {
    if counted_votes < MIN_AWARD_VOTES {
        0
    } else if counted_votes < QUORUM_VOTES {
        1
    } else if manager_included {
        MAX_AWARD_DAYS
    } else {
        2
    }
}
