//! Voting period model and its lifecycle status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a period.
///
/// A period starts OPEN and becomes CLOSED exactly once, when it is tallied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Open,
    Voting,
    Closed,
}

impl PeriodStatus {
    /// Nominations and votes may still change.
    pub fn accepts_ballots(self) -> bool {
        !matches!(self, PeriodStatus::Closed)
    }
}

/// A bounded voting cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: Uuid,

    /// Human-readable label, e.g. "2024-W12"
    pub week_label: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Period {
    /// Create an OPEN period.
    pub fn new(week_label: String, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            week_label,
            start_date,
            end_date,
            status: PeriodStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == PeriodStatus::Closed
    }

    /// The closed copy of this period, stamped at `at`.
    pub fn closed(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: PeriodStatus::Closed,
            closed_at: Some(at),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_period_is_open() {
        let period = Period::new("2024-W12".into(), date(2024, 3, 18), date(2024, 3, 22));
        assert_eq!(period.status, PeriodStatus::Open);
        assert!(period.status.accepts_ballots());
        assert!(period.closed_at.is_none());
    }

    #[test]
    fn closing_stamps_time() {
        let period = Period::new("2024-W12".into(), date(2024, 3, 18), date(2024, 3, 22));
        let now = Utc::now();
        let closed = period.closed(now);
        assert!(closed.is_closed());
        assert!(!closed.status.accepts_ballots());
        assert_eq!(closed.closed_at, Some(now));
        assert_eq!(closed.id, period.id);
    }

    #[test]
    fn wire_format() {
        let period = Period::new("W1".into(), date(2024, 1, 1), date(2024, 1, 5));
        let json = serde_json::to_value(&period).unwrap();
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["weekLabel"], "W1");
        assert_eq!(json["startDate"], "2024-01-01");
    }
}
