//! Period opening and lookup.

use super::Service;
use crate::error::{Error, Result};
use crate::models::{AuditAction, AuditEntry, Period};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// Maximum length of a period's week label.
pub const MAX_WEEK_LABEL_LEN: usize = 50;

/// Number of entries returned by the audit view.
pub const AUDIT_PAGE: usize = 100;

/// A request to open a new voting period.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OpenPeriodRequest {
    pub week_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl OpenPeriodRequest {
    fn validate(&self) -> Result<()> {
        let label = self.week_label.trim();
        if label.is_empty() || label.chars().count() > MAX_WEEK_LABEL_LEN {
            return Err(Error::InvalidInput(format!(
                "weekLabel must be 1 to {} characters",
                MAX_WEEK_LABEL_LEN
            )));
        }
        if self.start_date > self.end_date {
            return Err(Error::InvalidInput(
                "startDate must not be after endDate".into(),
            ));
        }
        Ok(())
    }
}

impl Service {
    /// Create an OPEN period.
    pub fn open_period(&self, request: OpenPeriodRequest, actor_id: Option<Uuid>) -> Result<Period> {
        request.validate()?;

        let period = Period::new(
            request.week_label.trim().to_string(),
            request.start_date,
            request.end_date,
        );
        self.storage.transaction(|txn| {
            txn.put_period(&period)?;
            txn.put_audit(&AuditEntry::new(
                AuditAction::PeriodOpened,
                actor_id,
                period.id,
                serde_json::json!({ "weekLabel": period.week_label }),
                period.created_at,
            ))
        })?;

        tracing::info!(period = %period.id, label = %period.week_label, "Period opened");
        Ok(period)
    }

    /// All periods, newest first.
    pub fn list_periods(&self) -> Result<Vec<Period>> {
        self.storage.list_periods()
    }

    /// The newest period still accepting ballots.
    pub fn current_period(&self) -> Result<Option<Period>> {
        Ok(self
            .storage
            .list_periods()?
            .into_iter()
            .find(|p| p.status.accepts_ballots()))
    }

    /// The latest audit entries, newest first.
    pub fn recent_audit(&self) -> Result<Vec<AuditEntry>> {
        self.storage.recent_audit(AUDIT_PAGE)
    }
}
