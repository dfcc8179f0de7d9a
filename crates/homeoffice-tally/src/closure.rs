//! Pre-closure completeness check.
//!
//! Before a period is tallied every eligible actor is expected to have voted
//! and nominated, and at least one candidate must exist. Gaps are reported as a
//! [`ClosureReport`] the operator can either resolve or override with a forced
//! close.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// An eligible voter as shown in a closure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Kind of gap found before closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    MissingVotes,
    MissingNominations,
    NoCandidates,
}

/// One gap, with the users responsible for it where that applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureProblem {
    #[serde(rename = "type")]
    pub kind: ProblemKind,
    pub message: String,
    pub users: Vec<Actor>,
}

/// Everything blocking an unforced close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureReport {
    #[serde(rename = "validationErrors")]
    pub problems: Vec<ClosureProblem>,
    pub summary: String,
    /// Always true: any report can be overridden by a forced close
    pub can_force: bool,
}

impl ClosureReport {
    /// Find the problem of a given kind.
    pub fn problem(&self, kind: ProblemKind) -> Option<&ClosureProblem> {
        self.problems.iter().find(|p| p.kind == kind)
    }
}

/// Result of the completeness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureCheck {
    /// Nothing is missing, tallying may proceed
    Ready,
    /// Gaps were found; the period must stay open unless forced
    ValidationRequired(ClosureReport),
}

impl ClosureCheck {
    pub fn is_ready(&self) -> bool {
        matches!(self, ClosureCheck::Ready)
    }
}

/// Check a period's activity against the eligible actors.
///
/// `eligible` must already be restricted to active users with a voter role.
/// Report users keep the order of `eligible`.
pub fn check_closure(
    eligible: &[Actor],
    voters: &HashSet<Uuid>,
    nominators: &HashSet<Uuid>,
    candidate_count: usize,
) -> ClosureCheck {
    let missing_voters: Vec<Actor> = eligible
        .iter()
        .filter(|a| !voters.contains(&a.id))
        .cloned()
        .collect();
    let missing_nominators: Vec<Actor> = eligible
        .iter()
        .filter(|a| !nominators.contains(&a.id))
        .cloned()
        .collect();

    let summary = format!(
        "Missing: {} votes, {} nominations",
        missing_voters.len(),
        missing_nominators.len()
    );

    let mut problems = Vec::new();

    if !missing_voters.is_empty() {
        problems.push(ClosureProblem {
            kind: ProblemKind::MissingVotes,
            message: format!("{} user(s) have not voted", missing_voters.len()),
            users: missing_voters,
        });
    }

    if !missing_nominators.is_empty() {
        problems.push(ClosureProblem {
            kind: ProblemKind::MissingNominations,
            message: format!(
                "{} user(s) have not made any nomination",
                missing_nominators.len()
            ),
            users: missing_nominators,
        });
    }

    if candidate_count == 0 {
        problems.push(ClosureProblem {
            kind: ProblemKind::NoCandidates,
            message: "There are no candidates in this period".to_string(),
            users: Vec::new(),
        });
    }

    if problems.is_empty() {
        ClosureCheck::Ready
    } else {
        ClosureCheck::ValidationRequired(ClosureReport {
            problems,
            summary,
            can_force: true,
        })
    }
}
