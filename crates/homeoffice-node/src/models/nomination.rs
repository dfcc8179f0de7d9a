//! Nominations and the candidate pool they derive.

use super::user::UserSummary;
use chrono::{DateTime, Utc};
use homeoffice_tally::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of contribution a nomination recognises.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Technical,
    Leadership,
    #[default]
    Collaboration,
    Innovation,
    Impact,
}

/// How the nominee contributed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionType {
    #[default]
    Delivery,
    Quality,
    Improvement,
    Support,
    Efficiency,
    Initiative,
}

/// A peer nomination of a member within a period.
///
/// Unique per (period, nominator, nominee).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nomination {
    pub id: Uuid,
    pub period_id: Uuid,
    pub nominator_id: Uuid,
    pub nominee_id: Uuid,
    pub reason: String,
    pub project_id: Option<Uuid>,
    pub category: Category,
    pub contribution_type: ContributionType,
    pub created_at: DateTime<Utc>,
}

/// A nomination joined with display data for both users.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NominationView {
    #[serde(flatten)]
    pub nomination: Nomination,
    pub nominator: Option<UserSummary>,
    pub nominee: Option<UserSummary>,
}

/// A member who can receive votes in a period.
///
/// Exists exactly while at least one nomination targets the member in that
/// period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period_id: Uuid,
    /// Role when first nominated
    pub role_at_period: Role,
}

impl Candidate {
    pub fn new(user_id: Uuid, period_id: Uuid, role_at_period: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            period_id,
            role_at_period,
        }
    }
}

/// A candidate's user data together with the nominations that put them there.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub role_at_period: Role,
    pub nominations: Vec<NominationView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_choice() {
        assert_eq!(Category::default(), Category::Collaboration);
        assert_eq!(ContributionType::default(), ContributionType::Delivery);
    }

    #[test]
    fn view_flattens_nomination() {
        let nomination = Nomination {
            id: Uuid::from_u128(1),
            period_id: Uuid::from_u128(2),
            nominator_id: Uuid::from_u128(3),
            nominee_id: Uuid::from_u128(4),
            reason: "Shipped the release".into(),
            project_id: None,
            category: Category::Technical,
            contribution_type: ContributionType::Quality,
            created_at: Utc::now(),
        };
        let view = NominationView {
            nomination,
            nominator: None,
            nominee: Some(UserSummary {
                id: Uuid::from_u128(4),
                name: "Member".into(),
                role: Role::Member,
            }),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["reason"], "Shipped the release");
        assert_eq!(json["category"], "TECHNICAL");
        assert_eq!(json["contributionType"], "QUALITY");
        assert_eq!(json["nominee"]["role"], "MEMBER");
    }
}
