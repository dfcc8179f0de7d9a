//! Roles and the eligibility policy built on top of them.
//!
//! Two role sets drive the whole voting cycle:
//!
//! - **voters**: may nominate and vote. Configurable, defaults to MANAGER and
//!   every LEADER flavour.
//! - **nominees**: may be nominated, which is always an active MEMBER.
//!
//! The discard pool used at closure is fixed to MANAGER and LEADER* voters and
//! does not follow the configurable voter set.

use crate::error::RoleError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A user's role in the team directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Leader,
    LeaderDev,
    LeaderPo,
    LeaderInfra,
    Member,
}

impl Role {
    /// Every known role, in declaration order.
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Manager,
        Role::Leader,
        Role::LeaderDev,
        Role::LeaderPo,
        Role::LeaderInfra,
        Role::Member,
    ];

    /// Wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Leader => "LEADER",
            Role::LeaderDev => "LEADER_DEV",
            Role::LeaderPo => "LEADER_PO",
            Role::LeaderInfra => "LEADER_INFRA",
            Role::Member => "MEMBER",
        }
    }

    /// True for LEADER and its specialisations.
    pub const fn is_leader(self) -> bool {
        matches!(
            self,
            Role::Leader | Role::LeaderDev | Role::LeaderPo | Role::LeaderInfra
        )
    }

    /// True if a ballot cast under this role can be drawn for discard.
    pub const fn is_discardable(self) -> bool {
        matches!(self, Role::Manager) || self.is_leader()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RoleError::Unknown(wanted.to_string()))
    }
}

/// Which roles may take part in a voting period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    voter_roles: BTreeSet<Role>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            voter_roles: Role::ALL
                .into_iter()
                .filter(|role| role.is_discardable())
                .collect(),
        }
    }
}

impl RolePolicy {
    /// Build a policy from an explicit voter role set.
    pub fn new(voter_roles: impl IntoIterator<Item = Role>) -> Result<Self, RoleError> {
        let voter_roles: BTreeSet<Role> = voter_roles.into_iter().collect();
        if voter_roles.is_empty() {
            return Err(RoleError::EmptyPolicy);
        }
        Ok(Self { voter_roles })
    }

    /// Parse a comma-separated role list such as `MANAGER,LEADER_DEV`.
    pub fn parse(list: &str) -> Result<Self, RoleError> {
        let roles = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(roles)
    }

    /// May this role nominate and vote.
    pub fn can_vote(&self, role: Role) -> bool {
        self.voter_roles.contains(&role)
    }

    /// May a user with this role and activity flag be nominated.
    pub fn can_be_nominated(&self, role: Role, active: bool) -> bool {
        active && role == Role::Member
    }

    /// The configured voter roles.
    pub fn voter_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.voter_roles.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("LEADER_DEV".parse::<Role>().unwrap(), Role::LeaderDev);
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(
            "CEO".parse::<Role>(),
            Err(RoleError::Unknown("CEO".to_string()))
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::LeaderInfra).unwrap();
        assert_eq!(json, "\"LEADER_INFRA\"");
        for role in Role::ALL {
            let encoded = serde_json::to_string(&role).unwrap();
            assert_eq!(encoded.trim_matches('"'), role.as_str());
        }
        assert!(serde_json::from_str::<Role>("\"VIEWER\"").is_err());
    }

    #[test]
    fn default_policy_is_managers_and_leaders() {
        let policy = RolePolicy::default();
        assert!(policy.can_vote(Role::Manager));
        assert!(policy.can_vote(Role::Leader));
        assert!(policy.can_vote(Role::LeaderPo));
        assert!(!policy.can_vote(Role::Admin));
        assert!(!policy.can_vote(Role::Member));
    }

    #[test]
    fn policy_can_include_admin() {
        let policy = RolePolicy::parse("ADMIN, MANAGER").unwrap();
        assert!(policy.can_vote(Role::Admin));
        assert!(!policy.can_vote(Role::LeaderDev));
    }

    #[test]
    fn empty_policy_rejected() {
        assert_eq!(RolePolicy::parse(" , "), Err(RoleError::EmptyPolicy));
    }

    #[test]
    fn only_active_members_are_nominees() {
        let policy = RolePolicy::default();
        assert!(policy.can_be_nominated(Role::Member, true));
        assert!(!policy.can_be_nominated(Role::Member, false));
        assert!(!policy.can_be_nominated(Role::LeaderDev, true));
    }
}
