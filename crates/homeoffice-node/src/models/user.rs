//! Directory users, as provided by the external user/role directory.

use homeoffice_tally::{Actor, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A team member known to the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl User {
    /// Create an active user with a fresh id.
    pub fn new(name: String, email: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            role,
            active: true,
        }
    }

    /// Display data used in nominations, results and closure reports.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// This user as an actor in a closure report.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Minimal user data joined into read views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}
