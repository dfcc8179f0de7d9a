//! Error types for homeoffice-tally.

use thiserror::Error;

/// Errors raised while parsing or configuring roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// The role name is not one of the known roles.
    #[error("unknown role: {0}")]
    Unknown(String),

    /// A role policy was configured without any voter role.
    #[error("role policy must allow at least one voter role")]
    EmptyPolicy,
}
