//! Home office voting node
//!
//! Runs weekly peer-recognition periods: leaders and managers nominate team
//! members, vote for the nominated candidates, and closing a period turns the
//! votes into redeemable home office days.
//!
//! # Architecture
//!
//! - **Models**: Persisted records (Period, Nomination, Vote, Tally, grants)
//! - **Storage**: RocksDB-backed persistent storage with atomic transactions
//! - **Service**: Nomination registry, vote ledger and period closure
//! - **API**: HTTP endpoints under `/api/v1`
//! - **Admin Socket**: Unix socket for local operator commands (homeoffice-admin CLI)
//!
//! Counting rules live in the `homeoffice-tally` crate.
//!
//! # Example
//!
//! ```no_run
//! use homeoffice_node::{HomeOfficeNode, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = HomeOfficeNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod models;
pub mod storage;
pub mod service;
pub mod node;
pub mod api;
pub mod admin_socket;
pub mod error;

pub use models::{
    AuditAction, AuditEntry, Candidate, CandidateView, Category, ContributionType, GrantSource,
    GrantStanding, HomeOfficeGrant, Nomination, NominationView, Period, PeriodStatus, Tally,
    TallyView, User, UserSummary, Vote, VoteView,
};
pub use storage::Storage;
pub use service::{
    CloseRequest, ClosureSummary, GrantFilter, NominationRequest, OpenPeriodRequest, Service,
    VoteRequest,
};
pub use node::{HomeOfficeNode, NodeConfig, NodeState};
pub use error::{Error, Result};
