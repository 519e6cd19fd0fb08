//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database and the
//! snapshots the engine hands back to callers.
//!
//! Row-shaped models derive FromRow for SQLx queries.

pub mod pull_request;
pub mod review_stat;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestRow, PullRequestStatus, Reassignment, MAX_REVIEWERS};
pub use review_stat::ReviewStat;
pub use team::{DeactivationSummary, NewTeamMember, Team};
pub use user::{User, UserWithTeam};
