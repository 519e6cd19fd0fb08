//! Business logic services.
//!
//! Each mutating operation opens exactly one write transaction, runs its reads
//! and writes through the `db` query helpers, and commits. Dropping the
//! transaction on an early `?` return rolls everything back.
//!
//! - `team_directory`: teams, membership and user flags
//! - `reviewer_selection`: random pick of eligible reviewers
//! - `pull_requests`: create, merge, reassign and read pull requests
//! - `deactivation`: team-wide deactivation cascade
//! - `review_stats`: assignment counts per user
//! - `http_api` / `http_server`: REST surface over the services

pub mod deactivation;
pub mod http_api;
pub mod http_server;
pub mod pull_requests;
pub mod review_stats;
pub mod reviewer_selection;
pub mod team_directory;

use crate::error::AppError;

/// Reject blank identifiers before they reach storage.
pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::pool::DbPool;
    use crate::models::NewTeamMember;
    use tempfile::tempdir;

    pub async fn setup_test_db() -> DbPool {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        // Keep the dir alive by leaking it (for test purposes)
        std::mem::forget(dir);

        crate::db::initialize(&db_path).await.unwrap()
    }

    pub fn members(ids: &[(&str, bool)]) -> Vec<NewTeamMember> {
        ids.iter()
            .map(|(id, active)| NewTeamMember::new(*id, id.to_uppercase(), *active))
            .collect()
    }
}
