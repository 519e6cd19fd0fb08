//! Team deactivation cascade.

use super::require_non_empty;
use crate::db::pool::DbPool;
use crate::db::{self, assignments, teams, users};
use crate::error::AppError;
use crate::models::DeactivationSummary;

/// Deactivate every member of a team and retract their open review assignments.
///
/// Assignments on merged pull requests are kept. No replacement reviewers are
/// picked; callers reassign explicitly if they want the slots filled. Running
/// it again on an already inactive team reports a count of zero.
pub async fn deactivate_team_members(
    pool: &DbPool,
    team_name: &str,
) -> Result<DeactivationSummary, AppError> {
    require_non_empty(team_name, "team_name")?;
    let mut tx = db::begin_write(pool).await?;

    if !teams::team_exists(&mut tx, team_name).await? {
        return Err(AppError::team_not_found(team_name));
    }

    let deactivated_count = users::deactivate_team_members(&mut tx, team_name).await?;
    let retracted_assignments =
        assignments::delete_open_assignments_for_team(&mut tx, team_name).await?;

    tx.commit().await?;

    log::info!(
        "[deactivation] Team {}: {} user(s) deactivated, {} open assignment(s) retracted",
        team_name,
        deactivated_count,
        retracted_assignments
    );

    Ok(DeactivationSummary {
        team_name: team_name.to_string(),
        deactivated_count,
        retracted_assignments,
    })
}
