//! Review assignment queries (`pr_reviewers`).

use crate::models::{PullRequestStatus, ReviewStat, User};
use sqlx::SqliteConnection;

pub async fn insert_assignment(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
    assigned_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, assigned_at) VALUES (?, ?, ?)",
    )
    .bind(pull_request_id)
    .bind(reviewer_id)
    .bind(assigned_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Reviewers assigned to a pull request, in assignment order.
pub async fn get_reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.is_active
        FROM pr_reviewers r
        JOIN users u ON u.id = r.reviewer_id
        WHERE r.pull_request_id = ?
        ORDER BY r.assigned_at, u.id
        "#,
    )
    .bind(pull_request_id)
    .fetch_all(conn)
    .await
}

pub async fn is_assigned(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM pr_reviewers WHERE pull_request_id = ? AND reviewer_id = ?")
            .bind(pull_request_id)
            .bind(reviewer_id)
            .fetch_optional(conn)
            .await?;

    Ok(row.is_some())
}

/// Swap the reviewer on exactly the `(pull request, old reviewer)` row.
///
/// Returns the number of rows updated (0 if the pair does not exist).
pub async fn replace_assignment(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
    assigned_at: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pr_reviewers
        SET reviewer_id = ?, assigned_at = ?
        WHERE pull_request_id = ? AND reviewer_id = ?
        "#,
    )
    .bind(new_reviewer_id)
    .bind(assigned_at)
    .bind(pull_request_id)
    .bind(old_reviewer_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Remove every assignment held by members of a team on pull requests still open.
///
/// Assignments on merged pull requests are history and stay.
pub async fn delete_open_assignments_for_team(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM pr_reviewers
        WHERE reviewer_id IN (SELECT user_id FROM team_members WHERE team_name = ?)
          AND pull_request_id IN (SELECT id FROM pull_requests WHERE status = ?)
        "#,
    )
    .bind(team_name)
    .bind(PullRequestStatus::Open.as_str())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Assignment counts for every known user, highest first.
pub async fn review_counts(conn: &mut SqliteConnection) -> Result<Vec<ReviewStat>, sqlx::Error> {
    sqlx::query_as::<_, ReviewStat>(
        r#"
        SELECT u.id AS user_id, u.name AS username, u.is_active,
               COUNT(r.reviewer_id) AS review_count
        FROM users u
        LEFT JOIN pr_reviewers r ON r.reviewer_id = u.id
        GROUP BY u.id, u.name, u.is_active
        ORDER BY review_count DESC, u.id
        "#,
    )
    .fetch_all(conn)
    .await
}
