//! Pull request queries.

use super::{assignments, users};
use crate::models::{PullRequest, PullRequestRow, PullRequestStatus};
use sqlx::SqliteConnection;

const SELECT_COLUMNS: &str = "SELECT id, name, author_id, status, created_at, merged_at FROM pull_requests";

/// Insert a new pull request in the `OPEN` state.
pub async fn insert_pull_request(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    author_id: &str,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pull_requests (id, name, author_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(author_id)
    .bind(PullRequestStatus::Open.as_str())
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_pull_request_row(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<PullRequestRow>, sqlx::Error> {
    let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let row = sqlx::query_as::<_, PullRequestRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row)
}

/// Transition an open pull request to `MERGED`.
///
/// Only rows still `OPEN` are touched, so `merged_at` is written exactly once.
/// Returns the number of rows updated.
pub async fn mark_merged(
    conn: &mut SqliteConnection,
    id: &str,
    merged_at: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ? AND status = ?",
    )
    .bind(PullRequestStatus::Merged.as_str())
    .bind(merged_at)
    .bind(id)
    .bind(PullRequestStatus::Open.as_str())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Pull requests authored by a user, oldest first.
pub async fn list_by_author(
    conn: &mut SqliteConnection,
    author_id: &str,
) -> Result<Vec<PullRequestRow>, sqlx::Error> {
    let sql = format!("{} WHERE author_id = ? ORDER BY created_at, id", SELECT_COLUMNS);
    let rows = sqlx::query_as::<_, PullRequestRow>(&sql)
        .bind(author_id)
        .fetch_all(conn)
        .await?;

    Ok(rows)
}

/// Pull requests on which a user holds a review assignment, oldest first.
pub async fn list_by_reviewer(
    conn: &mut SqliteConnection,
    reviewer_id: &str,
) -> Result<Vec<PullRequestRow>, sqlx::Error> {
    sqlx::query_as::<_, PullRequestRow>(
        r#"
        SELECT pr.id, pr.name, pr.author_id, pr.status, pr.created_at, pr.merged_at
        FROM pull_requests pr
        JOIN pr_reviewers r ON r.pull_request_id = pr.id
        WHERE r.reviewer_id = ?
        ORDER BY pr.created_at, pr.id
        "#,
    )
    .bind(reviewer_id)
    .fetch_all(conn)
    .await
}

/// Load the author and reviewer set for a row.
pub async fn hydrate(
    conn: &mut SqliteConnection,
    row: PullRequestRow,
) -> Result<PullRequest, sqlx::Error> {
    let author = users::get_user(&mut *conn, &row.author_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let reviewers = assignments::get_reviewers(&mut *conn, &row.id).await?;

    Ok(row.into_pull_request(author, reviewers))
}

/// Fetch a pull request with its author and reviewers.
pub async fn get_pull_request(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<PullRequest>, sqlx::Error> {
    match get_pull_request_row(&mut *conn, id).await? {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}
