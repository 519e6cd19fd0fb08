//! Team and membership queries.

use crate::models::User;
use sqlx::SqliteConnection;

/// Create a team unless the name is taken.
///
/// Returns `false` when a team with this name already exists.
pub async fn insert_team(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO teams (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(super::now())
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn team_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM teams WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(row.is_some())
}

/// All current members of a team, ordered by user id.
pub async fn get_team_members(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.is_active
        FROM team_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE tm.team_name = ?
        ORDER BY u.id
        "#,
    )
    .bind(team_name)
    .fetch_all(conn)
    .await
}

/// Active members of a team: the raw candidate pool for reviewer selection.
pub async fn get_active_team_members(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.is_active
        FROM team_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE tm.team_name = ? AND u.is_active = 1
        ORDER BY u.id
        "#,
    )
    .bind(team_name)
    .fetch_all(conn)
    .await
}

/// Move a user into a team, dropping whatever team they were in before.
pub async fn replace_membership(
    conn: &mut SqliteConnection,
    user_id: &str,
    team_name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM team_members WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT INTO team_members (user_id, team_name, joined_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(team_name)
        .bind(super::now())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Name of the team a user belongs to, if any.
pub async fn get_user_team(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT team_name FROM team_members WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
