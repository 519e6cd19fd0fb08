//! User queries.

use crate::models::User;
use sqlx::SqliteConnection;

/// Insert a user or refresh the name and active flag of an existing one.
pub async fn upsert_user(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    is_active: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, is_active, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(is_active)
    .bind(super::now())
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a user by id.
pub async fn get_user(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, is_active FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Set one user's active flag. Returns the number of rows touched (0 if unknown).
pub async fn set_user_active(
    conn: &mut SqliteConnection,
    id: &str,
    is_active: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(super::now())
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Mark every active member of a team inactive.
///
/// Returns how many flags actually flipped, so a repeated call yields 0.
pub async fn deactivate_team_members(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = 0, updated_at = ?
        WHERE is_active = 1
          AND id IN (SELECT user_id FROM team_members WHERE team_name = ?)
        "#,
    )
    .bind(super::now())
    .bind(team_name)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
