//! Team directory: teams, membership, and user activity flags.

use super::require_non_empty;
use crate::db::pool::DbPool;
use crate::db::{self, teams, users};
use crate::error::AppError;
use crate::models::{NewTeamMember, Team, User, UserWithTeam};
use std::collections::HashSet;

/// Create a team and upsert its members.
///
/// Fails with `AlreadyExists` when the name is taken. Every member is upserted
/// (name and active flag refreshed) and moved into the new team, leaving any
/// team they belonged to before. Runs in one transaction.
pub async fn create_team(
    pool: &DbPool,
    team_name: &str,
    members: &[NewTeamMember],
) -> Result<Team, AppError> {
    require_non_empty(team_name, "team_name")?;
    let mut seen = HashSet::new();
    for member in members {
        require_non_empty(&member.user_id, "user_id")?;
        require_non_empty(&member.username, "username")?;
        if !seen.insert(member.user_id.as_str()) {
            return Err(AppError::invalid_input_field(
                format!("duplicate member {}", member.user_id),
                "members",
            ));
        }
    }

    let mut tx = db::begin_write(pool).await?;

    if !teams::insert_team(&mut tx, team_name).await? {
        return Err(AppError::team_exists(team_name));
    }

    for member in members {
        users::upsert_user(&mut tx, &member.user_id, &member.username, member.is_active).await?;
        teams::replace_membership(&mut tx, &member.user_id, team_name).await?;
    }

    let team = Team {
        name: team_name.to_string(),
        members: teams::get_team_members(&mut tx, team_name).await?,
    };

    tx.commit().await?;

    log::info!(
        "[teams] Created team {} with {} member(s)",
        team_name,
        team.members.len()
    );

    Ok(team)
}

/// Fetch a team and all of its members.
pub async fn get_team(pool: &DbPool, team_name: &str) -> Result<Team, AppError> {
    require_non_empty(team_name, "team_name")?;
    let mut tx = pool.begin().await?;

    if !teams::team_exists(&mut tx, team_name).await? {
        return Err(AppError::team_not_found(team_name));
    }

    let team = Team {
        name: team_name.to_string(),
        members: teams::get_team_members(&mut tx, team_name).await?,
    };

    tx.commit().await?;
    Ok(team)
}

/// Name of the team a user belongs to.
///
/// `NotFound(User)` if the user is unknown, `NotFound(Team)` if they have no team.
pub async fn get_user_team(pool: &DbPool, user_id: &str) -> Result<String, AppError> {
    require_non_empty(user_id, "user_id")?;
    let mut tx = pool.begin().await?;

    if users::get_user(&mut tx, user_id).await?.is_none() {
        return Err(AppError::user_not_found(user_id));
    }

    let team_name = teams::get_user_team(&mut tx, user_id).await?;
    tx.commit().await?;

    team_name.ok_or_else(|| AppError::team_not_found(format!("team of user {}", user_id)))
}

/// Fetch a user by id.
pub async fn get_user(pool: &DbPool, user_id: &str) -> Result<User, AppError> {
    require_non_empty(user_id, "user_id")?;
    let mut conn = pool.acquire().await?;

    users::get_user(&mut conn, user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))
}

/// Flip one user's active flag.
///
/// Open review assignments are left in place; use the team deactivation
/// cascade to retract them.
pub async fn set_user_active(
    pool: &DbPool,
    user_id: &str,
    is_active: bool,
) -> Result<UserWithTeam, AppError> {
    require_non_empty(user_id, "user_id")?;
    let mut tx = db::begin_write(pool).await?;

    if users::set_user_active(&mut tx, user_id, is_active).await? == 0 {
        return Err(AppError::user_not_found(user_id));
    }

    let user = users::get_user(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;
    let team_name = teams::get_user_team(&mut tx, user_id).await?;

    tx.commit().await?;

    log::info!("[teams] User {} is_active={}", user_id, is_active);

    Ok(UserWithTeam { user, team_name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{members, setup_test_db};

    #[tokio::test]
    async fn test_create_and_get_team() {
        let pool = setup_test_db().await;

        let created = create_team(&pool, "eng", &members(&[("bob", true), ("alice", false)]))
            .await
            .unwrap();
        assert_eq!(created.name, "eng");

        let team = get_team(&pool, "eng").await.unwrap();
        let ids: Vec<&str> = team.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert!(!team.members[0].is_active);
        assert_eq!(team.members[1].name, "BOB");
        assert_eq!(created, team);
    }

    #[tokio::test]
    async fn test_create_existing_team_fails_without_changes() {
        let pool = setup_test_db().await;
        create_team(&pool, "eng", &members(&[("alice", true)])).await.unwrap();

        let err = create_team(&pool, "eng", &members(&[("alice", false), ("bob", true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { ref resource, .. } if resource == "Team"));

        // The rejected call neither flipped alice nor created bob
        let team = get_team(&pool, "eng").await.unwrap();
        assert_eq!(team.members.len(), 1);
        assert!(team.members[0].is_active);
        assert!(get_user(&pool, "bob").await.unwrap_err().is_not_found(AppError::USER));
    }

    #[tokio::test]
    async fn test_moving_user_to_new_team_leaves_old_one() {
        let pool = setup_test_db().await;
        create_team(&pool, "backend", &members(&[("alice", true), ("bob", true)]))
            .await
            .unwrap();
        create_team(&pool, "frontend", &members(&[("alice", true)]))
            .await
            .unwrap();

        assert_eq!(get_user_team(&pool, "alice").await.unwrap(), "frontend");
        let backend = get_team(&pool, "backend").await.unwrap();
        assert!(!backend.contains("alice"));
        assert!(backend.contains("bob"));
    }

    #[tokio::test]
    async fn test_upsert_refreshes_user_fields() {
        let pool = setup_test_db().await;
        create_team(&pool, "a", &members(&[("alice", true)])).await.unwrap();
        create_team(
            &pool,
            "b",
            &[NewTeamMember::new("alice", "Alice Liddell", false)],
        )
        .await
        .unwrap();

        let alice = get_user(&pool, "alice").await.unwrap();
        assert_eq!(alice.name, "Alice Liddell");
        assert!(!alice.is_active);
    }

    #[tokio::test]
    async fn test_get_missing_team() {
        let pool = setup_test_db().await;
        let err = get_team(&pool, "ghosts").await.unwrap_err();
        assert!(err.is_not_found(AppError::TEAM));
    }

    #[tokio::test]
    async fn test_get_user_team_errors() {
        let pool = setup_test_db().await;
        let err = get_user_team(&pool, "nobody").await.unwrap_err();
        assert!(err.is_not_found(AppError::USER));

        let mut conn = pool.acquire().await.unwrap();
        users::upsert_user(&mut conn, "drifter", "Drifter", true).await.unwrap();
        drop(conn);

        let err = get_user_team(&pool, "drifter").await.unwrap_err();
        assert!(err.is_not_found(AppError::TEAM));
    }

    #[tokio::test]
    async fn test_rejects_blank_and_duplicate_input() {
        let pool = setup_test_db().await;

        let err = create_team(&pool, " ", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));

        let err = create_team(&pool, "eng", &members(&[("alice", true), ("alice", false)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
        assert!(get_team(&pool, "eng").await.is_err());

        let err = create_team(&pool, "eng", &[NewTeamMember::new("u1", "   ", true)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidInput { ref field, .. } if field.as_deref() == Some("username")
        ));
        assert!(get_team(&pool, "eng").await.is_err());
        assert!(get_user(&pool, "u1").await.unwrap_err().is_not_found(AppError::USER));
    }

    #[tokio::test]
    async fn test_set_user_active() {
        let pool = setup_test_db().await;
        create_team(&pool, "eng", &members(&[("alice", true)])).await.unwrap();

        let updated = set_user_active(&pool, "alice", false).await.unwrap();
        assert!(!updated.user.is_active);
        assert_eq!(updated.team_name.as_deref(), Some("eng"));

        let err = set_user_active(&pool, "ghost", true).await.unwrap_err();
        assert!(err.is_not_found(AppError::USER));
    }
}
