//! Pull request lifecycle: creation with reviewer assignment, merge, reassignment.
//!
//! `OPEN -> MERGED` is the only transition. Reviewers can change only while a
//! pull request is open; once merged its assignment rows are history.

use super::require_non_empty;
use super::reviewer_selection::pick_reviewers;
use crate::db::pool::DbPool;
use crate::db::{self, assignments, pull_requests, teams, users};
use crate::error::AppError;
use crate::models::{PullRequest, Reassignment, MAX_REVIEWERS};

/// Create an open pull request and assign up to two reviewers from the author's team.
///
/// Fails with `NotFound(User)` for an unknown author, `AlreadyExists` for a
/// taken id, and `NotFound(Team)` when the author has no team. Zero or one
/// reviewer is a valid outcome for small teams. Any failure rolls back the
/// pull request row together with its assignments.
pub async fn create_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
    name: &str,
    author_id: &str,
) -> Result<PullRequest, AppError> {
    require_non_empty(pull_request_id, "pull_request_id")?;
    require_non_empty(name, "pull_request_name")?;
    require_non_empty(author_id, "author_id")?;

    let mut tx = db::begin_write(pool).await?;

    if users::get_user(&mut tx, author_id).await?.is_none() {
        return Err(AppError::user_not_found(author_id));
    }

    if pull_requests::get_pull_request_row(&mut tx, pull_request_id)
        .await?
        .is_some()
    {
        return Err(AppError::pull_request_exists(pull_request_id));
    }

    let team_name = teams::get_user_team(&mut tx, author_id)
        .await?
        .ok_or_else(|| AppError::team_not_found(format!("team of user {}", author_id)))?;

    let created_at = db::now();
    pull_requests::insert_pull_request(&mut tx, pull_request_id, name, author_id, created_at)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::pull_request_exists(pull_request_id)
            }
            _ => AppError::database_with_op(e.to_string(), "insert_pull_request"),
        })?;

    let reviewers = pick_reviewers(&mut tx, &team_name, &[author_id], MAX_REVIEWERS).await?;
    for reviewer in &reviewers {
        assignments::insert_assignment(&mut tx, pull_request_id, &reviewer.id, created_at).await?;
    }

    let pull_request = load(&mut tx, pull_request_id).await?;

    tx.commit().await?;

    log::info!(
        "[pull_requests] Created {} by {} with reviewers {:?}",
        pull_request_id,
        author_id,
        pull_request.reviewer_ids()
    );

    Ok(pull_request)
}

/// Merge an open pull request.
///
/// A pull request that is already merged is left untouched and reported as
/// `AlreadyMerged`; callers that want idempotent merges read the stored
/// snapshot with [`get_pull_request`] instead of surfacing the error.
pub async fn merge_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
) -> Result<PullRequest, AppError> {
    require_non_empty(pull_request_id, "pull_request_id")?;
    let mut tx = db::begin_write(pool).await?;

    let row = pull_requests::get_pull_request_row(&mut tx, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pull_request_not_found(pull_request_id))?;

    if row.is_merged() {
        return Err(AppError::already_merged(pull_request_id));
    }

    pull_requests::mark_merged(&mut tx, pull_request_id, db::now()).await?;
    let pull_request = load(&mut tx, pull_request_id).await?;

    tx.commit().await?;

    log::info!("[pull_requests] Merged {}", pull_request_id);

    Ok(pull_request)
}

/// Replace one reviewer of an open pull request with another member of their team.
///
/// The replacement is drawn from the old reviewer's team, never the author,
/// the old reviewer, or someone already reviewing. With nobody eligible the
/// call fails with `NoCandidate` and nothing changes.
pub async fn reassign_reviewer(
    pool: &DbPool,
    pull_request_id: &str,
    old_reviewer_id: &str,
) -> Result<Reassignment, AppError> {
    require_non_empty(pull_request_id, "pull_request_id")?;
    require_non_empty(old_reviewer_id, "old_reviewer_id")?;

    let mut tx = db::begin_write(pool).await?;

    let row = pull_requests::get_pull_request_row(&mut tx, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pull_request_not_found(pull_request_id))?;

    if users::get_user(&mut tx, old_reviewer_id).await?.is_none() {
        return Err(AppError::user_not_found(old_reviewer_id));
    }

    if row.is_merged() {
        return Err(AppError::already_merged(pull_request_id));
    }

    if !assignments::is_assigned(&mut tx, pull_request_id, old_reviewer_id).await? {
        return Err(AppError::not_assigned(pull_request_id, old_reviewer_id));
    }

    let team_name = teams::get_user_team(&mut tx, old_reviewer_id)
        .await?
        .ok_or_else(|| AppError::team_not_found(format!("team of user {}", old_reviewer_id)))?;

    let current = assignments::get_reviewers(&mut tx, pull_request_id).await?;
    let mut exclude: Vec<&str> = vec![row.author_id.as_str(), old_reviewer_id];
    exclude.extend(current.iter().map(|r| r.id.as_str()));

    let replacement = pick_reviewers(&mut tx, &team_name, &exclude, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::no_candidate(pull_request_id))?;

    let updated = assignments::replace_assignment(
        &mut tx,
        pull_request_id,
        old_reviewer_id,
        &replacement.id,
        db::now(),
    )
    .await?;
    if updated != 1 {
        return Err(AppError::not_assigned(pull_request_id, old_reviewer_id));
    }

    let pull_request = load(&mut tx, pull_request_id).await?;

    tx.commit().await?;

    log::info!(
        "[pull_requests] Reassigned {} from {} to {}",
        pull_request_id,
        old_reviewer_id,
        replacement.id
    );

    Ok(Reassignment {
        pull_request,
        replaced_by: replacement.id,
    })
}

/// Fetch a pull request with its author, status, merge time and reviewers.
///
/// Reads run in one deferred transaction, so the row and its reviewer set
/// come from the same snapshot even while writers commit.
pub async fn get_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
) -> Result<PullRequest, AppError> {
    require_non_empty(pull_request_id, "pull_request_id")?;
    let mut tx = pool.begin().await?;
    let pull_request = load(&mut tx, pull_request_id).await?;
    tx.commit().await?;
    Ok(pull_request)
}

/// All pull requests authored by a user.
pub async fn get_user_pull_requests(
    pool: &DbPool,
    user_id: &str,
) -> Result<Vec<PullRequest>, AppError> {
    require_non_empty(user_id, "user_id")?;
    let mut tx = pool.begin().await?;

    if users::get_user(&mut tx, user_id).await?.is_none() {
        return Err(AppError::user_not_found(user_id));
    }

    let rows = pull_requests::list_by_author(&mut tx, user_id).await?;
    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(pull_requests::hydrate(&mut tx, row).await?);
    }

    tx.commit().await?;
    Ok(result)
}

/// All pull requests a user is currently assigned to review.
pub async fn get_user_reviews(pool: &DbPool, user_id: &str) -> Result<Vec<PullRequest>, AppError> {
    require_non_empty(user_id, "user_id")?;
    let mut tx = pool.begin().await?;

    if users::get_user(&mut tx, user_id).await?.is_none() {
        return Err(AppError::user_not_found(user_id));
    }

    let rows = pull_requests::list_by_reviewer(&mut tx, user_id).await?;
    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(pull_requests::hydrate(&mut tx, row).await?);
    }

    tx.commit().await?;
    Ok(result)
}

async fn load(
    conn: &mut sqlx::SqliteConnection,
    pull_request_id: &str,
) -> Result<PullRequest, AppError> {
    pull_requests::get_pull_request(conn, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pull_request_not_found(pull_request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PullRequestStatus;
    use crate::services::team_directory::{create_team, set_user_active};
    use crate::services::test_support::{members, setup_test_db};

    async fn eng_team(pool: &DbPool) {
        create_team(
            pool,
            "eng",
            &members(&[("alice", true), ("bob", true), ("carol", true)]),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_assigns_two_teammates() {
        let pool = setup_test_db().await;
        eng_team(&pool).await;

        let pr = create_pull_request(&pool, "pr-1", "Add search", "alice")
            .await
            .unwrap();

        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.author.id, "alice");
        assert!(pr.merged_at.is_none());
        let mut ids = pr.reviewer_ids();
        ids.sort();
        assert_eq!(ids, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_create_with_small_team() {
        let pool = setup_test_db().await;
        create_team(&pool, "solo", &members(&[("alice", true)])).await.unwrap();
        create_team(&pool, "pair", &members(&[("bob", true), ("carol", true)]))
            .await
            .unwrap();

        let solo = create_pull_request(&pool, "pr-1", "Solo", "alice").await.unwrap();
        assert!(solo.reviewers.is_empty());

        let pair = create_pull_request(&pool, "pr-2", "Pair", "bob").await.unwrap();
        assert_eq!(pair.reviewer_ids(), vec!["carol"]);
    }

    #[tokio::test]
    async fn test_create_skips_inactive_members() {
        let pool = setup_test_db().await;
        create_team(
            &pool,
            "eng",
            &members(&[("alice", true), ("bob", false), ("carol", true)]),
        )
        .await
        .unwrap();

        let pr = create_pull_request(&pool, "pr-1", "Fix", "alice").await.unwrap();
        assert_eq!(pr.reviewer_ids(), vec!["carol"]);
    }

    #[tokio::test]
    async fn test_read_transaction_sees_one_snapshot() {
        let pool = setup_test_db().await;
        create_team(
            &pool,
            "eng",
            &members(&[("alice", true), ("bob", true), ("carol", true), ("dave", true)]),
        )
        .await
        .unwrap();
        let before = create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();
        let old = before.reviewers[0].id.clone();

        let mut tx = pool.begin().await.unwrap();
        let row = pull_requests::get_pull_request_row(&mut tx, "pr-1")
            .await
            .unwrap()
            .unwrap();

        // Commits between the row read and the reviewer read
        reassign_reviewer(&pool, "pr-1", &old).await.unwrap();

        let snapshot = pull_requests::hydrate(&mut tx, row).await.unwrap();
        assert_eq!(snapshot.reviewer_ids(), before.reviewer_ids());
        tx.commit().await.unwrap();

        let after = get_pull_request(&pool, "pr-1").await.unwrap();
        assert!(!after.has_reviewer(&old));
        assert_eq!(after.reviewers.len(), 2);
    }

    #[tokio::test]
    async fn test_create_errors() {
        let pool = setup_test_db().await;
        eng_team(&pool).await;

        let err = create_pull_request(&pool, "pr-1", "X", "ghost").await.unwrap_err();
        assert!(err.is_not_found(AppError::USER));

        create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();
        let err = create_pull_request(&pool, "pr-1", "Y", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { ref resource, .. } if resource == "PullRequest"));

        // The duplicate did not disturb the original
        let original = get_pull_request(&pool, "pr-1").await.unwrap();
        assert_eq!(original.name, "X");
        assert_eq!(original.author.id, "alice");
    }

    #[tokio::test]
    async fn test_create_without_team_rolls_back() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.unwrap();
        users::upsert_user(&mut conn, "drifter", "Drifter", true).await.unwrap();
        drop(conn);

        let err = create_pull_request(&pool, "pr-1", "X", "drifter").await.unwrap_err();
        assert!(err.is_not_found(AppError::TEAM));

        let err = get_pull_request(&pool, "pr-1").await.unwrap_err();
        assert!(err.is_not_found(AppError::PULL_REQUEST));
    }

    #[tokio::test]
    async fn test_merge_is_terminal_and_keeps_timestamp() {
        let pool = setup_test_db().await;
        eng_team(&pool).await;
        create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();

        let merged = merge_pull_request(&pool, "pr-1").await.unwrap();
        assert!(merged.is_merged());
        let merged_at = merged.merged_at.expect("merged_at set");

        let err = merge_pull_request(&pool, "pr-1").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyMerged { .. }));

        let again = get_pull_request(&pool, "pr-1").await.unwrap();
        assert_eq!(again.merged_at, Some(merged_at));
        assert_eq!(again.reviewers, merged.reviewers);
    }

    #[tokio::test]
    async fn test_merge_missing() {
        let pool = setup_test_db().await;
        let err = merge_pull_request(&pool, "nope").await.unwrap_err();
        assert!(err.is_not_found(AppError::PULL_REQUEST));
    }

    #[tokio::test]
    async fn test_reassign_picks_other_teammate() {
        let pool = setup_test_db().await;
        create_team(
            &pool,
            "eng",
            &members(&[("alice", true), ("r1", true), ("r2", true), ("r3", true)]),
        )
        .await
        .unwrap();

        let pr = create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();
        let old = pr.reviewers[0].id.clone();
        let kept = pr.reviewers[1].id.clone();

        let result = reassign_reviewer(&pool, "pr-1", &old).await.unwrap();

        assert_ne!(result.replaced_by, old);
        assert_ne!(result.replaced_by, kept);
        assert_ne!(result.replaced_by, "alice");
        assert!(!result.pull_request.has_reviewer(&old));
        assert!(result.pull_request.has_reviewer(&kept));
        assert!(result.pull_request.has_reviewer(&result.replaced_by));
        assert_eq!(result.pull_request.reviewers.len(), 2);
    }

    #[tokio::test]
    async fn test_reassign_without_candidate_leaves_state() {
        let pool = setup_test_db().await;
        create_team(&pool, "duo", &members(&[("alice", true), ("bob", true)]))
            .await
            .unwrap();
        create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();

        let err = reassign_reviewer(&pool, "pr-1", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NoCandidate { .. }));

        let pr = get_pull_request(&pool, "pr-1").await.unwrap();
        assert_eq!(pr.reviewer_ids(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_reassign_errors() {
        let pool = setup_test_db().await;
        eng_team(&pool).await;
        create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();

        let err = reassign_reviewer(&pool, "missing", "bob").await.unwrap_err();
        assert!(err.is_not_found(AppError::PULL_REQUEST));

        let err = reassign_reviewer(&pool, "pr-1", "ghost").await.unwrap_err();
        assert!(err.is_not_found(AppError::USER));

        let err = reassign_reviewer(&pool, "pr-1", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotAssigned { .. }));

        merge_pull_request(&pool, "pr-1").await.unwrap();
        let err = reassign_reviewer(&pool, "pr-1", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyMerged { .. }));
    }

    #[tokio::test]
    async fn test_reassign_skips_inactive_candidates() {
        let pool = setup_test_db().await;
        create_team(
            &pool,
            "eng",
            &members(&[("alice", true), ("bob", true), ("carol", true), ("dave", true)]),
        )
        .await
        .unwrap();
        let pr = create_pull_request(&pool, "pr-1", "X", "alice").await.unwrap();

        // Deactivate whoever was not picked so nobody is left to swap in
        for id in ["bob", "carol", "dave"] {
            if !pr.has_reviewer(id) {
                set_user_active(&pool, id, false).await.unwrap();
            }
        }

        let err = reassign_reviewer(&pool, "pr-1", &pr.reviewers[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCandidate { .. }));
    }

    #[tokio::test]
    async fn test_user_pull_requests_and_reviews() {
        let pool = setup_test_db().await;
        eng_team(&pool).await;
        create_pull_request(&pool, "pr-1", "One", "alice").await.unwrap();
        create_pull_request(&pool, "pr-2", "Two", "alice").await.unwrap();
        create_pull_request(&pool, "pr-3", "Three", "bob").await.unwrap();

        let authored = get_user_pull_requests(&pool, "alice").await.unwrap();
        let ids: Vec<&str> = authored.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pr-1", "pr-2"]);
        assert!(authored.iter().all(|p| p.reviewers.len() == 2));

        // carol is on every pull request: alice's two and bob's one
        let reviews = get_user_reviews(&pool, "carol").await.unwrap();
        assert_eq!(reviews.len(), 3);

        let err = get_user_pull_requests(&pool, "ghost").await.unwrap_err();
        assert!(err.is_not_found(AppError::USER));
    }
}
