//! Reviewer selection.
//!
//! The rule is pure: given the active members of a team and a set of excluded
//! user ids, pick up to `k` of the remaining members uniformly at random.
//! [`pick_reviewers`] feeds it the candidate pool read inside the caller's
//! write transaction, so the pool cannot change between selection and insert.

use crate::db::teams;
use crate::models::User;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::SqliteConnection;

/// Pick up to `k` eligible reviewers from `candidates`.
///
/// Inactive users and anyone whose id is in `exclude` are never returned.
/// Fewer than `k` users come back when the eligible pool is smaller; an empty
/// result is not an error here, callers decide what it means.
pub fn select_reviewers<R: Rng + ?Sized>(
    candidates: &[User],
    exclude: &[&str],
    k: usize,
    rng: &mut R,
) -> Vec<User> {
    let eligible: Vec<&User> = candidates
        .iter()
        .filter(|c| c.is_active && !exclude.contains(&c.id.as_str()))
        .collect();

    eligible
        .choose_multiple(rng, k)
        .map(|user| (*user).clone())
        .collect()
}

/// Read the active members of `team_name` and select up to `k` reviewers.
///
/// Must be called with a connection inside a write transaction
/// ([`crate::db::begin_write`]).
pub async fn pick_reviewers(
    conn: &mut SqliteConnection,
    team_name: &str,
    exclude: &[&str],
    k: usize,
) -> Result<Vec<User>, sqlx::Error> {
    let candidates = teams::get_active_team_members(conn, team_name).await?;
    let chosen = select_reviewers(&candidates, exclude, k, &mut rand::thread_rng());

    log::debug!(
        "[selection] team={} pool={} excluded={:?} picked={:?}",
        team_name,
        candidates.len(),
        exclude,
        chosen.iter().map(|u| u.id.as_str()).collect::<Vec<_>>()
    );

    Ok(chosen)
}
