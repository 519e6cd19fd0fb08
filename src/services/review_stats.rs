//! Review statistics.

use crate::db::assignments;
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::ReviewStat;

/// Assignment count for every known user, highest first.
///
/// Counts include merged pull requests, so history survives deactivation.
/// Users with no assignments appear with a count of zero.
pub async fn get_review_stats(pool: &DbPool) -> Result<Vec<ReviewStat>, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(assignments::review_counts(&mut conn).await?)
}
