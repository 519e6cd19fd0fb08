//! Review statistics model.

use serde::Serialize;
use sqlx::FromRow;

/// Number of review assignments held by a user, merged pull requests included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ReviewStat {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
    pub review_count: i64,
}
