//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person who can author pull requests and review them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// External, stable identifier.
    pub id: String,

    /// Display name, refreshed on every team upsert.
    pub name: String,

    /// Inactive users are never picked as reviewers.
    pub is_active: bool,
}

/// A user together with the team they currently belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithTeam {
    pub user: User,
    pub team_name: Option<String>,
}
