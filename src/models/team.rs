//! Team model.

use super::User;
use serde::{Deserialize, Serialize};

/// A named team and its current members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    /// Unique, immutable team name.
    pub name: String,

    /// Members ordered by user id.
    pub members: Vec<User>,
}

impl Team {
    /// Check whether a user is currently a member.
    pub fn contains(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

/// A member entry supplied when creating a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl NewTeamMember {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

/// Outcome of deactivating every member of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeactivationSummary {
    pub team_name: String,

    /// Users whose flag actually flipped from active to inactive.
    pub deactivated_count: u64,

    /// Assignment rows removed from open pull requests.
    pub retracted_assignments: u64,
}
