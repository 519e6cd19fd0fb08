//! Application error types.
//!
//! Domain-rule violations and storage failures share one serializable enum so
//! the HTTP layer can map each kind onto a status code and error code without
//! inspecting messages.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the assignment engine.
///
/// All variants serialize to a structured JSON object (`type` + `details`).
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Requested team, user, or pull request does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A team name or pull request id is already taken.
    #[error("{resource} already exists: {id}")]
    AlreadyExists { resource: String, id: String },

    /// Mutation attempted on a pull request that is already merged.
    #[error("Pull request already merged: {id}")]
    AlreadyMerged { id: String },

    /// Reassignment found no eligible replacement reviewer.
    #[error("No candidate available to review pull request {id}")]
    NoCandidate { id: String },

    /// The reviewer being replaced is not assigned to the pull request.
    #[error("Reviewer {reviewer_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        pull_request_id: String,
        reviewer_id: String,
    },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub const TEAM: &'static str = "Team";
    pub const USER: &'static str = "User";
    pub const PULL_REQUEST: &'static str = "PullRequest";

    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    pub fn team_not_found(name: impl Into<String>) -> Self {
        Self::not_found_with_id(Self::TEAM, name)
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::not_found_with_id(Self::USER, id)
    }

    pub fn pull_request_not_found(id: impl Into<String>) -> Self {
        Self::not_found_with_id(Self::PULL_REQUEST, id)
    }

    pub fn team_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: Self::TEAM.to_string(),
            id: name.into(),
        }
    }

    pub fn pull_request_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: Self::PULL_REQUEST.to_string(),
            id: id.into(),
        }
    }

    pub fn already_merged(id: impl Into<String>) -> Self {
        Self::AlreadyMerged { id: id.into() }
    }

    pub fn no_candidate(id: impl Into<String>) -> Self {
        Self::NoCandidate { id: id.into() }
    }

    pub fn not_assigned(pull_request_id: impl Into<String>, reviewer_id: impl Into<String>) -> Self {
        Self::NotAssigned {
            pull_request_id: pull_request_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check whether this is a not-found error for the given resource kind.
    pub fn is_not_found(&self, kind: &str) -> bool {
        matches!(self, Self::NotFound { resource, .. } if resource == kind)
    }

    /// True for storage or internal failures, false for domain-rule violations.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Internal { .. })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
