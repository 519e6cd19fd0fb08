//! Review Assigner - pull request reviewer assignment service.
//!
//! Teams own users, users author pull requests, and every new pull request
//! gets up to two active teammates of its author as reviewers. State lives in
//! a local SQLite file; the `services` layer holds the rules and the HTTP
//! surface on top of them.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use db::pool::DbPool;
pub use error::AppError;
