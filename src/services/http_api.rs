//! REST API routes for the review assigner.
//!
//! Handlers decode the request, call one service operation and shape the
//! result into snake_case JSON. Domain errors keep their meaning on the wire
//! through [`ApiErr`]; the only one absorbed here is a repeated merge.

use crate::error::AppError;
use crate::models::{
    DeactivationSummary, NewTeamMember, PullRequest, PullRequestStatus, ReviewStat, Team,
};
use crate::services::http_server::AppState;
use crate::services::{deactivation, pull_requests, review_stats, team_directory};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::AlreadyExists { resource, .. } if resource == AppError::TEAM => {
                (StatusCode::BAD_REQUEST, "TEAM_EXISTS")
            }
            AppError::AlreadyExists { .. } => (StatusCode::CONFLICT, "PR_EXISTS"),
            AppError::AlreadyMerged { .. } => (StatusCode::CONFLICT, "PR_MERGED"),
            AppError::NoCandidate { .. } => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            AppError::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Database { .. } | AppError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if self.0.is_internal() {
            log::error!("[api] {}", self.0);
        } else {
            log::debug!("[api] {} {}", code, self.0);
        }

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code,
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AddTeamRequest {
    team_name: String,
    members: Vec<NewTeamMember>,
}

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct DeactivateTeamRequest {
    team_name: String,
}

#[derive(Deserialize)]
struct SetIsActiveRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct CreatePullRequestRequest {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

#[derive(Deserialize)]
struct MergePullRequestRequest {
    pull_request_id: String,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: String,
    old_reviewer_id: String,
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MemberResponse {
    user_id: String,
    username: String,
    is_active: bool,
}

#[derive(Serialize)]
struct TeamResponse {
    team_name: String,
    members: Vec<MemberResponse>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.name,
            members: team
                .members
                .into_iter()
                .map(|m| MemberResponse {
                    user_id: m.id,
                    username: m.name,
                    is_active: m.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct UserResponse {
    user_id: String,
    username: String,
    team_name: Option<String>,
    is_active: bool,
}

#[derive(Serialize)]
struct UserEnvelope {
    user: UserResponse,
}

/// Pull request as returned by create, merge and reassign.
#[derive(Serialize)]
struct PullRequestResponse {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
    assigned_reviewers: Vec<String>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        let assigned_reviewers = pr.reviewer_ids();
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author.id,
            status: pr.status,
            assigned_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Serialize)]
struct PullRequestEnvelope {
    pr: PullRequestResponse,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequestResponse,
    replaced_by: String,
}

/// Short form used in per-user listings.
#[derive(Serialize)]
struct PullRequestShort {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
}

#[derive(Serialize)]
struct UserPullRequestsResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShort>,
}

#[derive(Serialize)]
struct ReviewStatsResponse {
    review_stat: Vec<ReviewStat>,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the REST API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/team/deactivate", post(deactivate_team))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_user_review))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/stats/reviews", get(get_review_stats))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /health: liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /team/add: create a team and upsert its members.
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let Json(req) = payload?;
    let team = team_directory::create_team(&state.db, &req.team_name, &req.members).await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

/// GET /team/get?team_name=X: fetch a team with its members.
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let Query(params) = query?;
    let team = team_directory::get_team(&state.db, &params.team_name).await?;
    Ok(Json(team.into()))
}

/// POST /team/deactivate: deactivate all members and retract open reviews.
async fn deactivate_team(
    State(state): State<AppState>,
    payload: Result<Json<DeactivateTeamRequest>, JsonRejection>,
) -> Result<Json<DeactivationSummary>, ApiErr> {
    let Json(req) = payload?;
    let summary = deactivation::deactivate_team_members(&state.db, &req.team_name).await?;
    Ok(Json(summary))
}

/// POST /users/setIsActive: flip one user's active flag.
async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiErr> {
    let Json(req) = payload?;
    let updated = team_directory::set_user_active(&state.db, &req.user_id, req.is_active).await?;

    Ok(Json(UserEnvelope {
        user: UserResponse {
            user_id: updated.user.id,
            username: updated.user.name,
            team_name: updated.team_name,
            is_active: updated.user.is_active,
        },
    }))
}

/// GET /users/getReview?user_id=X: pull requests authored by a user.
async fn get_user_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserPullRequestsResponse>, ApiErr> {
    let Query(params) = query?;
    let prs = pull_requests::get_user_pull_requests(&state.db, &params.user_id).await?;

    Ok(Json(UserPullRequestsResponse {
        user_id: params.user_id,
        pull_requests: prs
            .into_iter()
            .map(|pr| PullRequestShort {
                pull_request_id: pr.id,
                pull_request_name: pr.name,
                author_id: pr.author.id,
                status: pr.status,
            })
            .collect(),
    }))
}

/// POST /pullRequest/create: open a pull request and assign reviewers.
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ApiErr> {
    let Json(req) = payload?;
    let pr = pull_requests::create_pull_request(
        &state.db,
        &req.pull_request_id,
        &req.pull_request_name,
        &req.author_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PullRequestEnvelope { pr: pr.into() })))
}

/// POST /pullRequest/merge: merge a pull request.
///
/// Merging twice answers with the stored snapshot, so `merged_at` is stable.
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestEnvelope>, ApiErr> {
    let Json(req) = payload?;

    let pr = match pull_requests::merge_pull_request(&state.db, &req.pull_request_id).await {
        Ok(pr) => pr,
        Err(AppError::AlreadyMerged { .. }) => {
            pull_requests::get_pull_request(&state.db, &req.pull_request_id).await?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign: swap one reviewer for another teammate.
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(req) = payload?;
    let result =
        pull_requests::reassign_reviewer(&state.db, &req.pull_request_id, &req.old_reviewer_id)
            .await?;

    Ok(Json(ReassignResponse {
        pr: result.pull_request.into(),
        replaced_by: result.replaced_by,
    }))
}

/// GET /stats/reviews: assignment counts per user.
async fn get_review_stats(
    State(state): State<AppState>,
) -> Result<Json<ReviewStatsResponse>, ApiErr> {
    let review_stat = review_stats::get_review_stats(&state.db).await?;
    Ok(Json(ReviewStatsResponse { review_stat }))
}
