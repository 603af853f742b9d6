// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Budget sharing endpoints. Owner only.
//!
//! Sharing grants full read/write on the budget and its transactions. Users
//! are invited by email and revoked by user id.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::ApiError,
    models::validate_email,
    state::AppState,
    storage::{
        normalize_email, AccessEnforcer, BudgetRepository, StoreError, UserRepository,
    },
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to share a budget with the user owning an email address.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShareRequest {
    pub email: String,
}

/// One user a budget is shared with.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SharedUserView {
    pub user: String,
    pub name: String,
    pub email: String,
}

/// Users a budget is shared with.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedUsersResponse {
    pub shared_users: Vec<SharedUserView>,
}

/// Outcome of a share mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareOutcomeResponse {
    pub shared: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the users a budget is shared with.
#[utoipa::path(
    get,
    path = "/api/budget/{budget_id}/share",
    params(("budget_id" = String, Path, description = "Budget id")),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Shared users", body = SharedUsersResponse),
        (status = 404, description = "Unknown budget or caller is not the owner"),
    )
)]
pub async fn list_shares(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
) -> Result<Json<SharedUsersResponse>, ApiError> {
    let budget = BudgetRepository::new(&state.db).get_authorized(
        &budget_id,
        &user.user_id,
        crate::storage::AccessLevel::Read,
    )?;
    budget.verify_owner(&user.user_id)?;

    let users = UserRepository::new(&state.db);
    let mut shared_users = Vec::with_capacity(budget.shared_users.len());
    for shared_id in &budget.shared_users {
        match users.get(shared_id) {
            Ok(shared) => shared_users.push(SharedUserView {
                user: shared.id,
                name: shared.name,
                email: shared.email,
            }),
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(%budget_id, %shared_id, "shared user no longer exists");
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(Json(SharedUsersResponse { shared_users }))
}

/// Share a budget with the user registered under an email address.
#[utoipa::path(
    post,
    path = "/api/budget/{budget_id}/share",
    params(("budget_id" = String, Path, description = "Budget id")),
    request_body = ShareRequest,
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Budget shared", body = ShareOutcomeResponse),
        (status = 400, description = "Already shared, or sharing with the owner"),
        (status = 404, description = "Unknown budget, unknown user, or caller is not the owner"),
    )
)]
pub async fn add_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<ShareOutcomeResponse>, ApiError> {
    validate_email(&request.email)?;

    let target = UserRepository::new(&state.db)
        .find_by_email(&normalize_email(&request.email))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    BudgetRepository::new(&state.db).add_shared_user(&budget_id, &user.user_id, &target.id)?;

    Ok(Json(ShareOutcomeResponse { shared: true }))
}

/// Revoke a user's access to a budget.
#[utoipa::path(
    delete,
    path = "/api/budget/{budget_id}/share/{user_id}",
    params(
        ("budget_id" = String, Path, description = "Budget id"),
        ("user_id" = String, Path, description = "User id to revoke"),
    ),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access revoked", body = ShareOutcomeResponse),
        (status = 404, description = "Unknown budget, not shared with that user, or caller is not the owner"),
    )
)]
pub async fn remove_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((budget_id, target_user_id)): Path<(String, String)>,
) -> Result<Json<ShareOutcomeResponse>, ApiError> {
    BudgetRepository::new(&state.db).remove_shared_user(
        &budget_id,
        &user.user_id,
        &target_user_id,
    )?;
    Ok(Json(ShareOutcomeResponse { shared: false }))
}
