// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Budget endpoints.
//!
//! Every handler re-derives the caller's authorization from the stored
//! budget; list and single-budget responses use the same summing code, so a
//! budget's total is identical wherever it appears.

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{BudgetView, DeletedResponse, RecurringType, UpdatedResponse},
    state::AppState,
    storage::{BudgetFields, BudgetRepository, StoredBudget},
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Payload accepted by budget create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub name: String,
    pub recurring_type: RecurringType,
    #[serde(default)]
    pub recurring_amount: Option<Decimal>,
    #[serde(default)]
    pub recurring_custom: Vec<u32>,
}

impl BudgetRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > 255 {
            return Err(ApiError::bad_request(
                "Budget name must be between 1 and 255 characters",
            ));
        }
        if let Some(amount) = self.recurring_amount {
            if amount <= Decimal::ZERO {
                return Err(ApiError::bad_request("Recurring amount must be positive"));
            }
        }
        match self.recurring_type {
            RecurringType::CustomDaily if self.recurring_custom.is_empty() => Err(
                ApiError::bad_request("CustomDaily budgets need a custom schedule"),
            ),
            RecurringType::CustomDaily => Ok(()),
            _ if !self.recurring_custom.is_empty() => Err(ApiError::bad_request(
                "Custom schedules only apply to CustomDaily budgets",
            )),
            _ => Ok(()),
        }
    }
}

/// Response wrapping one budget.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BudgetResponse {
    pub budget: BudgetView,
}

/// Response wrapping all budgets visible to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BudgetListResponse {
    pub budgets: Vec<BudgetView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List every budget the caller owns or has been invited into, with totals.
#[utoipa::path(
    get,
    path = "/api/budget",
    tag = "Budgets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Visible budgets with computed totals", body = BudgetListResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_budgets(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BudgetListResponse>, ApiError> {
    let summarized = BudgetRepository::new(&state.db).summarized_for_user(&user.user_id)?;
    let budgets = summarized
        .into_iter()
        .map(|(budget, total)| BudgetView::from_stored(budget, total))
        .collect();
    Ok(Json(BudgetListResponse { budgets }))
}

/// Get one budget with its total.
#[utoipa::path(
    get,
    path = "/api/budget/{budget_id}",
    params(("budget_id" = String, Path, description = "Budget id")),
    tag = "Budgets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Budget with computed total", body = BudgetResponse),
        (status = 404, description = "Unknown budget or no access"),
    )
)]
pub async fn get_budget(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let (budget, total) = BudgetRepository::new(&state.db).summarize(&budget_id, &user.user_id)?;
    Ok(Json(BudgetResponse {
        budget: BudgetView::from_stored(budget, total),
    }))
}

/// Create a budget owned by the caller.
#[utoipa::path(
    post,
    path = "/api/budget",
    request_body = BudgetRequest,
    tag = "Budgets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Budget created", body = BudgetResponse),
        (status = 400, description = "Validation failure"),
    )
)]
pub async fn create_budget(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<BudgetRequest>,
) -> Result<Json<BudgetResponse>, ApiError> {
    request.validate()?;

    let budget = StoredBudget::new(
        user.user_id,
        request.name.trim().to_string(),
        request.recurring_type,
        request.recurring_amount,
        request.recurring_custom,
    );
    BudgetRepository::new(&state.db).create(&budget)?;

    Ok(Json(BudgetResponse {
        budget: BudgetView::from_stored(budget, Decimal::ZERO),
    }))
}

/// Update a budget's fields. Owner or shared user.
#[utoipa::path(
    put,
    path = "/api/budget/{budget_id}",
    params(("budget_id" = String, Path, description = "Budget id")),
    request_body = BudgetRequest,
    tag = "Budgets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Budget updated", body = UpdatedResponse),
        (status = 404, description = "Unknown budget or no access"),
    )
)]
pub async fn update_budget(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
    Json(request): Json<BudgetRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    request.validate()?;

    BudgetRepository::new(&state.db).update(
        &budget_id,
        &user.user_id,
        BudgetFields {
            name: request.name.trim().to_string(),
            recurring_type: request.recurring_type,
            recurring_amount: request.recurring_amount,
            recurring_custom: request.recurring_custom,
        },
    )?;

    Ok(Json(UpdatedResponse { updated: true }))
}

/// Delete a budget and all of its transactions. Owner or shared user.
#[utoipa::path(
    delete,
    path = "/api/budget/{budget_id}",
    params(("budget_id" = String, Path, description = "Budget id")),
    tag = "Budgets",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Budget and owned transactions deleted", body = DeletedResponse),
        (status = 404, description = "Unknown budget or no access"),
    )
)]
pub async fn delete_budget(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    BudgetRepository::new(&state.db).delete(&budget_id, &user.user_id)?;
    Ok(Json(DeletedResponse { deleted: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transactions::{create_transaction, TransactionRequest};
    use crate::auth::AuthenticatedUser;
    use crate::state::test_state;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;

    fn auth(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.to_string(),
        })
    }

    fn rent_request() -> BudgetRequest {
        BudgetRequest {
            name: "Rent".to_string(),
            recurring_type: RecurringType::Monthly,
            recurring_amount: None,
            recurring_custom: Vec::new(),
        }
    }

    async fn create_rent_budget(state: &AppState, owner: &str) -> String {
        let Json(response) = create_budget(auth(owner), State(state.clone()), Json(rent_request()))
            .await
            .expect("budget created");
        response.budget.id
    }

    async fn add_transaction(state: &AppState, user: &str, budget_id: &str, amount: Decimal) {
        create_transaction(
            auth(user),
            State(state.clone()),
            Path(budget_id.to_string()),
            Json(TransactionRequest {
                name: "Entry".to_string(),
                amount,
            }),
        )
        .await
        .expect("transaction created");
    }

    #[tokio::test]
    async fn create_and_get_budget_with_total() {
        let (state, _dir) = test_state();
        let budget_id = create_rent_budget(&state, "owner").await;

        add_transaction(&state, "owner", &budget_id, dec!(-500.005)).await;
        add_transaction(&state, "owner", &budget_id, dec!(100)).await;

        let Json(response) = get_budget(auth("owner"), State(state.clone()), Path(budget_id))
            .await
            .expect("budget fetched");
        assert_eq!(response.budget.total_transactions, dec!(-400.01));
    }

    #[tokio::test]
    async fn list_and_single_fetch_agree_on_totals() {
        let (state, _dir) = test_state();
        let budget_id = create_rent_budget(&state, "owner").await;
        add_transaction(&state, "owner", &budget_id, dec!(0.004)).await;
        add_transaction(&state, "owner", &budget_id, dec!(0.004)).await;

        let Json(single) = get_budget(
            auth("owner"),
            State(state.clone()),
            Path(budget_id.clone()),
        )
        .await
        .unwrap();

        let Json(list) = list_budgets(auth("owner"), State(state.clone()))
            .await
            .unwrap();
        let listed = list
            .budgets
            .iter()
            .find(|b| b.id == budget_id)
            .expect("budget listed");

        assert_eq!(single.budget.total_transactions, dec!(0.01));
        assert_eq!(listed.total_transactions, single.budget.total_transactions);
    }

    #[tokio::test]
    async fn outsider_cannot_see_or_touch_budget() {
        let (state, _dir) = test_state();
        let budget_id = create_rent_budget(&state, "owner").await;

        let err = get_budget(
            auth("stranger"),
            State(state.clone()),
            Path(budget_id.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = update_budget(
            auth("stranger"),
            State(state.clone()),
            Path(budget_id.clone()),
            Json(rent_request()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(list) = list_budgets(auth("stranger"), State(state.clone()))
            .await
            .unwrap();
        assert!(list.budgets.is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_and_leaves_not_found() {
        let (state, _dir) = test_state();
        let budget_id = create_rent_budget(&state, "owner").await;
        add_transaction(&state, "owner", &budget_id, dec!(10)).await;

        let Json(deleted) = delete_budget(
            auth("owner"),
            State(state.clone()),
            Path(budget_id.clone()),
        )
        .await
        .unwrap();
        assert!(deleted.deleted);

        // A deleted budget reports not-found, never an empty ledger.
        let err = get_budget(auth("owner"), State(state.clone()), Path(budget_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_covers_name_amount_and_custom_schedule() {
        let (state, _dir) = test_state();

        let mut empty_name = rent_request();
        empty_name.name = "  ".to_string();
        let err = create_budget(auth("owner"), State(state.clone()), Json(empty_name))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut negative_amount = rent_request();
        negative_amount.recurring_amount = Some(dec!(-5));
        let err = create_budget(auth("owner"), State(state.clone()), Json(negative_amount))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut custom_without_schedule = rent_request();
        custom_without_schedule.recurring_type = RecurringType::CustomDaily;
        let err = create_budget(
            auth("owner"),
            State(state.clone()),
            Json(custom_without_schedule),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut schedule_without_custom = rent_request();
        schedule_without_custom.recurring_custom = vec![1, 15];
        let err = create_budget(
            auth("owner"),
            State(state.clone()),
            Json(schedule_without_custom),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut valid_custom = rent_request();
        valid_custom.recurring_type = RecurringType::CustomDaily;
        valid_custom.recurring_custom = vec![1, 15];
        create_budget(auth("owner"), State(state.clone()), Json(valid_custom))
            .await
            .expect("custom daily budget is valid");
    }
}
