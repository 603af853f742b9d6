// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Transaction endpoints, nested under their budget.
//!
//! Authorization always runs against the parent budget named in the path;
//! a transaction id is never trusted on its own.

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
    models::{DeletedResponse, TransactionView, UpdatedResponse},
    state::AppState,
    storage::{StoredTransaction, TransactionRepository},
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Payload accepted by transaction create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionRequest {
    pub name: String,
    pub amount: Decimal,
}

impl TransactionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > 255 {
            return Err(ApiError::bad_request(
                "Transaction name must be between 1 and 255 characters",
            ));
        }
        Ok(())
    }
}

/// Response wrapping one transaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction: TransactionView,
}

/// Response wrapping a budget's transactions.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List a budget's transactions.
#[utoipa::path(
    get,
    path = "/api/budget/{budget_id}/transactions",
    params(("budget_id" = String, Path, description = "Budget id")),
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transactions in insertion order", body = TransactionListResponse),
        (status = 404, description = "Unknown budget or no access"),
    )
)]
pub async fn list_transactions(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let transactions = TransactionRepository::new(&state.db)
        .list_for_budget(&budget_id, &user.user_id)?
        .into_iter()
        .map(TransactionView::from)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}

/// Record a transaction against a budget.
#[utoipa::path(
    post,
    path = "/api/budget/{budget_id}/transactions",
    params(("budget_id" = String, Path, description = "Budget id")),
    request_body = TransactionRequest,
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction recorded", body = TransactionResponse),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Unknown budget or no access"),
    )
)]
pub async fn create_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(budget_id): Path<String>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    request.validate()?;

    let tx = StoredTransaction::new(request.name.trim().to_string(), request.amount, budget_id);
    TransactionRepository::new(&state.db).create(&user.user_id, &tx)?;

    Ok(Json(TransactionResponse {
        transaction: tx.into(),
    }))
}

/// Get one transaction.
#[utoipa::path(
    get,
    path = "/api/budget/{budget_id}/transactions/{transaction_id}",
    params(
        ("budget_id" = String, Path, description = "Budget id"),
        ("transaction_id" = String, Path, description = "Transaction id"),
    ),
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction", body = TransactionResponse),
        (status = 404, description = "Unknown budget/transaction or no access"),
    )
)]
pub async fn get_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((budget_id, transaction_id)): Path<(String, String)>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = TransactionRepository::new(&state.db).get(&budget_id, &transaction_id, &user.user_id)?;
    Ok(Json(TransactionResponse {
        transaction: tx.into(),
    }))
}

/// Update a transaction's name and amount.
#[utoipa::path(
    put,
    path = "/api/budget/{budget_id}/transactions/{transaction_id}",
    params(
        ("budget_id" = String, Path, description = "Budget id"),
        ("transaction_id" = String, Path, description = "Transaction id"),
    ),
    request_body = TransactionRequest,
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction updated", body = UpdatedResponse),
        (status = 404, description = "Unknown budget/transaction or no access"),
    )
)]
pub async fn update_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((budget_id, transaction_id)): Path<(String, String)>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    request.validate()?;

    TransactionRepository::new(&state.db).update(
        &user.user_id,
        &budget_id,
        &transaction_id,
        request.name.trim().to_string(),
        request.amount,
    )?;

    Ok(Json(UpdatedResponse { updated: true }))
}

/// Delete a transaction.
#[utoipa::path(
    delete,
    path = "/api/budget/{budget_id}/transactions/{transaction_id}",
    params(
        ("budget_id" = String, Path, description = "Budget id"),
        ("transaction_id" = String, Path, description = "Transaction id"),
    ),
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction deleted", body = DeletedResponse),
        (status = 404, description = "Unknown budget/transaction or no access"),
    )
)]
pub async fn delete_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((budget_id, transaction_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    TransactionRepository::new(&state.db).delete(&user.user_id, &budget_id, &transaction_id)?;
    Ok(Json(DeletedResponse { deleted: true }))
}
