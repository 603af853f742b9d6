// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! # API Data Models
//!
//! Shared request and response data structures used by the REST API. All
//! types derive `Serialize`/`Deserialize` and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation. Wire field names are camelCase, which
//! is the contract the budgeting clients already speak.
//!
//! Endpoint-specific request types live next to their handlers in `api/`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::storage::{StoredBudget, StoredTransaction};

// =============================================================================
// Recurring Schedule
// =============================================================================

/// Recurrence schedule of a budget.
///
/// `CustomDaily` budgets carry an ordered list of day-offsets in
/// `recurringCustom`; the other variants repeat on their named cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RecurringType {
    Monthly,
    Weekly,
    Daily,
    Yearly,
    CustomDaily,
}

// =============================================================================
// Budget Models
// =============================================================================

/// Budget as returned by the API, including the computed transaction total.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    /// Unique identifier for this budget.
    pub id: String,
    /// Owning user id.
    pub owner: String,
    /// Co-owner user ids with full read/write access.
    pub shared_users: Vec<String>,
    /// Display name.
    pub name: String,
    /// Recurrence schedule type.
    pub recurring_type: RecurringType,
    /// Recurring amount, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_amount: Option<Decimal>,
    /// Ordered day-offsets, only populated for `CustomDaily`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recurring_custom: Vec<u32>,
    /// When the budget was created.
    pub date_created: DateTime<Utc>,
    /// Sum of all transaction amounts, rounded once after accumulation.
    pub total_transactions: Decimal,
}

impl BudgetView {
    pub fn from_stored(budget: StoredBudget, total: Decimal) -> Self {
        Self {
            id: budget.id,
            owner: budget.owner,
            shared_users: budget.shared_users,
            name: budget.name,
            recurring_type: budget.recurring_type,
            recurring_amount: budget.recurring_amount,
            recurring_custom: budget.recurring_custom,
            date_created: budget.created_at,
            total_transactions: total,
        }
    }
}

// =============================================================================
// Transaction Models
// =============================================================================

/// Transaction as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Unique identifier for this transaction.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Signed monetary amount.
    pub amount: Decimal,
    /// When the transaction was recorded.
    pub date_created: DateTime<Utc>,
    /// Owning budget id.
    pub budget: String,
}

impl From<StoredTransaction> for TransactionView {
    fn from(tx: StoredTransaction) -> Self {
        Self {
            id: tx.id,
            name: tx.name,
            amount: tx.amount,
            date_created: tx.created_at,
            budget: tx.budget,
        }
    }
}

// =============================================================================
// Generic Responses
// =============================================================================

/// Human-readable outcome message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Outcome of an update operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdatedResponse {
    pub updated: bool,
}

/// Outcome of a delete operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// =============================================================================
// Field Validation
// =============================================================================

/// Minimal well-formedness check for email addresses: one `@`, a non-empty
/// local part, and a dotted domain. Anything stricter is the mail relay's
/// problem.
pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email.len() >= 6
        && !email.chars().any(char::is_whitespace)
        && matches!(
            email.split_once('@'),
            Some((local, domain))
                if !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
        );

    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request("A valid email address is required"))
    }
}
