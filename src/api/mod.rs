// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod budgets;
pub mod health;
pub mod shares;
pub mod transactions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    let api_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/forgotpassword", post(users::forgot_password))
        .route("/reset_password", post(users::reset_password))
        .route(
            "/budget",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route(
            "/budget/{budget_id}",
            get(budgets::get_budget)
                .put(budgets::update_budget)
                .delete(budgets::delete_budget),
        )
        .route(
            "/budget/{budget_id}/share",
            get(shares::list_shares).post(shares::add_share),
        )
        .route(
            "/budget/{budget_id}/share/{user_id}",
            delete(shares::remove_share),
        )
        .route(
            "/budget/{budget_id}/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/budget/{budget_id}/transactions/{transaction_id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::register,
        users::login,
        users::get_profile,
        users::update_profile,
        users::forgot_password,
        users::reset_password,
        budgets::list_budgets,
        budgets::get_budget,
        budgets::create_budget,
        budgets::update_budget,
        budgets::delete_budget,
        shares::list_shares,
        shares::add_share,
        shares::remove_share,
        transactions::list_transactions,
        transactions::create_transaction,
        transactions::get_transaction,
        transactions::update_transaction,
        transactions::delete_transaction,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            crate::models::RecurringType,
            crate::models::BudgetView,
            crate::models::TransactionView,
            crate::models::MessageResponse,
            crate::models::UpdatedResponse,
            crate::models::DeletedResponse,
            users::RegisterRequest,
            users::RegisterResponse,
            users::LoginRequest,
            users::LoginResponse,
            users::ProfileResponse,
            users::UpdateProfileRequest,
            users::ForgotPasswordRequest,
            users::ResetPasswordRequest,
            budgets::BudgetRequest,
            budgets::BudgetResponse,
            budgets::BudgetListResponse,
            shares::ShareRequest,
            shares::SharedUserView,
            shares::SharedUsersResponse,
            shares::ShareOutcomeResponse,
            transactions::TransactionRequest,
            transactions::TransactionResponse,
            transactions::TransactionListResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Users", description = "Registration, login, profile and password reset"),
        (name = "Budgets", description = "Budget management with computed totals"),
        (name = "Sharing", description = "Budget sharing (owner only)"),
        (name = "Transactions", description = "Transactions nested under budgets"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
