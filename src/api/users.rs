// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Account endpoints: registration, login, profile and the password-reset
//! flow.
//!
//! The forgot-password endpoint answers with one fixed acknowledgement no
//! matter whether the email resolves to an account, so responses cannot be
//! used to enumerate registered addresses. Reset-token failures are equally
//! uniform: unknown, mismatched and expired tokens all produce the same
//! message.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::{
    auth::{Auth, RESET_TOKEN_TTL_HOURS},
    error::ApiError,
    models::{validate_email, MessageResponse, UpdatedResponse},
    state::AppState,
    storage::{normalize_email, StoredUser, UserRepository},
};

const FORGOT_PASSWORD_ACK: &str = "If email address is found, a password reset link will be sent.";
const RESET_TOKEN_INVALID: &str = "Password reset token is invalid or has expired!";
const LOGIN_FAILED: &str = "Invalid email or password";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to register a new account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Registration response carrying the new user id.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: String,
}

/// Login credentials.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Login response with a fresh session token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: String,
    pub token: String,
    pub name: String,
    pub email: String,
}

/// Current profile data.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: String,
    pub name: String,
    pub email: String,
    pub date_created: DateTime<Utc>,
}

/// Profile update payload. The password is only changed when present.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateProfileRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        match &self.password {
            Some(password) => validate_password(password),
            None => Ok(()),
        }
    }
}

/// Request to start the password-reset flow.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request to complete the password-reset flow.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub verify_password: String,
}

impl ResetPasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_password(&self.new_password)?;
        if self.new_password != self.verify_password {
            return Err(ApiError::bad_request("Passwords do not match!"));
        }
        Ok(())
    }
}

// =============================================================================
// Field Validation
// =============================================================================

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().chars().count() < 6 {
        return Err(ApiError::bad_request("Name must be at least 6 characters"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 6 {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

// =============================================================================
// Password Hashing
// =============================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ApiError::internal("Failed to process password")
        })
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation failure or duplicate email"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = hash_password(&request.password)?;
    let user = StoredUser::new(request.name, email, password_hash);

    UserRepository::new(&state.db).create(&user)?;

    Ok(Json(RegisterResponse { user: user.id }))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Unknown email or wrong password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(&state.db);
    let user = repo
        .find_by_email(&normalize_email(&request.email))?
        .ok_or_else(|| ApiError::bad_request(LOGIN_FAILED))?;

    if !verify_password(&user.password_hash, &request.password) {
        return Err(ApiError::bad_request(LOGIN_FAILED));
    }

    let token = state.tokens.issue_session(&user.id).map_err(|e| {
        tracing::error!(error = %e, "session token issuance failed");
        ApiError::internal("Failed to issue session token")
    })?;

    Ok(Json(LoginResponse {
        user: user.id,
        token,
        name: user.name,
        email: user.email,
    }))
}

/// Get the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile data", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let stored = UserRepository::new(&state.db).get(&user.user_id)?;
    Ok(Json(ProfileResponse {
        user: stored.id,
        name: stored.name,
        email: stored.email,
        date_created: stored.created_at,
    }))
}

/// Update name, email and optionally the password.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Whether anything changed", body = UpdatedResponse),
        (status = 400, description = "Validation failure or email already claimed"),
    )
)]
pub async fn update_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = match &request.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let updated = UserRepository::new(&state.db).update_profile(
        &user.user_id,
        request.name.trim(),
        &email,
        password_hash.as_deref(),
    )?;

    Ok(Json(UpdatedResponse { updated }))
}

/// Start the password-reset flow.
///
/// Always acknowledges with the same body, whether or not the email matches
/// an account.
#[utoipa::path(
    post,
    path = "/api/forgotpassword",
    request_body = ForgotPasswordRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Generic acknowledgement", body = MessageResponse),
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_email(&request.email)?;

    let repo = UserRepository::new(&state.db);
    let Some(user) = repo.find_by_email(&normalize_email(&request.email))? else {
        return Ok(acknowledgement());
    };

    let issued_at = Utc::now();
    let token = state.tokens.reset_token(&user.id, &user.email, issued_at);
    let expires = issued_at + Duration::hours(RESET_TOKEN_TTL_HOURS);
    repo.set_reset_token(&user.id, &token, expires)?;

    let link = reset_link(&state.public_hostname, &token)?;
    if let Err(e) = state.mailer.send_reset_link(&user.email, &user.name, &link).await {
        // The acknowledgement must not change on delivery failure.
        tracing::warn!(error = %e, "failed to send password reset email");
    }

    Ok(acknowledgement())
}

/// Complete the password-reset flow with a pending token.
#[utoipa::path(
    post,
    path = "/api/reset_password",
    request_body = ResetPasswordRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or password mismatch"),
        (status = 422, description = "Password changed but confirmation email failed"),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    let password_hash = hash_password(&request.new_password)?;
    let repo = UserRepository::new(&state.db);
    let user = repo
        .redeem_reset_token(&request.token, Utc::now(), &password_hash)
        .map_err(|err| match err {
            // Unknown and expired tokens are deliberately indistinguishable.
            crate::storage::StoreError::NotFound { .. } => {
                ApiError::bad_request(RESET_TOKEN_INVALID)
            }
            other => other.into(),
        })?;

    // The password change is durable at this point; a failed confirmation
    // email is reported but never rolls it back.
    match state.mailer.send_reset_confirmation(&user.email, &user.name).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Password reset, please login using your new password.".to_string(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "failed to send reset confirmation email");
            Err(ApiError::unprocessable(
                "Password reset, however a confirmation email could not be sent.",
            ))
        }
    }
}

fn acknowledgement() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: FORGOT_PASSWORD_ACK.to_string(),
    })
}

fn reset_link(public_hostname: &str, token: &str) -> Result<String, ApiError> {
    let base = Url::parse(public_hostname).map_err(|e| {
        tracing::error!(error = %e, "invalid public hostname configuration");
        ApiError::internal("Invalid public hostname configuration")
    })?;
    let mut url = base.join("reset_password").map_err(|e| {
        tracing::error!(error = %e, "invalid public hostname configuration");
        ApiError::internal("Invalid public hostname configuration")
    })?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.to_string())
}
