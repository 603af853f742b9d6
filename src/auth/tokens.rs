// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Token issuance and verification.
//!
//! Two token kinds share the server secret:
//!
//! - **Session tokens** are HS256 JWTs carrying the user id; the [`crate::auth::Auth`]
//!   extractor verifies them on every protected request.
//! - **Reset tokens** are opaque HMAC-SHA256 digests over user-specific
//!   entropy (id, email, issuance instant). They are matched byte-for-byte
//!   against the value persisted on the user record, so they carry no claims
//!   of their own; expiry lives next to the stored value and is checked
//!   lazily at redemption time.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::Sha256;

use super::claims::SessionClaims;
use super::error::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Session tokens are valid for one day.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Reset tokens are valid for one hour from issuance.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies session and reset tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a session token for the given user.
    pub fn issue_session(&self, user_id: &str) -> Result<String, AuthError> {
        self.issue_session_at(user_id, Utc::now())
    }

    pub(crate) fn issue_session_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify a session token and return its claims.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        let token_data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        Ok(token_data.claims)
    }

    /// Derive an opaque reset token from user-specific entropy.
    ///
    /// The token is only as good as its stored copy: redemption compares it
    /// against the value persisted on the user record.
    pub fn reset_token(&self, user_id: &str, email: &str, issued_at: DateTime<Utc>) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        let nanos = issued_at.timestamp_nanos_opt().unwrap_or_default();
        mac.update(format!("{user_id}|{email}|{nanos}").as_bytes());
        Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
    }
}
