// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Session-token claims and authenticated user representation.

use serde::{Deserialize, Serialize};

/// Claims carried by a signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id the token was issued for.
    pub sub: String,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

/// Authenticated caller information extracted from a verified session token.
///
/// This is the type handlers receive; everything else about the user is
/// re-read from the store when needed, since profile data and sharing
/// membership can change between requests.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Canonical user id (the token's `sub` claim).
    pub user_id: String,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}
