// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenService;
use crate::mailer::Mailer;
use crate::storage::LedgerDb;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<LedgerDb>,
    pub tokens: TokenService,
    pub mailer: Mailer,
    pub public_hostname: String,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(db: Arc<LedgerDb>, tokens: TokenService) -> Self {
        Self {
            db,
            tokens,
            mailer: Mailer::disabled(),
            public_hostname: "http://localhost:8080/".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_public_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.public_hostname = hostname.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Fresh state over a temporary database for handler tests.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = LedgerDb::open(&dir.path().join("ledger.redb")).expect("open test db");
    let state = AppState::new(Arc::new(db), TokenService::new("test-secret"));
    (state, dir)
}
