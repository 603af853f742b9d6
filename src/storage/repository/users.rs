// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! User repository: credentials and password-reset token state.
//!
//! Emails are normalized (NFKC + lowercase) before they touch the uniqueness
//! index, so `Alice@Example.com` and `alice@example.com` are one account.
//!
//! The reset-token fields form a small state machine on the user record:
//! both are set together by [`UserRepository::set_reset_token`] and cleared
//! together by [`UserRepository::redeem_reset_token`], which also writes the
//! new password hash in the same transaction. Expiry is checked lazily at
//! redemption time; there is no background sweep.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use super::super::db::{LedgerDb, StoreError, StoreResult, USERS, USER_EMAIL_INDEX};

/// Normalize an email address for storage and uniqueness checks.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}

/// Stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Unique identifier for this user.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Normalized email address (unique).
    pub email: String,
    /// Argon2 PHC-format password hash.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Pending password-reset token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    /// Expiry of the pending reset token. Set and cleared with `reset_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_expires: Option<DateTime<Utc>>,
}

impl StoredUser {
    /// Create a new user record. The email must already be normalized.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
            reset_token: None,
            reset_expires: None,
        }
    }
}

/// Repository for user operations on the ledger database.
pub struct UserRepository<'a> {
    db: &'a LedgerDb,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a LedgerDb) -> Self {
        Self { db }
    }

    /// Persist a new user. Fails with a conflict if the email is taken.
    pub fn create(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.db.begin_write()?;
        {
            let mut index = write_txn.open_table(USER_EMAIL_INDEX)?;
            if index.get(user.email.as_str())?.is_some() {
                return Err(StoreError::Conflict("Email already exists!".to_string()));
            }
            index.insert(user.email.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by id.
    pub fn get(&self, user_id: &str) -> StoreResult<StoredUser> {
        let read_txn = self.db.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::not_found("User", user_id)),
        }
    }

    /// Look up a user by normalized email.
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.db.begin_read()?;
        let index = read_txn.open_table(USER_EMAIL_INDEX)?;

        let user_id = match index.get(email)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Update name, email and optionally the password hash.
    ///
    /// Returns whether anything actually changed, so the API can report
    /// `updated: false` for a no-op write.
    pub fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> StoreResult<bool> {
        let write_txn = self.db.db.begin_write()?;
        let modified;
        {
            let mut users = write_txn.open_table(USERS)?;
            let existing = {
                let value = users
                    .get(user_id)?
                    .ok_or_else(|| StoreError::not_found("User", user_id))?;
                value.value().to_vec()
            };
            let mut user: StoredUser = serde_json::from_slice(&existing)?;

            let mut index = write_txn.open_table(USER_EMAIL_INDEX)?;
            if user.email != email {
                let claimed = index
                    .get(email)?
                    .map(|value| value.value().to_string())
                    .is_some_and(|claimant| claimant != user_id);
                if claimed {
                    return Err(StoreError::Conflict("Email already claimed!".to_string()));
                }
                index.remove(user.email.as_str())?;
                index.insert(email, user_id)?;
            }

            modified = user.name != name
                || user.email != email
                || password_hash.is_some_and(|hash| user.password_hash != hash);

            user.name = name.to_string();
            user.email = email.to_string();
            if let Some(hash) = password_hash {
                user.password_hash = hash.to_string();
            }

            let json = serde_json::to_vec(&user)?;
            users.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(modified)
    }

    /// Store a pending reset token and its expiry on the user record.
    ///
    /// A repeat request overwrites the previous pending token.
    pub fn set_reset_token(
        &self,
        user_id: &str,
        token: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let existing = {
                let value = users
                    .get(user_id)?
                    .ok_or_else(|| StoreError::not_found("User", user_id))?;
                value.value().to_vec()
            };
            let mut user: StoredUser = serde_json::from_slice(&existing)?;
            user.reset_token = Some(token.to_string());
            user.reset_expires = Some(expires);

            let json = serde_json::to_vec(&user)?;
            users.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Redeem a reset token: verify it matches a pending token whose expiry is
    /// strictly in the future, store the new password hash and clear both
    /// token fields, all in one write transaction. This makes the token
    /// single-use even under concurrent redemption attempts.
    ///
    /// Any failure (unknown token, expired token) reports the same not-found
    /// error so callers cannot tell the branches apart.
    pub fn redeem_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> StoreResult<StoredUser> {
        let write_txn = self.db.db.begin_write()?;
        let updated;
        {
            let mut users = write_txn.open_table(USERS)?;

            let mut matched: Option<StoredUser> = None;
            {
                for entry in users.iter()? {
                    let (_, value) = entry?;
                    let user: StoredUser = serde_json::from_slice(value.value())?;
                    if user.reset_token.as_deref() == Some(token) {
                        matched = Some(user);
                        break;
                    }
                }
            }

            let mut user =
                matched.ok_or_else(|| StoreError::not_found("Reset token", "presented"))?;
            let expires = user
                .reset_expires
                .ok_or_else(|| StoreError::not_found("Reset token", "presented"))?;
            if expires <= now {
                return Err(StoreError::not_found("Reset token", "presented"));
            }

            user.password_hash = new_password_hash.to_string();
            user.reset_token = None;
            user.reset_expires = None;

            let json = serde_json::to_vec(&user)?;
            users.insert(user.id.as_str(), json.as_slice())?;
            updated = user;
        }
        write_txn.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_user(email: &str) -> StoredUser {
        StoredUser::new(
            "Test Person".to_string(),
            normalize_email(email),
            "argon2-hash".to_string(),
        )
    }

    #[test]
    fn normalize_email_folds_case_and_width() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("Ｕser@Example.Com"), "user@example.com");
    }

    #[test]
    fn create_and_get_user() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);

        let user = sample_user("alice@example.com");
        repo.create(&user).unwrap();

        let retrieved = repo.get(&user.id).unwrap();
        assert_eq!(retrieved.email, "alice@example.com");
        assert!(retrieved.reset_token.is_none());
    }

    #[test]
    fn duplicate_email_conflicts() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);

        repo.create(&sample_user("alice@example.com")).unwrap();
        let err = repo.create(&sample_user("Alice@Example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn find_by_email_misses_unknown_address() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn update_profile_reports_modification() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let user = sample_user("alice@example.com");
        repo.create(&user).unwrap();

        let modified = repo
            .update_profile(&user.id, "Renamed Person", "alice@example.com", None)
            .unwrap();
        assert!(modified);

        // Same values again is a no-op.
        let modified = repo
            .update_profile(&user.id, "Renamed Person", "alice@example.com", None)
            .unwrap();
        assert!(!modified);
    }

    #[test]
    fn update_profile_rejects_claimed_email() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let alice = sample_user("alice@example.com");
        let bob = sample_user("bob@example.com");
        repo.create(&alice).unwrap();
        repo.create(&bob).unwrap();

        let err = repo
            .update_profile(&bob.id, &bob.name, "alice@example.com", None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn update_profile_can_move_to_new_email() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let user = sample_user("alice@example.com");
        repo.create(&user).unwrap();

        repo.update_profile(&user.id, &user.name, "alice2@example.com", None)
            .unwrap();

        assert!(repo.find_by_email("alice@example.com").unwrap().is_none());
        let moved = repo.find_by_email("alice2@example.com").unwrap().unwrap();
        assert_eq!(moved.id, user.id);
    }

    #[test]
    fn reset_token_redeems_exactly_once() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let user = sample_user("alice@example.com");
        repo.create(&user).unwrap();

        let now = Utc::now();
        repo.set_reset_token(&user.id, "tok-1", now + Duration::hours(1))
            .unwrap();

        let updated = repo.redeem_reset_token("tok-1", now, "new-hash").unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert!(updated.reset_token.is_none());
        assert!(updated.reset_expires.is_none());

        // The same token cannot be used again.
        let err = repo.redeem_reset_token("tok-1", now, "other-hash").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn expired_reset_token_is_rejected() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let user = sample_user("alice@example.com");
        repo.create(&user).unwrap();

        let now = Utc::now();
        repo.set_reset_token(&user.id, "tok-2", now - Duration::seconds(1))
            .unwrap();

        let err = repo.redeem_reset_token("tok-2", now, "new-hash").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        // The old credentials are untouched.
        let unchanged = repo.get(&user.id).unwrap();
        assert_eq!(unchanged.password_hash, "argon2-hash");
    }

    #[test]
    fn unknown_reset_token_is_rejected() {
        let (db, _dir) = temp_db();
        let repo = UserRepository::new(&db);
        let err = repo
            .redeem_reset_token("missing", Utc::now(), "hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
