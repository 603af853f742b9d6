// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_email_index`: normalized email → user_id
//! - `budgets`: budget_id → serialized StoredBudget
//! - `transactions`: transaction_id → serialized StoredTransaction
//!
//! Every mutation that touches more than one record (transaction create and
//! delete, budget cascade delete, reset-token redemption) runs inside a single
//! write transaction. redb allows one writer at a time, which also serializes
//! structural mutations against each other.

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

/// user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Normalized email → user_id. Enforces email uniqueness.
pub(crate) const USER_EMAIL_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("user_email_index");

/// budget_id → serialized StoredBudget (JSON bytes).
pub(crate) const BUDGETS: TableDefinition<&str, &[u8]> = TableDefinition::new("budgets");

/// transaction_id → serialized StoredTransaction (JSON bytes).
pub(crate) const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    #[error("user {user_id} is not permitted to access {resource}")]
    PermissionDenied { user_id: String, resource: String },

    #[error("{0}")]
    Conflict(String),
}

impl StoreError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the embedded ledger database.
///
/// Repositories borrow this handle and open their own read/write transactions
/// per operation.
pub struct LedgerDb {
    pub(crate) db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAIL_INDEX)?;
            let _ = write_txn.open_table(BUDGETS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify the store can serve a read snapshot.
    pub fn health_check(&self) -> StoreResult<()> {
        let _ = self.db.begin_read()?;
        Ok(())
    }
}
