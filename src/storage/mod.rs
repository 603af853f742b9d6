// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! # Ledger Storage Module
//!
//! Persistent storage for users, budgets and transactions on an embedded
//! [redb](https://docs.rs/redb) database.
//!
//! ## Consistency Model
//!
//! - A budget's `transactions` collection and the transaction records that
//!   point back at it are always mutated inside the same write transaction.
//! - Deleting a budget cascades to its transactions in that transaction.
//! - redb permits a single writer, so structural mutations are serialized;
//!   a concurrent transaction-create and budget-delete cannot interleave.
//! - Authorization for a mutation is re-derived *inside* the write
//!   transaction, so a sharing change cannot race the operation it gates.

pub mod access;
pub mod db;
pub mod repository;

pub use access::{AccessEnforcer, AccessLevel, SharedResource};
pub use db::{LedgerDb, StoreError, StoreResult};
pub use repository::{
    normalize_email, BudgetFields, BudgetRepository, StoredBudget, StoredTransaction, StoredUser,
    TransactionRepository, UserRepository,
};
