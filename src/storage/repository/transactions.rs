// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Transaction repository.
//!
//! Every operation authorizes against the *parent budget* of the transaction,
//! never the transaction id alone. Creating a transaction inserts the record
//! and appends its id to the budget's collection in one write transaction;
//! deletion is the exact inverse. A transaction id that exists but belongs to
//! a different budget than the one named by the caller is reported as
//! not-found.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::access::{AccessEnforcer, AccessLevel};
use super::super::db::{LedgerDb, StoreError, StoreResult, BUDGETS, TRANSACTIONS};
use super::budgets::StoredBudget;

/// Stored transaction record. Belongs to exactly one budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Unique identifier for this transaction.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Signed monetary amount.
    pub amount: Decimal,
    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
    /// Owning budget id.
    pub budget: String,
}

impl StoredTransaction {
    pub fn new(name: String, amount: Decimal, budget_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            amount,
            created_at: Utc::now(),
            budget: budget_id,
        }
    }
}

/// Repository for transaction operations on the ledger database.
pub struct TransactionRepository<'a> {
    db: &'a LedgerDb,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(db: &'a LedgerDb) -> Self {
        Self { db }
    }

    /// List a budget's transactions in insertion order.
    pub fn list_for_budget(
        &self,
        budget_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<StoredTransaction>> {
        let read_txn = self.db.db.begin_read()?;
        let budgets = read_txn.open_table(BUDGETS)?;
        let budget = load_budget(&budgets, budget_id)?;
        budget.verify_access(user_id, AccessLevel::Read)?;

        let txs = read_txn.open_table(TRANSACTIONS)?;
        let mut transactions = Vec::with_capacity(budget.transactions.len());
        for tx_id in &budget.transactions {
            match txs.get(tx_id.as_str())? {
                Some(value) => transactions.push(serde_json::from_slice(value.value())?),
                None => {
                    tracing::warn!(%budget_id, %tx_id, "dangling transaction id");
                }
            }
        }
        Ok(transactions)
    }

    /// Persist a new transaction and append it to its budget, atomically.
    pub fn create(&self, user_id: &str, tx: &StoredTransaction) -> StoreResult<()> {
        let json = serde_json::to_vec(tx)?;

        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let mut budget = load_budget(&budgets, &tx.budget)?;
            budget.verify_access(user_id, AccessLevel::Write)?;

            let mut txs = write_txn.open_table(TRANSACTIONS)?;
            txs.insert(tx.id.as_str(), json.as_slice())?;

            budget.transactions.push(tx.id.clone());
            let budget_json = serde_json::to_vec(&budget)?;
            budgets.insert(budget.id.as_str(), budget_json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a single transaction within a budget.
    pub fn get(
        &self,
        budget_id: &str,
        tx_id: &str,
        user_id: &str,
    ) -> StoreResult<StoredTransaction> {
        let read_txn = self.db.db.begin_read()?;
        let budgets = read_txn.open_table(BUDGETS)?;
        let budget = load_budget(&budgets, budget_id)?;
        budget.verify_access(user_id, AccessLevel::Read)?;

        let txs = read_txn.open_table(TRANSACTIONS)?;
        load_transaction(&txs, budget_id, tx_id)
    }

    /// Update a transaction's name and amount.
    pub fn update(
        &self,
        user_id: &str,
        budget_id: &str,
        tx_id: &str,
        name: String,
        amount: Decimal,
    ) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let budgets = write_txn.open_table(BUDGETS)?;
            let budget = load_budget(&budgets, budget_id)?;
            budget.verify_access(user_id, AccessLevel::Write)?;

            let mut txs = write_txn.open_table(TRANSACTIONS)?;
            let mut tx = load_transaction(&txs, budget_id, tx_id)?;
            tx.name = name;
            tx.amount = amount;

            let json = serde_json::to_vec(&tx)?;
            txs.insert(tx_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete a transaction and pull its id from the budget, atomically.
    pub fn delete(&self, user_id: &str, budget_id: &str, tx_id: &str) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let mut budget = load_budget(&budgets, budget_id)?;
            budget.verify_access(user_id, AccessLevel::Write)?;

            let mut txs = write_txn.open_table(TRANSACTIONS)?;
            // Confirm the transaction lives under this budget before touching
            // anything.
            let _ = load_transaction(&txs, budget_id, tx_id)?;
            txs.remove(tx_id)?;

            budget.transactions.retain(|id| id != tx_id);
            let budget_json = serde_json::to_vec(&budget)?;
            budgets.insert(budget.id.as_str(), budget_json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Read and deserialize a budget out of an open table.
fn load_budget(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    budget_id: &str,
) -> StoreResult<StoredBudget> {
    let bytes = {
        let value = table
            .get(budget_id)?
            .ok_or_else(|| StoreError::not_found("Budget", budget_id))?;
        value.value().to_vec()
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a transaction and confirm it belongs to the named budget.
fn load_transaction(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    budget_id: &str,
    tx_id: &str,
) -> StoreResult<StoredTransaction> {
    let bytes = {
        let value = table
            .get(tx_id)?
            .ok_or_else(|| StoreError::not_found("Transaction", tx_id))?;
        value.value().to_vec()
    };
    let tx: StoredTransaction = serde_json::from_slice(&bytes)?;
    if tx.budget != budget_id {
        return Err(StoreError::not_found("Transaction", tx_id));
    }
    Ok(tx)
}
