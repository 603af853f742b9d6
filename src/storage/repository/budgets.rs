// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Budget repository.
//!
//! Budgets own their transactions: `StoredBudget::transactions` always equals
//! the set of transaction records whose `budget` field points back at the
//! budget. Every mutation that touches both sides runs in one write
//! transaction, and authorization is re-checked inside that same transaction
//! so a concurrent sharing change cannot race a structural mutation.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RecurringType;
use crate::summary;

use super::super::access::{AccessEnforcer, AccessLevel, SharedResource};
use super::super::db::{LedgerDb, StoreError, StoreResult, BUDGETS, TRANSACTIONS, USERS};
use super::transactions::StoredTransaction;

/// Stored budget record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBudget {
    /// Unique identifier for this budget.
    pub id: String,
    /// Owning user id.
    pub owner: String,
    /// Co-owner user ids with full read/write access. Never contains the
    /// owner and never contains duplicates.
    pub shared_users: Vec<String>,
    /// Display name.
    pub name: String,
    /// Recurrence schedule type.
    pub recurring_type: RecurringType,
    /// Recurring amount, when configured.
    pub recurring_amount: Option<Decimal>,
    /// Ordered day-offsets, only meaningful for `CustomDaily`.
    pub recurring_custom: Vec<u32>,
    /// When the budget was created.
    pub created_at: DateTime<Utc>,
    /// Ordered ids of the transactions owned by this budget.
    pub transactions: Vec<String>,
}

impl StoredBudget {
    pub fn new(
        owner: String,
        name: String,
        recurring_type: RecurringType,
        recurring_amount: Option<Decimal>,
        recurring_custom: Vec<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner,
            shared_users: Vec::new(),
            name,
            recurring_type,
            recurring_amount,
            recurring_custom,
            created_at: Utc::now(),
            transactions: Vec::new(),
        }
    }
}

impl SharedResource for StoredBudget {
    fn owner_user_id(&self) -> &str {
        &self.owner
    }

    fn shared_user_ids(&self) -> &[String] {
        &self.shared_users
    }

    fn resource_name(&self) -> &'static str {
        "Budget"
    }
}

/// Mutable fields of a budget, as accepted by the update endpoint.
#[derive(Debug, Clone)]
pub struct BudgetFields {
    pub name: String,
    pub recurring_type: RecurringType,
    pub recurring_amount: Option<Decimal>,
    pub recurring_custom: Vec<u32>,
}

/// Repository for budget operations on the ledger database.
pub struct BudgetRepository<'a> {
    db: &'a LedgerDb,
}

impl<'a> BudgetRepository<'a> {
    pub fn new(db: &'a LedgerDb) -> Self {
        Self { db }
    }

    /// Persist a new budget.
    pub fn create(&self, budget: &StoredBudget) -> StoreResult<()> {
        let json = serde_json::to_vec(budget)?;
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            budgets.insert(budget.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a budget the user is allowed to see.
    pub fn get_authorized(
        &self,
        budget_id: &str,
        user_id: &str,
        level: AccessLevel,
    ) -> StoreResult<StoredBudget> {
        let read_txn = self.db.db.begin_read()?;
        let budgets = read_txn.open_table(BUDGETS)?;
        let budget = read_budget(&budgets, budget_id)?;
        budget.verify_access(user_id, level)?;
        Ok(budget)
    }

    /// Get a budget with its transaction total, authorized for the user.
    pub fn summarize(&self, budget_id: &str, user_id: &str) -> StoreResult<(StoredBudget, Decimal)> {
        let read_txn = self.db.db.begin_read()?;
        let budgets = read_txn.open_table(BUDGETS)?;
        let budget = read_budget(&budgets, budget_id)?;
        budget.verify_access(user_id, AccessLevel::Read)?;

        let txs = read_txn.open_table(TRANSACTIONS)?;
        let total = budget_total(&txs, &budget)?;
        Ok((budget, total))
    }

    /// All budgets visible to the user (owner or shared), each with its
    /// transaction total. A budget matching both predicates appears once.
    pub fn summarized_for_user(&self, user_id: &str) -> StoreResult<Vec<(StoredBudget, Decimal)>> {
        let read_txn = self.db.db.begin_read()?;
        let budgets = read_txn.open_table(BUDGETS)?;
        let txs = read_txn.open_table(TRANSACTIONS)?;

        let mut visible = Vec::new();
        for entry in budgets.iter()? {
            let (_, value) = entry?;
            let budget: StoredBudget = serde_json::from_slice(value.value())?;
            if budget.verify_access(user_id, AccessLevel::Read).is_ok() {
                let total = budget_total(&txs, &budget)?;
                visible.push((budget, total));
            }
        }

        // Oldest first, matching insertion order regardless of id ordering.
        visible.sort_by(|a, b| a.0.created_at.cmp(&b.0.created_at));
        Ok(visible)
    }

    /// Update the mutable fields of a budget. Owner or shared user.
    pub fn update(&self, budget_id: &str, user_id: &str, fields: BudgetFields) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let mut budget = read_budget(&budgets, budget_id)?;
            budget.verify_access(user_id, AccessLevel::Write)?;

            budget.name = fields.name;
            budget.recurring_type = fields.recurring_type;
            budget.recurring_amount = fields.recurring_amount;
            budget.recurring_custom = fields.recurring_custom;

            let json = serde_json::to_vec(&budget)?;
            budgets.insert(budget_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete a budget and cascade to every transaction it owns, atomically.
    pub fn delete(&self, budget_id: &str, user_id: &str) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let budget = read_budget(&budgets, budget_id)?;
            budget.verify_access(user_id, AccessLevel::Write)?;

            budgets.remove(budget_id)?;

            let mut txs = write_txn.open_table(TRANSACTIONS)?;
            for tx_id in &budget.transactions {
                txs.remove(tx_id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Share a budget with another user. Owner only.
    pub fn add_shared_user(
        &self,
        budget_id: &str,
        owner_id: &str,
        target_user_id: &str,
    ) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let mut budget = read_budget(&budgets, budget_id)?;
            budget.verify_owner(owner_id)?;

            if target_user_id == budget.owner {
                return Err(StoreError::Conflict(
                    "Cannot share a budget with its owner".to_string(),
                ));
            }
            if budget.shared_users.iter().any(|id| id == target_user_id) {
                return Err(StoreError::Conflict(
                    "Budget is already shared with this user".to_string(),
                ));
            }

            let users = write_txn.open_table(USERS)?;
            if users.get(target_user_id)?.is_none() {
                return Err(StoreError::not_found("User", target_user_id));
            }

            budget.shared_users.push(target_user_id.to_string());
            let json = serde_json::to_vec(&budget)?;
            budgets.insert(budget_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Revoke a user's access to a budget. Owner only.
    pub fn remove_shared_user(
        &self,
        budget_id: &str,
        owner_id: &str,
        target_user_id: &str,
    ) -> StoreResult<()> {
        let write_txn = self.db.db.begin_write()?;
        {
            let mut budgets = write_txn.open_table(BUDGETS)?;
            let mut budget = read_budget(&budgets, budget_id)?;
            budget.verify_owner(owner_id)?;

            let before = budget.shared_users.len();
            budget.shared_users.retain(|id| id != target_user_id);
            if budget.shared_users.len() == before {
                return Err(StoreError::not_found("Shared user", target_user_id));
            }

            let json = serde_json::to_vec(&budget)?;
            budgets.insert(budget_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Read and deserialize a budget out of an open table.
fn read_budget(
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

/// Fold the amounts of a budget's transactions into a rounded total.
fn budget_total(
    txs: &impl ReadableTable<&'static str, &'static [u8]>,
    budget: &StoredBudget,
) -> StoreResult<Decimal> {
    let mut amounts = Vec::with_capacity(budget.transactions.len());
    for tx_id in &budget.transactions {
        match txs.get(tx_id.as_str())? {
            Some(value) => {
                let tx: StoredTransaction = serde_json::from_slice(value.value())?;
                amounts.push(tx.amount);
            }
            None => {
                tracing::warn!(budget_id = %budget.id, %tx_id, "dangling transaction id");
            }
        }
    }
    Ok(summary::total_of(amounts))
}

#[cfg(test)]
mod tests {
    use super::super::transactions::TransactionRepository;
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_budget(owner: &str, name: &str) -> StoredBudget {
        StoredBudget::new(
            owner.to_string(),
            name.to_string(),
            RecurringType::Monthly,
            None,
            Vec::new(),
        )
    }

    fn insert_user(db: &LedgerDb, user_id: &str) {
        use super::super::users::{StoredUser, UserRepository};
        let mut user = StoredUser::new(
            "Shared Person".to_string(),
            format!("{user_id}@example.com"),
            "hash".to_string(),
        );
        user.id = user_id.to_string();
        UserRepository::new(db).create(&user).unwrap();
    }

    #[test]
    fn create_and_fetch_budget() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        let budget = sample_budget("user-1", "Rent");
        repo.create(&budget).unwrap();

        let fetched = repo
            .get_authorized(&budget.id, "user-1", AccessLevel::Read)
            .unwrap();
        assert_eq!(fetched.name, "Rent");
        assert!(fetched.transactions.is_empty());
    }

    #[test]
    fn missing_budget_is_not_found_not_empty() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        let err = repo
            .get_authorized("no-such-id", "user-1", AccessLevel::Read)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = repo.summarize("no-such-id", "user-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn shared_user_may_read_and_write_outsider_may_not() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        let mut budget = sample_budget("owner", "Groceries");
        budget.shared_users.push("friend".to_string());
        repo.create(&budget).unwrap();

        assert!(repo
            .get_authorized(&budget.id, "friend", AccessLevel::Write)
            .is_ok());
        let err = repo
            .get_authorized(&budget.id, "stranger", AccessLevel::Read)
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
    }

    #[test]
    fn summarize_rounds_after_accumulating() {
        let (db, _dir) = temp_db();
        let budgets = BudgetRepository::new(&db);
        let txs = TransactionRepository::new(&db);

        let budget = sample_budget("user-1", "Rent");
        budgets.create(&budget).unwrap();

        txs.create(
            "user-1",
            &StoredTransaction::new("Deposit".to_string(), dec!(-500.005), budget.id.clone()),
        )
        .unwrap();
        txs.create(
            "user-1",
            &StoredTransaction::new("Refund".to_string(), dec!(100), budget.id.clone()),
        )
        .unwrap();

        let (_, total) = budgets.summarize(&budget.id, "user-1").unwrap();
        assert_eq!(total, dec!(-400.01));
    }

    #[test]
    fn list_does_not_double_count_owner_in_shared_set() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        // A corrupt record listing the owner as shared user must still show
        // up exactly once.
        let mut budget = sample_budget("user-1", "Rent");
        budget.shared_users.push("user-1".to_string());
        repo.create(&budget).unwrap();

        let visible = repo.summarized_for_user("user-1").unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn list_covers_owned_and_shared_budgets() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        let own = sample_budget("me", "Mine");
        repo.create(&own).unwrap();

        let mut borrowed = sample_budget("someone-else", "Theirs");
        borrowed.shared_users.push("me".to_string());
        repo.create(&borrowed).unwrap();

        let invisible = sample_budget("someone-else", "Private");
        repo.create(&invisible).unwrap();

        let visible = repo.summarized_for_user("me").unwrap();
        let names: Vec<_> = visible.iter().map(|(b, _)| b.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Mine"));
        assert!(names.contains(&"Theirs"));
    }

    #[test]
    fn update_is_allowed_for_shared_user() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);

        let mut budget = sample_budget("owner", "Rent");
        budget.shared_users.push("friend".to_string());
        repo.create(&budget).unwrap();

        repo.update(
            &budget.id,
            "friend",
            BudgetFields {
                name: "Rent 2.0".to_string(),
                recurring_type: RecurringType::Weekly,
                recurring_amount: Some(dec!(120)),
                recurring_custom: Vec::new(),
            },
        )
        .unwrap();

        let updated = repo
            .get_authorized(&budget.id, "owner", AccessLevel::Read)
            .unwrap();
        assert_eq!(updated.name, "Rent 2.0");
        assert_eq!(updated.recurring_type, RecurringType::Weekly);
    }

    #[test]
    fn delete_cascades_to_transactions() {
        let (db, _dir) = temp_db();
        let budgets = BudgetRepository::new(&db);
        let txs = TransactionRepository::new(&db);

        let budget = sample_budget("user-1", "Rent");
        budgets.create(&budget).unwrap();
        let tx = StoredTransaction::new("Deposit".to_string(), dec!(10), budget.id.clone());
        txs.create("user-1", &tx).unwrap();

        budgets.delete(&budget.id, "user-1").unwrap();

        let err = budgets.summarize(&budget.id, "user-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = txs.list_for_budget(&budget.id, "user-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = txs.get(&budget.id, &tx.id, "user-1").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn sharing_is_owner_only() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);
        insert_user(&db, "friend");
        insert_user(&db, "other");

        let mut budget = sample_budget("owner", "Rent");
        budget.shared_users.push("friend".to_string());
        repo.create(&budget).unwrap();

        let err = repo
            .add_shared_user(&budget.id, "friend", "other")
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));

        repo.add_shared_user(&budget.id, "owner", "other").unwrap();
        let updated = repo
            .get_authorized(&budget.id, "owner", AccessLevel::Read)
            .unwrap();
        assert_eq!(updated.shared_users.len(), 2);
    }

    #[test]
    fn sharing_rejects_owner_duplicates_and_unknown_users() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);
        insert_user(&db, "friend");

        let budget = sample_budget("owner", "Rent");
        repo.create(&budget).unwrap();

        let err = repo
            .add_shared_user(&budget.id, "owner", "owner")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        repo.add_shared_user(&budget.id, "owner", "friend").unwrap();
        let err = repo
            .add_shared_user(&budget.id, "owner", "friend")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = repo
            .add_shared_user(&budget.id, "owner", "ghost")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn unshare_removes_access() {
        let (db, _dir) = temp_db();
        let repo = BudgetRepository::new(&db);
        insert_user(&db, "friend");

        let budget = sample_budget("owner", "Rent");
        repo.create(&budget).unwrap();
        repo.add_shared_user(&budget.id, "owner", "friend").unwrap();

        repo.remove_shared_user(&budget.id, "owner", "friend").unwrap();
        let err = repo
            .get_authorized(&budget.id, "friend", AccessLevel::Read)
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));

        let err = repo
            .remove_shared_user(&budget.id, "owner", "friend")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
