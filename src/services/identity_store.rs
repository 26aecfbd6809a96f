//! Owner and customer accounts, plus the owner's bank account.

use crate::{
    models::user::{BankAccount, BankDetails, Customer, Owner, OwnerDetails},
    services::StoreResult,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_owner(&self, id: Uuid) -> StoreResult<Option<Owner>>;

    async fn find_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;

    /// Overwrite the editable fields. `None` if the owner does not exist.
    async fn update_owner(&self, id: Uuid, details: &OwnerDetails) -> StoreResult<Option<Owner>>;

    /// Returns whether the owner existed.
    async fn delete_owner(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_bank_account(&self, owner_id: Uuid) -> StoreResult<Option<BankAccount>>;

    /// Create or replace the owner's bank account.
    async fn upsert_bank_account(
        &self,
        owner_id: Uuid,
        details: &BankDetails,
    ) -> StoreResult<BankAccount>;

    async fn delete_bank_account(&self, owner_id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct SqliteIdentityStore {
    db: Arc<SqlitePool>,
}

impl SqliteIdentityStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_owner(&self, id: Uuid) -> StoreResult<Option<Owner>> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, first_name, last_name, email, phone, pan FROM owners WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(owner)
    }

    async fn find_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, phone FROM customers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(customer)
    }

    async fn update_owner(&self, id: Uuid, details: &OwnerDetails) -> StoreResult<Option<Owner>> {
        let owner = sqlx::query_as::<_, Owner>(
            "UPDATE owners
             SET first_name = ?, last_name = ?, email = ?, phone = ?, pan = ?
             WHERE id = ?
             RETURNING id, first_name, last_name, email, phone, pan",
        )
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.pan)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(owner)
    }

    async fn delete_owner(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM owners WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_bank_account(&self, owner_id: Uuid) -> StoreResult<Option<BankAccount>> {
        let account = sqlx::query_as::<_, BankAccount>(
            "SELECT owner_id, name, account_number, ifsc, updated_at
             FROM bank_accounts WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(account)
    }

    async fn upsert_bank_account(
        &self,
        owner_id: Uuid,
        details: &BankDetails,
    ) -> StoreResult<BankAccount> {
        let account = sqlx::query_as::<_, BankAccount>(
            "INSERT INTO bank_accounts (owner_id, name, account_number, ifsc, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(owner_id) DO UPDATE SET
                name = excluded.name,
                account_number = excluded.account_number,
                ifsc = excluded.ifsc,
                updated_at = excluded.updated_at
             RETURNING owner_id, name, account_number, ifsc, updated_at",
        )
        .bind(owner_id)
        .bind(&details.name)
        .bind(&details.account_number)
        .bind(&details.ifsc)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        Ok(account)
    }

    async fn delete_bank_account(&self, owner_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bank_accounts WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
