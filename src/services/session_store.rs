//! Server-side sessions keyed by the cookie token.
//!
//! Sessions are created by the login flow; this store only reads them, keeps
//! the pending flash message and tears them down.

use crate::{
    models::session::{Flash, FlashKind, SessionRow},
    services::StoreResult,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct SessionStore {
    db: Arc<SqlitePool>,
}

impl SessionStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn load(&self, token: &str) -> StoreResult<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token, user_id, role, flash_kind, flash_message
             FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await?;
        Ok(row)
    }

    /// Queue a flash, replacing any message not yet shown.
    pub async fn set_flash(&self, token: &str, flash: &Flash) -> StoreResult<()> {
        sqlx::query("UPDATE sessions SET flash_kind = ?, flash_message = ? WHERE token = ?")
            .bind(flash.kind.as_str())
            .bind(&flash.message)
            .bind(token)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Return the pending flash of `row` and clear it so it is shown once.
    pub async fn take_flash(&self, row: &SessionRow) -> StoreResult<Option<Flash>> {
        let (Some(kind), Some(message)) = (row.flash_kind.as_deref(), row.flash_message.as_ref())
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE sessions SET flash_kind = NULL, flash_message = NULL WHERE token = ?")
            .bind(&row.token)
            .execute(&*self.db)
            .await?;

        Ok(FlashKind::parse(kind).map(|kind| Flash {
            kind,
            message: message.clone(),
        }))
    }

    pub async fn destroy(&self, token: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Drop every session of a user, e.g. after the account is deleted.
    pub async fn destroy_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
