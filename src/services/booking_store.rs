//! Booking rows keyed by property.

use crate::{models::booking::BookingRecord, services::StoreResult};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// All bookings for a property, in no particular order.
    async fn find_by_property(&self, property_id: Uuid) -> StoreResult<Vec<BookingRecord>>;

    /// Mark a booking approved if it belongs to `property_id`.
    /// Returns whether a booking matched.
    async fn set_approved(&self, booking_id: Uuid, property_id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct SqliteBookingStore {
    db: Arc<SqlitePool>,
}

impl SqliteBookingStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn find_by_property(&self, property_id: Uuid) -> StoreResult<Vec<BookingRecord>> {
        let rows = sqlx::query_as::<_, BookingRecord>(
            "SELECT id, customer_id, property_id, event_date, event_time, function_type,
                    created_at, approved
             FROM bookings WHERE property_id = ?",
        )
        .bind(property_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    async fn set_approved(&self, booking_id: Uuid, property_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE bookings SET approved = 1 WHERE id = ? AND property_id = ?")
                .bind(booking_id)
                .bind(property_id)
                .execute(&*self.db)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
