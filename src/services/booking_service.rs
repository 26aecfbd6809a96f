//! src/services/booking_service.rs
//!
//! BookingAggregator builds the two booking views an owner sees:
//! - **upcoming** (dashboard): events on or after today, earliest first, ties
//!   on the same date broken by the `HH:MM` start time;
//! - **history**: every booking, most recently submitted first.
//!
//! Each entry is joined with the customer who made it. A missing or failing
//! customer lookup leaves that entry unenriched instead of dropping it.

use crate::{
    models::{
        booking::{BookingEntry, BookingRecord},
        user::CustomerSummary,
    },
    services::{
        StoreError, booking_store::BookingStore, identity_store::IdentityStore,
        property_store::PropertyStore,
    },
};
use chrono::NaiveDate;
use futures::{StreamExt, stream};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("failed to look up property: {0}")]
    PropertyLookup(#[source] StoreError),
    #[error("failed to fetch bookings: {0}")]
    BookingLookup(#[source] StoreError),
    #[error("failed to update booking: {0}")]
    BookingWrite(#[source] StoreError),
    #[error("booking `{0}` not found")]
    NotFound(Uuid),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Keep events dated `today` or later, ordered by date then start time.
pub fn order_upcoming(records: Vec<BookingRecord>, today: NaiveDate) -> Vec<BookingRecord> {
    let mut upcoming: Vec<_> = records
        .into_iter()
        .filter(|record| record.event_date >= today)
        .collect();
    upcoming.sort_by(|a, b| {
        (a.event_date, a.event_time.as_str()).cmp(&(b.event_date, b.event_time.as_str()))
    });
    upcoming
}

/// Most recently submitted first.
pub fn order_history(mut records: Vec<BookingRecord>) -> Vec<BookingRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

#[derive(Clone)]
pub struct BookingAggregator {
    properties: Arc<dyn PropertyStore>,
    bookings: Arc<dyn BookingStore>,
    identities: Arc<dyn IdentityStore>,
}

impl BookingAggregator {
    pub fn new(
        properties: Arc<dyn PropertyStore>,
        bookings: Arc<dyn BookingStore>,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            properties,
            bookings,
            identities,
        }
    }

    pub async fn upcoming(
        &self,
        owner_id: Uuid,
        today: NaiveDate,
    ) -> BookingResult<Vec<BookingEntry>> {
        let Some((_, records)) = self.property_bookings(owner_id).await? else {
            return Ok(Vec::new());
        };
        Ok(self.join_customers(order_upcoming(records, today), None).await)
    }

    /// Entries whose customer is found also carry the venue price as
    /// `total_payment`.
    pub async fn history(&self, owner_id: Uuid) -> BookingResult<Vec<BookingEntry>> {
        let Some((price, records)) = self.property_bookings(owner_id).await? else {
            return Ok(Vec::new());
        };
        Ok(self.join_customers(order_history(records), Some(price)).await)
    }

    /// Approve a booking made against the owner's venue.
    pub async fn approve(&self, owner_id: Uuid, booking_id: Uuid) -> BookingResult<()> {
        let property = self
            .properties
            .find_by_owner(owner_id)
            .await
            .map_err(BookingError::PropertyLookup)?
            .ok_or(BookingError::NotFound(booking_id))?;

        let approved = self
            .bookings
            .set_approved(booking_id, property.id)
            .await
            .map_err(BookingError::BookingWrite)?;
        if !approved {
            return Err(BookingError::NotFound(booking_id));
        }
        debug!("owner {} approved booking {}", owner_id, booking_id);
        Ok(())
    }

    /// Venue price and raw bookings, or `None` when the owner has no venue.
    async fn property_bookings(
        &self,
        owner_id: Uuid,
    ) -> BookingResult<Option<(i64, Vec<BookingRecord>)>> {
        let Some(property) = self
            .properties
            .find_by_owner(owner_id)
            .await
            .map_err(BookingError::PropertyLookup)?
        else {
            debug!("owner {} has no property; no bookings", owner_id);
            return Ok(None);
        };

        let records = self
            .bookings
            .find_by_property(property.id)
            .await
            .map_err(BookingError::BookingLookup)?;
        Ok(Some((property.attributes.price, records)))
    }

    /// One lookup at a time, in output order.
    async fn join_customers(
        &self,
        records: Vec<BookingRecord>,
        total_payment: Option<i64>,
    ) -> Vec<BookingEntry> {
        stream::iter(records)
            .then(|record| self.join_customer(record, total_payment))
            .collect()
            .await
    }

    async fn join_customer(&self, record: BookingRecord, total_payment: Option<i64>) -> BookingEntry {
        let customer = match self.identities.find_customer(record.customer_id).await {
            Ok(Some(customer)) => CustomerSummary::from(customer),
            Ok(None) => {
                debug!(
                    "customer {} for booking {} not found",
                    record.customer_id, record.id
                );
                return BookingEntry::unenriched(record);
            }
            Err(err) => {
                warn!(
                    "customer lookup for booking {} failed: {}",
                    record.id, err
                );
                return BookingEntry::unenriched(record);
            }
        };

        BookingEntry {
            booking: record,
            customer_name: Some(customer.name),
            customer_email: Some(customer.email),
            customer_phone: Some(customer.phone),
            total_payment,
        }
    }
}
