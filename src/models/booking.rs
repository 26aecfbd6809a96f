//! Represents a customer's reservation against a venue.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single booking row.
///
/// Immutable once created, except for `approved`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct BookingRecord {
    pub id: Uuid,

    /// Customer who made the booking.
    pub customer_id: Uuid,

    /// Venue the booking is for.
    pub property_id: Uuid,

    /// Calendar date of the event.
    pub event_date: NaiveDate,

    /// Start time, zero-padded `HH:MM` (24h), so lexical order is chronological.
    pub event_time: String,

    pub function_type: String,

    /// When the booking was submitted.
    pub created_at: DateTime<Utc>,

    pub approved: bool,
}

/// A booking joined with the identity of the customer who made it.
///
/// Identity fields stay `None` when the customer could not be found.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BookingEntry {
    #[serde(flatten)]
    pub booking: BookingRecord,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,

    /// Only set on the history view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_payment: Option<i64>,
}

impl BookingEntry {
    pub fn unenriched(booking: BookingRecord) -> Self {
        Self {
            booking,
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            total_payment: None,
        }
    }
}
