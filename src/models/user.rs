//! Owner and customer accounts, as read by the booking and session layers,
//! and the owner's payout account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A property owner account.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Tax identifier (PAN).
    pub pan: String,
}

/// Owner fields editable from the profile page, already normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub pan: String,
}

/// Payout account of an owner. An owner has at most one.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct BankAccount {
    pub owner_id: Uuid,
    /// Account holder name.
    pub name: String,
    pub account_number: String,
    pub ifsc: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankDetails {
    pub name: String,
    pub account_number: String,
    pub ifsc: String,
}

/// A customer account.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Identity fields joined onto bookings.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<Customer> for CustomerSummary {
    fn from(customer: Customer) -> Self {
        Self {
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
        }
    }
}
