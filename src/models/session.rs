//! Session state and the per-request identity derived from it.

use crate::models::user::{Customer, Owner};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Who a session belongs to, decided once from the stored `(user_id, role)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionIdentity {
    Owner(Uuid),
    Customer(Uuid),
    None,
}

impl SessionIdentity {
    pub fn from_stored(user_id: Uuid, role: &str) -> Self {
        match role {
            "owner" => SessionIdentity::Owner(user_id),
            "customer" => SessionIdentity::Customer(user_id),
            other => {
                tracing::warn!("session for {} carries unknown role `{}`", user_id, other);
                SessionIdentity::None
            }
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(FlashKind::Success),
            "error" => Some(FlashKind::Error),
            _ => None,
        }
    }
}

/// A one-shot message shown on the next page load.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Row in the `sessions` table.
#[derive(Clone, FromRow, Debug)]
pub struct SessionRow {
    pub token: String,
    pub user_id: Uuid,
    pub role: String,
    pub flash_kind: Option<String>,
    pub flash_message: Option<String>,
}

impl SessionRow {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::from_stored(self.user_id, &self.role)
    }
}

/// The live account behind the current request, tagged with its role.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum CurrentUser {
    Owner(Owner),
    Customer(Customer),
    Anonymous,
}

impl CurrentUser {
    #[cfg(test)]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CurrentUser::Anonymous)
    }
}
