//! Turns a session's stored identity into the live account for one request.

use crate::{
    models::session::{CurrentUser, SessionIdentity},
    services::identity_store::IdentityStore,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct SessionIdentityResolver {
    identities: Arc<dyn IdentityStore>,
}

impl SessionIdentityResolver {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Never fails: a missing account or a lookup error yields
    /// [`CurrentUser::Anonymous`].
    pub async fn resolve(&self, identity: SessionIdentity) -> CurrentUser {
        match identity {
            SessionIdentity::Owner(id) => match self.identities.find_owner(id).await {
                Ok(Some(owner)) => CurrentUser::Owner(owner),
                Ok(None) => CurrentUser::Anonymous,
                Err(err) => {
                    warn!("owner lookup for session user {} failed: {}", id, err);
                    CurrentUser::Anonymous
                }
            },
            SessionIdentity::Customer(id) => match self.identities.find_customer(id).await {
                Ok(Some(customer)) => CurrentUser::Customer(customer),
                Ok(None) => CurrentUser::Anonymous,
                Err(err) => {
                    warn!("customer lookup for session user {} failed: {}", id, err);
                    CurrentUser::Anonymous
                }
            },
            SessionIdentity::None => CurrentUser::Anonymous,
        }
    }
}
