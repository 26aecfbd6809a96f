//! Shared state handed to every handler.

use crate::{
    config::AppConfig,
    services::{
        blob_store::{BlobStore, DiskBlobStore},
        booking_service::BookingAggregator,
        booking_store::SqliteBookingStore,
        identity_resolver::SessionIdentityResolver,
        identity_store::{IdentityStore, SqliteIdentityStore},
        media_service::MediaLifecycleManager,
        property_store::{PropertyStore, SqlitePropertyStore},
        session_store::SessionStore,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<SqlitePool>,
    pub blobs: Arc<dyn BlobStore>,
    pub properties: Arc<dyn PropertyStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub sessions: SessionStore,
    pub resolver: SessionIdentityResolver,
    pub media: MediaLifecycleManager,
    pub bookings: BookingAggregator,
}

impl AppState {
    /// Wire the SQLite and disk-backed stores into the services.
    pub fn new(db: Arc<SqlitePool>, config: AppConfig) -> Self {
        let blobs: Arc<dyn BlobStore> =
            Arc::new(DiskBlobStore::new(db.clone(), config.storage_dir.clone()));
        let properties: Arc<dyn PropertyStore> = Arc::new(SqlitePropertyStore::new(db.clone()));
        let identities: Arc<dyn IdentityStore> = Arc::new(SqliteIdentityStore::new(db.clone()));

        let media =
            MediaLifecycleManager::new(blobs.clone(), properties.clone(), &config.server_domain);
        let bookings = BookingAggregator::new(
            properties.clone(),
            Arc::new(SqliteBookingStore::new(db.clone())),
            identities.clone(),
        );

        Self {
            sessions: SessionStore::new(db.clone()),
            resolver: SessionIdentityResolver::new(identities.clone()),
            config: Arc::new(config),
            db,
            blobs,
            properties,
            identities,
            media,
            bookings,
        }
    }
}
