//! Property documents: one row per owner, photos and option sets embedded as
//! JSON columns.

use crate::{
    models::property::{
        FunctionType, ImageList, ImageRef, Location, PropertyAttributes, PropertyProfile,
        VenueService,
    },
    services::StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool, types::Json};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn find_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<PropertyProfile>>;

    /// Create or replace the owner's document in one write.
    async fn upsert(
        &self,
        owner_id: Uuid,
        attributes: &PropertyAttributes,
        images: &ImageList,
    ) -> StoreResult<PropertyProfile>;

    /// Returns whether a document existed.
    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct SqlitePropertyStore {
    db: Arc<SqlitePool>,
}

impl SqlitePropertyStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

const PROPERTY_COLUMNS: &str = "id, owner_id, name, latitude, longitude, address, city, state, \
     pincode, contact, mail_id, office_hours, capacity, price, size, function_types, services, \
     cctv, dressing_room, allow_booking, description, images, created_at, updated_at";

#[derive(FromRow)]
struct PropertyRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: String,
    city: String,
    state: String,
    pincode: String,
    contact: String,
    mail_id: Option<String>,
    office_hours: Option<String>,
    capacity: i64,
    price: i64,
    size: i64,
    function_types: Json<Vec<FunctionType>>,
    services: Json<Vec<VenueService>>,
    cctv: bool,
    dressing_room: bool,
    allow_booking: bool,
    description: String,
    images: Json<Vec<ImageRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for PropertyProfile {
    fn from(row: PropertyRow) -> Self {
        let (images, overflow) = ImageList::capped(row.images.0);
        if !overflow.is_empty() {
            tracing::warn!(
                "property {} stores {} images past the cap; ignoring them",
                row.id,
                overflow.len()
            );
        }

        PropertyProfile {
            id: row.id,
            owner_id: row.owner_id,
            attributes: PropertyAttributes {
                name: row.name,
                location: Location {
                    latitude: row.latitude,
                    longitude: row.longitude,
                    address: row.address,
                    city: row.city,
                    state: row.state,
                    pincode: row.pincode,
                },
                contact: row.contact,
                mail_id: row.mail_id,
                office_hours: row.office_hours,
                capacity: row.capacity,
                price: row.price,
                size: row.size,
                function_types: row.function_types.0,
                services: row.services.0,
                cctv: row.cctv,
                dressing_room: row.dressing_room,
                allow_booking: row.allow_booking,
                description: row.description,
            },
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PropertyStore for SqlitePropertyStore {
    async fn find_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<PropertyProfile>> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE owner_id = ?"
        ))
        .bind(owner_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(row.map(PropertyProfile::from))
    }

    async fn upsert(
        &self,
        owner_id: Uuid,
        attributes: &PropertyAttributes,
        images: &ImageList,
    ) -> StoreResult<PropertyProfile> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO properties ({PROPERTY_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                name = excluded.name,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                address = excluded.address,
                city = excluded.city,
                state = excluded.state,
                pincode = excluded.pincode,
                contact = excluded.contact,
                mail_id = excluded.mail_id,
                office_hours = excluded.office_hours,
                capacity = excluded.capacity,
                price = excluded.price,
                size = excluded.size,
                function_types = excluded.function_types,
                services = excluded.services,
                cctv = excluded.cctv,
                dressing_room = excluded.dressing_room,
                allow_booking = excluded.allow_booking,
                description = excluded.description,
                images = excluded.images,
                updated_at = excluded.updated_at
            RETURNING {PROPERTY_COLUMNS}
            "#
        );

        let location = &attributes.location;
        let row = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&attributes.name)
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(&location.address)
            .bind(&location.city)
            .bind(&location.state)
            .bind(&location.pincode)
            .bind(&attributes.contact)
            .bind(&attributes.mail_id)
            .bind(&attributes.office_hours)
            .bind(attributes.capacity)
            .bind(attributes.price)
            .bind(attributes.size)
            .bind(Json(&attributes.function_types))
            .bind(Json(&attributes.services))
            .bind(attributes.cctv)
            .bind(attributes.dressing_room)
            .bind(attributes.allow_booking)
            .bind(&attributes.description)
            .bind(Json(images))
            .bind(now)
            .bind(now)
            .fetch_one(&*self.db)
            .await?;

        Ok(row.into())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
