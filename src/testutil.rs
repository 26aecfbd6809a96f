//! Fixtures and store doubles shared by the unit tests.

use crate::{
    models::{
        booking::BookingRecord,
        property::{
            FunctionType, ImageList, ImageRef, Location, PropertyAttributes, PropertyProfile,
            VenueService,
        },
        user::{BankAccount, BankDetails, Customer, Owner, OwnerDetails},
    },
    services::{
        StoreError, StoreResult,
        blob_store::{BlobError, BlobResult, BlobStore, DeleteOutcome, OpenedBlob, StoredBlob},
        identity_store::IdentityStore,
        property_store::PropertyStore,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    io,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

pub fn attributes(name: &str, price: i64) -> PropertyAttributes {
    PropertyAttributes {
        name: name.to_string(),
        location: Location {
            latitude: Some(22.57),
            longitude: Some(88.36),
            address: "12 PARK STREET".into(),
            city: "KOLKATA".into(),
            state: "WEST BENGAL".into(),
            pincode: "700016".into(),
        },
        contact: "9830000000".into(),
        capacity: 300,
        price,
        size: 4000,
        function_types: vec![FunctionType::Wedding, FunctionType::Party],
        services: vec![VenueService::Parking],
        allow_booking: true,
        ..Default::default()
    }
}

pub fn image(name: &str) -> ImageRef {
    ImageRef {
        url: format!("http://venues.test/api/image/props/{name}"),
        filename: name.to_string(),
    }
}

pub fn image_list(names: &[&str]) -> ImageList {
    ImageList::capped(names.iter().map(|name| image(name)).collect()).0
}

pub async fn seed_owner(db: &SqlitePool, first_name: &str) -> Owner {
    let owner = Owner {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: "SEN".into(),
        email: format!("{}@venues.test", Uuid::new_v4().simple()),
        phone: "9830012345".into(),
        pan: "ABCDE1234F".into(),
    };
    sqlx::query(
        "INSERT INTO owners (id, first_name, last_name, email, phone, pan)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(owner.id)
    .bind(&owner.first_name)
    .bind(&owner.last_name)
    .bind(&owner.email)
    .bind(&owner.phone)
    .bind(&owner.pan)
    .execute(db)
    .await
    .unwrap();
    owner
}

pub async fn seed_customer(db: &SqlitePool, name: &str) -> Customer {
    let customer = Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@customers.test", Uuid::new_v4().simple()),
        phone: "9000000001".into(),
    };
    sqlx::query("INSERT INTO customers (id, name, email, phone) VALUES (?, ?, ?, ?)")
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .execute(db)
        .await
        .unwrap();
    customer
}

/// Insert a booking submitted `days_ago` days before now.
pub async fn seed_booking(
    db: &SqlitePool,
    property_id: Uuid,
    customer_id: Uuid,
    event_date: &str,
    event_time: &str,
    days_ago: i64,
) -> BookingRecord {
    let record = BookingRecord {
        id: Uuid::new_v4(),
        customer_id,
        property_id,
        event_date: NaiveDate::parse_from_str(event_date, "%Y-%m-%d").unwrap(),
        event_time: event_time.to_string(),
        function_type: "Wedding".into(),
        created_at: Utc::now() - Duration::days(days_ago),
        approved: false,
    };
    sqlx::query(
        "INSERT INTO bookings (id, customer_id, property_id, event_date, event_time,
                               function_type, created_at, approved)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id)
    .bind(record.customer_id)
    .bind(record.property_id)
    .bind(record.event_date)
    .bind(&record.event_time)
    .bind(&record.function_type)
    .bind(record.created_at)
    .bind(record.approved)
    .execute(db)
    .await
    .unwrap();
    record
}

/// Insert a session and return its cookie token.
pub async fn seed_session(db: &SqlitePool, user_id: Uuid, role: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query(
        "INSERT INTO sessions (token, user_id, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(user_id)
    .bind(role)
    .bind(Utc::now())
    .execute(db)
    .await
    .unwrap();
    token
}

fn unavailable() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionRefused, "blob store unavailable")
}

/// In-memory blob store that can be told to fail deletes of given names.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Bytes>>,
    failing_deletes: Mutex<HashSet<String>>,
    deletions: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn insert(&self, filename: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(filename.to_string(), Bytes::from_static(b"blob"));
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(filename)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn fail_delete_of(&self, filename: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    /// Successful deletes, in call order.
    pub fn deletions(&self) -> Vec<String> {
        self.deletions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        filename: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> BlobResult<StoredBlob> {
        let blob = StoredBlob {
            filename: filename.to_string(),
            content_type: content_type.map(String::from),
            size_bytes: data.len() as i64,
            etag: format!("{:x}", md5::compute(&data)),
            created_at: Utc::now(),
        };
        self.blobs
            .lock()
            .unwrap()
            .insert(filename.to_string(), data);
        Ok(blob)
    }

    async fn open(&self, filename: &str) -> BlobResult<OpenedBlob> {
        let data = self
            .blobs
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(filename.to_string()))?;
        let meta = StoredBlob {
            filename: filename.to_string(),
            content_type: Some("image/jpeg".into()),
            size_bytes: data.len() as i64,
            etag: format!("{:x}", md5::compute(&data)),
            created_at: Utc::now(),
        };
        Ok(OpenedBlob {
            meta,
            body: Box::pin(futures::stream::iter([Ok(data)])),
        })
    }

    async fn delete(&self, filename: &str) -> BlobResult<DeleteOutcome> {
        if self.failing_deletes.lock().unwrap().contains(filename) {
            return Err(BlobError::Io(unavailable()));
        }
        match self.blobs.lock().unwrap().remove(filename) {
            Some(_) => {
                self.deletions.lock().unwrap().push(filename.to_string());
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// In-memory property documents with switchable read/write failures.
#[derive(Default)]
pub struct MemoryPropertyStore {
    docs: Mutex<HashMap<Uuid, PropertyProfile>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryPropertyStore {
    /// Seed a document without counting it as a write.
    pub fn insert(&self, owner_id: Uuid, attributes: PropertyAttributes, images: ImageList) {
        let now = Utc::now();
        self.docs.lock().unwrap().insert(
            owner_id,
            PropertyProfile {
                id: Uuid::new_v4(),
                owner_id,
                attributes,
                images,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn get(&self, owner_id: Uuid) -> Option<PropertyProfile> {
        self.docs.lock().unwrap().get(&owner_id).cloned()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Successful upserts so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn find_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<PropertyProfile>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.get(owner_id))
    }

    async fn upsert(
        &self,
        owner_id: Uuid,
        attributes: &PropertyAttributes,
        images: &ImageList,
    ) -> StoreResult<PropertyProfile> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let mut docs = self.docs.lock().unwrap();
        let (id, created_at) = docs
            .get(&owner_id)
            .map(|doc| (doc.id, doc.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));
        let profile = PropertyProfile {
            id,
            owner_id,
            attributes: attributes.clone(),
            images: images.clone(),
            created_at,
            updated_at: now,
        };
        docs.insert(owner_id, profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(profile)
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.docs.lock().unwrap().remove(&owner_id).is_some())
    }
}

/// Identity store whose every lookup fails.
pub struct FailingIdentityStore;

#[async_trait]
impl IdentityStore for FailingIdentityStore {
    async fn find_owner(&self, _id: Uuid) -> StoreResult<Option<Owner>> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn find_customer(&self, _id: Uuid) -> StoreResult<Option<Customer>> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn update_owner(&self, _id: Uuid, _details: &OwnerDetails) -> StoreResult<Option<Owner>> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn delete_owner(&self, _id: Uuid) -> StoreResult<bool> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn find_bank_account(&self, _owner_id: Uuid) -> StoreResult<Option<BankAccount>> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn upsert_bank_account(
        &self,
        _owner_id: Uuid,
        _details: &BankDetails,
    ) -> StoreResult<BankAccount> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn delete_bank_account(&self, _owner_id: Uuid) -> StoreResult<bool> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }
}
