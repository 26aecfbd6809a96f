//! src/services/media_service.rs
//!
//! MediaLifecycleManager keeps a venue's photo list and the blob store in
//! step with each other. A profile submission is reconciled against the
//! stored document in a fixed order:
//!
//! 1. flagged photos are deleted from the blob store and dropped from the list,
//! 2. new uploads are appended in submission order,
//! 3. anything past [`MAX_IMAGES`] is cut from the tail and its blob deleted,
//! 4. attributes and photos are written in a single upsert.
//!
//! Uploads are already in the blob store when `apply` runs. Every upload is
//! recorded as a compensating delete up front; if any step fails the
//! compensations are replayed in reverse before the error is returned.
//! Deletions made by steps 1 and 3 are not restored: blob store and document
//! may disagree until the owner submits again.

use crate::{
    models::property::{ImageList, ImageRef, MAX_IMAGES, PropertyAttributes, PropertyProfile},
    services::{
        StoreError,
        blob_store::{BlobError, BlobStore, DeleteOutcome},
        property_store::PropertyStore,
    },
};
use bytes::Bytes;
use std::{collections::BTreeSet, path::Path, sync::Arc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Path prefix photos are served under.
pub const IMAGE_ROUTE_PREFIX: &str = "/api/image/props";

const MAX_EXTENSION_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Validation(String),
    #[error("failed to store upload `{filename}`: {source}")]
    Upload {
        filename: String,
        #[source]
        source: BlobError,
    },
    #[error("blob store unavailable while deleting `{filename}`: {source}")]
    StoreUnavailable {
        filename: String,
        #[source]
        source: BlobError,
    },
    #[error("failed to read property document: {0}")]
    DocumentRead(#[source] StoreError),
    #[error("failed to write property document: {0}")]
    DocumentWrite(#[source] StoreError),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// One validated profile submission.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub attributes: PropertyAttributes,
    /// Photos stored by the upload step, in submission order.
    pub uploads: Vec<ImageRef>,
    /// Filenames the owner ticked for removal.
    pub delete_flags: BTreeSet<String>,
}

/// How a submission changes the photo list, before any store is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePlan {
    /// Existing photos flagged for deletion.
    pub removed: Vec<ImageRef>,
    /// Photos cut because the list went past the cap.
    pub dropped: Vec<ImageRef>,
    /// The list to persist.
    pub images: ImageList,
    /// Flags naming no current photo.
    pub missing_flags: Vec<String>,
}

/// Surviving photos keep their order, uploads follow in submission order and
/// the tail past [`MAX_IMAGES`] is dropped.
pub fn plan_images(
    current: &ImageList,
    uploads: &[ImageRef],
    delete_flags: &BTreeSet<String>,
) -> ImagePlan {
    let (removed, mut surviving): (Vec<_>, Vec<_>) = current
        .iter()
        .cloned()
        .partition(|image| delete_flags.contains(&image.filename));

    let missing_flags = delete_flags
        .iter()
        .filter(|flag| !current.contains(flag))
        .cloned()
        .collect();

    surviving.extend(uploads.iter().cloned());
    let (images, dropped) = ImageList::capped(surviving);

    ImagePlan {
        removed,
        dropped,
        images,
        missing_flags,
    }
}

#[derive(Debug)]
enum Compensation {
    DeleteBlob(String),
}

/// Undo actions recorded during an update, replayed last-in first-out.
#[derive(Debug, Default)]
struct Compensations(Vec<Compensation>);

impl Compensations {
    fn record(&mut self, compensation: Compensation) {
        self.0.push(compensation);
    }

    /// Failures are logged; the caller is already on an error path.
    async fn replay(self, blobs: &dyn BlobStore) {
        for compensation in self.0.into_iter().rev() {
            match compensation {
                Compensation::DeleteBlob(filename) => match blobs.delete(&filename).await {
                    Ok(DeleteOutcome::Deleted) => debug!("rolled back upload {}", filename),
                    Ok(DeleteOutcome::NotFound) => {
                        debug!("upload {} already gone during rollback", filename)
                    }
                    Err(err) => warn!("failed to roll back upload {}: {}", filename, err),
                },
            }
        }
    }
}

#[derive(Clone)]
pub struct MediaLifecycleManager {
    blobs: Arc<dyn BlobStore>,
    properties: Arc<dyn PropertyStore>,
    server_domain: String,
}

impl MediaLifecycleManager {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        properties: Arc<dyn PropertyStore>,
        server_domain: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            properties,
            server_domain: server_domain.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn image_url(&self, filename: &str) -> String {
        format!("{}{}/{}", self.server_domain, IMAGE_ROUTE_PREFIX, filename)
    }

    /// Store one uploaded photo under a fresh filename.
    pub async fn stage_upload(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> MediaResult<ImageRef> {
        if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
            return Err(MediaError::Validation(
                "Only image files can be uploaded.".into(),
            ));
        }
        if data.is_empty() {
            return Err(MediaError::Validation("Uploaded image is empty.".into()));
        }

        let filename = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            original_name.map(extension_of).unwrap_or_default()
        );
        self.blobs
            .put(&filename, content_type, data)
            .await
            .map_err(|source| MediaError::Upload {
                filename: filename.clone(),
                source,
            })?;

        Ok(ImageRef {
            url: self.image_url(&filename),
            filename,
        })
    }

    /// Delete uploads of a submission that never reached [`apply`](Self::apply).
    pub async fn discard_uploads(&self, uploads: &[ImageRef]) {
        let mut compensations = Compensations::default();
        for upload in uploads {
            compensations.record(Compensation::DeleteBlob(upload.filename.clone()));
        }
        compensations.replay(self.blobs.as_ref()).await;
    }

    /// Reconcile a submission against the owner's document and persist it.
    pub async fn apply(
        &self,
        owner_id: Uuid,
        update: ProfileUpdate,
    ) -> MediaResult<PropertyProfile> {
        let mut compensations = Compensations::default();
        for upload in &update.uploads {
            compensations.record(Compensation::DeleteBlob(upload.filename.clone()));
        }

        match self.reconcile(owner_id, &update).await {
            Ok(profile) => {
                info!(
                    "updated property {} for owner {} ({} images)",
                    profile.id,
                    owner_id,
                    profile.images.len()
                );
                Ok(profile)
            }
            Err(err) => {
                error!("profile update for owner {} failed: {}", owner_id, err);
                compensations.replay(self.blobs.as_ref()).await;
                Err(err)
            }
        }
    }

    async fn reconcile(
        &self,
        owner_id: Uuid,
        update: &ProfileUpdate,
    ) -> MediaResult<PropertyProfile> {
        let current = self
            .properties
            .find_by_owner(owner_id)
            .await
            .map_err(MediaError::DocumentRead)?
            .map(|profile| profile.images)
            .unwrap_or_default();

        let plan = plan_images(&current, &update.uploads, &update.delete_flags);
        for flag in &plan.missing_flags {
            debug!("ignoring deletion flag for unknown image {}", flag);
        }

        for image in &plan.removed {
            self.delete_blob(&image.filename).await?;
        }
        if !plan.dropped.is_empty() {
            info!(
                "owner {} exceeded {} images; dropping {}",
                owner_id,
                MAX_IMAGES,
                plan.dropped.len()
            );
        }
        for image in &plan.dropped {
            self.delete_blob(&image.filename).await?;
        }

        self.properties
            .upsert(owner_id, &update.attributes, &plan.images)
            .await
            .map_err(MediaError::DocumentWrite)
    }

    /// A blob that is already gone counts as deleted.
    async fn delete_blob(&self, filename: &str) -> MediaResult<()> {
        match self.blobs.delete(filename).await {
            Ok(DeleteOutcome::Deleted) => {
                debug!("deleted blob {}", filename);
                Ok(())
            }
            Ok(DeleteOutcome::NotFound) => {
                warn!("blob {} was already missing", filename);
                Ok(())
            }
            Err(source) => Err(MediaError::StoreUnavailable {
                filename: filename.to_string(),
                source,
            }),
        }
    }

    /// Delete the owner's photos, then the property document.
    ///
    /// Returns whether a document existed.
    pub async fn purge_owner(&self, owner_id: Uuid) -> MediaResult<bool> {
        let Some(profile) = self
            .properties
            .find_by_owner(owner_id)
            .await
            .map_err(MediaError::DocumentRead)?
        else {
            return Ok(false);
        };

        for image in profile.images.iter() {
            self.delete_blob(&image.filename).await?;
        }
        self.properties
            .delete_by_owner(owner_id)
            .await
            .map_err(MediaError::DocumentWrite)
    }
}

/// `.ext` of the client filename, lowercased; empty unless short and alphanumeric.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
