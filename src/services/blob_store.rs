//! src/services/blob_store.rs
//!
//! Blob store for venue photos. Payloads live on local disk sharded beneath
//! `base_path/{shard}/{shard}/{filename}`; size, content type and etag are
//! kept in the SQLite `blobs` table. The store is keyed by filename only and
//! holds no back-reference to the profiles that use a blob.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    pin::Pin,
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob `{0}` not found")]
    NotFound(String),
    #[error("invalid blob filename `{0}`")]
    InvalidFilename(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Streamed blob payload.
pub type BlobBody = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Metadata row for a stored blob.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    /// MD5 of the payload, lowercase hex.
    pub etag: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a delete that did not hit a store error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// A blob opened for reading.
pub struct OpenedBlob {
    pub meta: StoredBlob,
    pub body: BlobBody,
}

/// Keyed binary store used for venue photos.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `filename`, replacing any previous payload.
    async fn put(
        &self,
        filename: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> BlobResult<StoredBlob>;

    /// Open a blob for streaming out.
    async fn open(&self, filename: &str) -> BlobResult<OpenedBlob>;

    /// Delete a blob. A missing blob is reported, not treated as an error.
    async fn delete(&self, filename: &str) -> BlobResult<DeleteOutcome>;

    /// Readiness check for the backing storage.
    async fn health_check(&self) -> BlobResult<()> {
        Ok(())
    }
}

/// Disk-backed [`BlobStore`] with SQLite metadata.
#[derive(Clone)]
pub struct DiskBlobStore {
    db: Arc<SqlitePool>,
    base_path: PathBuf,
}

impl DiskBlobStore {
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Filenames are flat keys: no separators, no traversal, no control bytes.
    fn ensure_filename_safe(filename: &str) -> BlobResult<()> {
        let invalid = || Err(BlobError::InvalidFilename(filename.to_string()));
        if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
            return invalid();
        }
        if filename.starts_with('.') || filename.contains("..") {
            return invalid();
        }
        if filename
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'/' || b == b'\\')
        {
            return invalid();
        }
        Ok(())
    }

    /// Two-level shard directories from MD5(filename), lowercase hex.
    fn shards(filename: &str) -> (String, String) {
        let digest = md5::compute(filename);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn blob_path(&self, filename: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::shards(filename);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(filename);
        path
    }

    async fn fetch_meta(&self, filename: &str) -> BlobResult<StoredBlob> {
        sqlx::query_as::<_, StoredBlob>(
            "SELECT filename, content_type, size_bytes, etag, created_at
             FROM blobs WHERE filename = ?",
        )
        .bind(filename)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| BlobError::NotFound(filename.to_string()))
    }

    /// Write to a temp file, fsync, then rename into place.
    async fn write_payload(&self, file_path: &Path, data: &[u8]) -> BlobResult<()> {
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            BlobError::Io(io::Error::new(
                ErrorKind::Other,
                "blob path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let written: io::Result<()> = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(file_path).await?;
                fs::rename(&tmp_path, file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobError::Io(err));
            }
        }
        Ok(())
    }

    /// Remove empty shard directories up to (not including) `base_path`.
    async fn prune_empty_dirs(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(&self.base_path) && current != self.base_path {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(
        &self,
        filename: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> BlobResult<StoredBlob> {
        Self::ensure_filename_safe(filename)?;
        let file_path = self.blob_path(filename);
        self.write_payload(&file_path, &data).await?;

        let etag = format!("{:x}", md5::compute(&data));
        let insert_result = sqlx::query_as::<_, StoredBlob>(
            r#"
            INSERT INTO blobs (filename, content_type, size_bytes, etag, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(filename) DO UPDATE SET
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                created_at = excluded.created_at
            RETURNING filename, content_type, size_bytes, etag, created_at
            "#,
        )
        .bind(filename)
        .bind(content_type)
        .bind(data.len() as i64)
        .bind(&etag)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(blob) => {
                debug!("stored blob {} ({} bytes)", filename, blob.size_bytes);
                Ok(blob)
            }
            Err(err) => {
                let _ = fs::remove_file(&file_path).await;
                Err(BlobError::Sqlx(err))
            }
        }
    }

    async fn open(&self, filename: &str) -> BlobResult<OpenedBlob> {
        Self::ensure_filename_safe(filename)?;
        let meta = self.fetch_meta(filename).await?;

        let file = File::open(self.blob_path(filename)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BlobError::NotFound(filename.to_string())
            } else {
                BlobError::Io(err)
            }
        })?;

        Ok(OpenedBlob {
            meta,
            body: Box::pin(ReaderStream::new(file)),
        })
    }

    async fn delete(&self, filename: &str) -> BlobResult<DeleteOutcome> {
        Self::ensure_filename_safe(filename)?;
        let result = sqlx::query("DELETE FROM blobs WHERE filename = ?")
            .bind(filename)
            .execute(&*self.db)
            .await?;

        let file_path = self.blob_path(filename);
        let file_removed = match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed physical file {}", file_path.display());
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
                false
            }
            Err(err) => return Err(BlobError::Io(err)),
        };

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }

        if result.rows_affected() == 0 && !file_removed {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }

    /// Write, read back and remove a scratch file under `base_path`.
    async fn health_check(&self) -> BlobResult<()> {
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz").await?;
        let bytes = match fs::read(&tmp_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobError::Io(err));
            }
        };
        fs::remove_file(&tmp_path).await?;
        if bytes != b"readyz" {
            return Err(BlobError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "readiness file content mismatch",
            )));
        }
        Ok(())
    }
}
