//! Storage gateway — the narrow read/write interface for file records.
//!
//! DESIGN
//! ======
//! The coordination layer never caches file records; every read and write
//! goes through [`StorageGateway`]. Two implementations exist:
//! - [`PgStorage`]: Postgres via `sqlx`, used when `DATABASE_URL` is set.
//! - [`MemoryStorage`]: process-local map, used without a database and in
//!   tests.
//!
//! ERROR HANDLING
//! ==============
//! Callers log storage failures and carry on. Nothing here is surfaced to
//! WebSocket clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Position of a file that has not been placed on the desk yet.
pub const UNPLACED: i32 = -1;

// =============================================================================
// TYPES
// =============================================================================

/// Metadata for one uploaded file. Mirrors the `desk_files` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub storage_location: String,
    pub content_type: String,
    pub group_id: String,
    pub x: i32,
    pub y: i32,
}

/// A file that finished uploading and has no record yet.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub storage_location: String,
    pub content_type: String,
    pub group_id: String,
}

impl NewFile {
    fn into_record(self, id: Uuid) -> FileRecord {
        FileRecord {
            id,
            name: self.name,
            storage_location: self.storage_location,
            content_type: self.content_type,
            group_id: self.group_id,
            x: UNPLACED,
            y: UNPLACED,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// GATEWAY TRAIT
// =============================================================================

/// Async file-record store. Object-safe so `AppState` can hold any backend.
#[async_trait::async_trait]
pub trait StorageGateway: Send + Sync {
    /// All files on a desk, oldest first.
    async fn get_all_files(&self, desk: &str) -> Result<Vec<FileRecord>, StorageError>;

    async fn get_file(&self, file_id: Uuid) -> Result<Option<FileRecord>, StorageError>;

    /// Insert a record at the unplaced sentinel position.
    async fn create_file(&self, desk: &str, file: NewFile) -> Result<FileRecord, StorageError>;

    async fn set_file_position(&self, file_id: Uuid, x: i32, y: i32) -> Result<FileRecord, StorageError>;

    async fn rename_file(&self, file_id: Uuid, new_name: &str) -> Result<FileRecord, StorageError>;

    async fn delete_file(&self, file_id: Uuid) -> Result<(), StorageError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

type FileRow = (Uuid, String, String, String, String, i32, i32);

fn row_to_record((id, name, storage_location, content_type, group_id, x, y): FileRow) -> FileRecord {
    FileRecord { id, name, storage_location, content_type, group_id, x, y }
}

const FILE_COLUMNS: &str = "id, name, location, content_type, group_id, x, y";

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StorageGateway for PgStorage {
    async fn get_all_files(&self, desk: &str) -> Result<Vec<FileRecord>, StorageError> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM desk_files WHERE desk = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(desk)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn get_file(&self, file_id: Uuid) -> Result<Option<FileRecord>, StorageError> {
        let row = sqlx::query_as::<_, FileRow>(&format!("SELECT {FILE_COLUMNS} FROM desk_files WHERE id = $1"))
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_record))
    }

    async fn create_file(&self, desk: &str, file: NewFile) -> Result<FileRecord, StorageError> {
        let record = file.into_record(Uuid::new_v4());
        sqlx::query(
            "INSERT INTO desk_files (id, desk, name, location, content_type, group_id, x, y) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(desk)
        .bind(&record.name)
        .bind(&record.storage_location)
        .bind(&record.content_type)
        .bind(&record.group_id)
        .bind(record.x)
        .bind(record.y)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn set_file_position(&self, file_id: Uuid, x: i32, y: i32) -> Result<FileRecord, StorageError> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "UPDATE desk_files SET x = $2, y = $3 WHERE id = $1 RETURNING {FILE_COLUMNS}"
        ))
        .bind(file_id)
        .bind(x)
        .bind(y)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_record).ok_or(StorageError::NotFound(file_id))
    }

    async fn rename_file(&self, file_id: Uuid, new_name: &str) -> Result<FileRecord, StorageError> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "UPDATE desk_files SET name = $2 WHERE id = $1 RETURNING {FILE_COLUMNS}"
        ))
        .bind(file_id)
        .bind(new_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_record).ok_or(StorageError::NotFound(file_id))
    }

    async fn delete_file(&self, file_id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM desk_files WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(file_id));
        }
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Map-backed gateway. Records are kept per desk in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    /// desk -> file ids in creation order.
    desks: HashMap<String, Vec<Uuid>>,
    files: HashMap<Uuid, FileRecord>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned map is still structurally valid; keep serving it.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn update(&self, file_id: Uuid, apply: impl FnOnce(&mut FileRecord)) -> Result<FileRecord, StorageError> {
        let mut inner = self.lock();
        let record = inner.files.get_mut(&file_id).ok_or(StorageError::NotFound(file_id))?;
        apply(record);
        Ok(record.clone())
    }
}

#[async_trait::async_trait]
impl StorageGateway for MemoryStorage {
    async fn get_all_files(&self, desk: &str) -> Result<Vec<FileRecord>, StorageError> {
        let inner = self.lock();
        let Some(ids) = inner.desks.get(desk) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| inner.files.get(id).cloned()).collect())
    }

    async fn get_file(&self, file_id: Uuid) -> Result<Option<FileRecord>, StorageError> {
        Ok(self.lock().files.get(&file_id).cloned())
    }

    async fn create_file(&self, desk: &str, file: NewFile) -> Result<FileRecord, StorageError> {
        let record = file.into_record(Uuid::new_v4());
        let mut inner = self.lock();
        inner.desks.entry(desk.to_owned()).or_default().push(record.id);
        inner.files.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_file_position(&self, file_id: Uuid, x: i32, y: i32) -> Result<FileRecord, StorageError> {
        self.update(file_id, |record| {
            record.x = x;
            record.y = y;
        })
    }

    async fn rename_file(&self, file_id: Uuid, new_name: &str) -> Result<FileRecord, StorageError> {
        self.update(file_id, |record| new_name.clone_into(&mut record.name))
    }

    async fn delete_file(&self, file_id: Uuid) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.files.remove(&file_id).is_none() {
            return Err(StorageError::NotFound(file_id));
        }
        for ids in inner.desks.values_mut() {
            ids.retain(|id| *id != file_id);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
