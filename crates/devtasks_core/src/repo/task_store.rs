//! Task forest persistence contracts and implementations.
//!
//! # Responsibility
//! - Load and save the whole forest as one JSON document under a named slot.
//! - Keep SQL and byte-level details inside the repository boundary.
//!
//! # Invariants
//! - A missing slot loads as an empty forest, never as an error.
//! - Malformed slot content is reported as `StoreError::InvalidData`.
//! - The persisted document carries no version tag; fields evolve additively.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::Forest;
use log::debug;
use serde::Deserialize;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot name used when the caller does not pick one.
pub const DEFAULT_SLOT: &str = "devtasks-tasks";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Forest could not be encoded for storage.
    Encode(serde_json::Error),
    /// Stored slot content is not a valid forest document.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode task forest: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task store requires table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for whole-forest persistence.
pub trait TaskStore {
    /// Loads the stored forest, or an empty one when nothing was saved yet.
    fn load(&self) -> StoreResult<Forest>;
    /// Replaces the stored forest.
    fn save(&self, forest: &Forest) -> StoreResult<()>;
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn load(&self) -> StoreResult<Forest> {
        (**self).load()
    }

    fn save(&self, forest: &Forest) -> StoreResult<()> {
        (**self).save(forest)
    }
}

/// SQLite-backed store writing into the `kv_store` table.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
    slot: String,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Creates store over the default slot from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Self::with_slot(conn, DEFAULT_SLOT)
    }

    /// Creates store over a caller-chosen slot from a migrated connection.
    pub fn with_slot(conn: &'conn Connection, slot: impl Into<String>) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            slot: slot.into(),
        })
    }

    /// Slot this store reads and writes.
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn load(&self) -> StoreResult<Forest> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value
                 FROM kv_store
                 WHERE key = ?1;",
                [self.slot.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            None => {
                debug!(
                    "event=store_load module=repo status=ok slot={} found=false",
                    self.slot
                );
                Ok(Forest::new())
            }
            Some(bytes) => {
                let forest = decode_forest(&bytes)?;
                debug!(
                    "event=store_load module=repo status=ok slot={} found=true roots={}",
                    self.slot,
                    forest.roots().len()
                );
                Ok(forest)
            }
        }
    }

    fn save(&self, forest: &Forest) -> StoreResult<()> {
        let bytes = encode_forest(forest)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![self.slot.as_str(), bytes],
        )?;
        debug!(
            "event=store_save module=repo status=ok slot={} bytes={}",
            self.slot,
            bytes.len()
        );
        Ok(())
    }
}

/// In-process byte store with the same slot semantics as SQLite.
#[derive(Debug)]
pub struct MemoryTaskStore {
    slots: RefCell<BTreeMap<String, Vec<u8>>>,
    slot: String,
}

impl MemoryTaskStore {
    /// Creates an empty store over the default slot.
    pub fn new() -> Self {
        Self::with_slot(DEFAULT_SLOT)
    }

    pub fn with_slot(slot: impl Into<String>) -> Self {
        Self {
            slots: RefCell::new(BTreeMap::new()),
            slot: slot.into(),
        }
    }

    /// Writes raw bytes into the active slot, bypassing encoding.
    pub fn put_raw(&self, bytes: impl Into<Vec<u8>>) {
        self.slots
            .borrow_mut()
            .insert(self.slot.clone(), bytes.into());
    }

    /// Returns raw bytes of the active slot, if present.
    pub fn get_raw(&self) -> Option<Vec<u8>> {
        self.slots.borrow().get(&self.slot).cloned()
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for MemoryTaskStore {
    fn load(&self) -> StoreResult<Forest> {
        match self.slots.borrow().get(&self.slot) {
            None => Ok(Forest::new()),
            Some(bytes) => decode_forest(bytes),
        }
    }

    fn save(&self, forest: &Forest) -> StoreResult<()> {
        let bytes = encode_forest(forest)?;
        self.put_raw(bytes);
        Ok(())
    }
}

fn encode_forest(forest: &Forest) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(forest).map_err(StoreError::Encode)
}

/// Decodes a stored forest of any nesting depth.
///
/// Each task level costs two JSON levels, so the default recursion limit
/// would cap trees at roughly 64 levels. The stack grows on demand instead.
fn decode_forest(bytes: &[u8]) -> StoreResult<Forest> {
    let invalid = |err: serde_json::Error| StoreError::InvalidData(err.to_string());
    let mut json = serde_json::Deserializer::from_slice(bytes);
    json.disable_recursion_limit();
    let forest = Forest::deserialize(serde_stacker::Deserializer::new(&mut json)).map_err(invalid)?;
    json.end().map_err(invalid)?;
    Ok(forest)
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'kv_store'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable("kv_store"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemoryTaskStore, StoreError, TaskStore};
    use crate::model::task::{Forest, Task};

    #[test]
    fn memory_store_missing_slot_loads_empty() {
        let store = MemoryTaskStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn memory_store_round_trips_forest() {
        let store = MemoryTaskStore::with_slot("board");
        let forest = Forest::from(vec![Task::with_id("a", "A").with_description("notes")]);
        store.save(&forest).unwrap();
        assert_eq!(store.load().unwrap(), forest);
    }

    #[test]
    fn memory_store_reports_malformed_document() {
        let store = MemoryTaskStore::new();
        store.put_raw(br#"{"not":"an array"}"#.to_vec());
        assert!(matches!(store.load(), Err(StoreError::InvalidData(_))));
    }
}
