//! SQLite file backing the task slots.
//!
//! # Responsibility
//! - Open the database that holds the `kv_store` slot table.
//! - Bring its schema to the version this binary understands.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A file written by a newer binary is refused, never downgraded.
//! - `SqliteTaskStore` only sees connections returned from here.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or reading the task database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of every known migration.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Whether another connection held the file; retrying later may succeed.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "task database: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "task database schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use rusqlite::ffi;

    fn failure(code: i32) -> DbError {
        DbError::Sqlite(rusqlite::Error::SqliteFailure(ffi::Error::new(code), None))
    }

    #[test]
    fn busy_and_locked_files_are_busy() {
        assert!(failure(ffi::SQLITE_BUSY).is_busy());
        assert!(failure(ffi::SQLITE_LOCKED).is_busy());
        assert!(!failure(ffi::SQLITE_CORRUPT).is_busy());
        assert!(!DbError::SchemaTooNew {
            found: 9,
            supported: 1
        }
        .is_busy());
    }
}
