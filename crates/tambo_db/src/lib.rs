//! Record store for tambo (dairy farm) surveys.
//!
//! Every survey section persists to its own table. The farm table is the
//! root; every other section row references exactly one farm. Records are
//! written by identifier (insert-or-update), read back per farm, and can be
//! removed newest-first.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tambo_db::{EntityKind, Record, TamboDb};
//!
//! let db = TamboDb::open("~/.tambo/tambo.sqlite3").await?;
//!
//! let farm = db.upsert(&Record::Farm(farm), None, None).await?;
//! db.upsert(&Record::Herd(herd), None, Some(&farm.farm_id)).await?;
//!
//! let herd_rows = db.get(EntityKind::Herd, Some(&farm.farm_id)).await?;
//! ```

mod error;
mod records;
mod schema;
mod types;

pub mod entity;
pub mod value;

pub use entity::{relations, EntityKind, Relation, FARM_FK_COLUMN};
pub use error::{DbError, Result};
pub use tambo_ids::{FarmId, IdParseError, RecordId};
pub use types::*;
pub use value::{ColumnDef, ColumnType, FieldValue, FormData, SqlValue, ID_FORM_KEY, INTERNAL_FORM_KEYS};

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Handle to the survey database.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct TamboDb {
    pool: SqlitePool,
}

impl TamboDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection that never expires; every
    /// new connection to `:memory:` would otherwise see an empty database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for ad-hoc queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl TamboDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("tambo.sqlite3");

        let db = TamboDb::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        db.close().await;
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("tambo.sqlite3");

        TamboDb::open(&db_path).await.unwrap().close().await;
        let db = TamboDb::open(&db_path).await.unwrap();
        assert!(!db.exists_any().await.unwrap());
    }

    #[test]
    fn test_millis_round_trip() {
        let millis = 1_700_000_000_123;
        assert_eq!(TamboDb::millis_to_datetime(millis).timestamp_millis(), millis);
    }
}
