//! Record store operations.
//!
//! Upserts are keyed by record identifier. Child rows always carry a farm
//! reference; callers may pass it explicitly or leave it to resolve to the
//! most recently created farm. "Most recent" orders by `created_at`, then by
//! insertion order (`rowid`) for rows created within the same millisecond.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::entity::{EntityKind, FARM_FK_COLUMN};
use crate::error::{DbError, Result};
use crate::types::*;
use crate::value::bind_value;
use crate::{FarmId, RecordId, TamboDb};

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";
const OLDEST_FIRST: &str = "ORDER BY created_at ASC, rowid ASC";

impl TamboDb {
    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert or update a record by identifier.
    ///
    /// A missing `id` gets a fresh one. For farms `farm_id` is ignored. For
    /// children the parent is `farm_id` when given (it must exist), otherwise
    /// the most recently created farm; with no farm at all the write is
    /// refused with [`DbError::NoFarm`]. Parent resolution and the write run
    /// in one transaction.
    pub async fn upsert(
        &self,
        record: &Record,
        id: Option<&RecordId>,
        farm_id: Option<&FarmId>,
    ) -> Result<UpsertOutcome> {
        let kind = record.kind();
        let id = id.cloned().unwrap_or_default();
        let now = Self::now_millis();

        let mut tx = self.pool.begin().await?;

        let parent = match kind.relation() {
            None => None,
            Some(_) => Some(resolve_parent_in(&mut tx, farm_id).await?),
        };

        let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", kind.table()))
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        let values = record.sql_values();
        let columns: Vec<&str> = kind.columns().iter().map(|c| c.column).collect();

        if exists {
            let mut assignments: Vec<String> = Vec::with_capacity(columns.len() + 2);
            if parent.is_some() {
                assignments.push(format!("{} = ?", FARM_FK_COLUMN));
            }
            assignments.extend(columns.iter().map(|c| format!("{} = ?", c)));
            assignments.push("updated_at = ?".to_string());

            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?",
                kind.table(),
                assignments.join(", ")
            );
            let mut query = sqlx::query(&sql);
            if let Some(parent) = &parent {
                query = query.bind(parent.as_str());
            }
            for value in values {
                query = bind_value(query, value);
            }
            query.bind(now).bind(id.as_str()).execute(&mut *tx).await?;
        } else {
            let mut names: Vec<&str> = vec!["id"];
            if parent.is_some() {
                names.push(FARM_FK_COLUMN);
            }
            names.extend(columns.iter().copied());
            names.push("created_at");
            names.push("updated_at");
            let placeholders = vec!["?"; names.len()].join(", ");

            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                kind.table(),
                names.join(", "),
                placeholders
            );
            let mut query = sqlx::query(&sql).bind(id.as_str());
            if let Some(parent) = &parent {
                query = query.bind(parent.as_str());
            }
            for value in values {
                query = bind_value(query, value);
            }
            query.bind(now).bind(now).execute(&mut *tx).await?;
        }

        tx.commit().await?;

        let farm_id = parent.unwrap_or_else(|| id.clone().into());
        info!(
            section = %kind,
            id = %id,
            farm_id = %farm_id,
            is_new = !exists,
            "Record saved"
        );

        Ok(UpsertOutcome {
            id,
            farm_id,
            is_new: !exists,
        })
    }

    /// Delete the most recently created row of a kind.
    ///
    /// Returns `false` (and changes nothing) when the table is empty. A farm
    /// that still has section rows is not deleted: there is no cascade.
    pub async fn delete_last(&self, kind: EntityKind) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT id FROM {} {} LIMIT 1",
            kind.table(),
            NEWEST_FIRST
        ))
        .fetch_optional(&mut *tx)
        .await?;

        let id: String = match row {
            Some(row) => row.get("id"),
            None => {
                tx.rollback().await?;
                debug!(section = %kind, "Nothing to delete");
                return Ok(false);
            }
        };

        if kind.is_root() {
            let children = count_children_in(&mut tx, &id).await?;
            if children > 0 {
                tx.rollback().await?;
                return Err(DbError::constraint(format!(
                    "farm {} still has {} section record(s); delete those first",
                    id, children
                )));
            }
        }

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(section = %kind, id = %id, "Deleted last record");
        Ok(true)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Rows of `kind` for a farm, oldest first.
    ///
    /// Without `farm_id`, children resolve to the most recent farm and the
    /// farm kind returns every farm. Absence is never an error.
    pub async fn get(&self, kind: EntityKind, farm_id: Option<&FarmId>) -> Result<Vec<StoredRecord>> {
        let rows = if kind.is_root() {
            match farm_id {
                Some(farm_id) => {
                    sqlx::query(&format!("SELECT * FROM {} WHERE id = ?", kind.table()))
                        .bind(farm_id.as_str())
                        .fetch_all(&self.pool)
                        .await?
                }
                None => {
                    sqlx::query(&format!("SELECT * FROM {} {}", kind.table(), OLDEST_FIRST))
                        .fetch_all(&self.pool)
                        .await?
                }
            }
        } else {
            let farm_id = match farm_id {
                Some(farm_id) => farm_id.clone(),
                None => match self.latest_farm().await? {
                    Some(latest) => latest,
                    None => return Ok(Vec::new()),
                },
            };
            sqlx::query(&format!(
                "SELECT * FROM {} WHERE {} = ? {}",
                kind.table(),
                FARM_FK_COLUMN,
                OLDEST_FIRST
            ))
            .bind(farm_id.as_str())
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(|row| row_to_stored(kind, row)).collect()
    }

    /// A single row by identifier.
    pub async fn get_by_id(&self, kind: EntityKind, id: &RecordId) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(&format!("SELECT * FROM {} WHERE id = ?", kind.table()))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_stored(kind, &row)?)),
            None => Ok(None),
        }
    }

    /// Number of rows of `kind`; restricted to one farm's rows when given.
    pub async fn count(&self, kind: EntityKind, farm_id: Option<&FarmId>) -> Result<u64> {
        let count: i64 = match (farm_id, kind.is_root()) {
            (Some(farm_id), true) => {
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE id = ?", kind.table()))
                    .bind(farm_id.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            (Some(farm_id), false) => {
                sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?",
                    kind.table(),
                    FARM_FK_COLUMN
                ))
                .bind(farm_id.as_str())
                .fetch_one(&self.pool)
                .await?
            }
            (None, _) => {
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", kind.table()))
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count as u64)
    }

    /// True iff at least one farm exists.
    pub async fn exists_any(&self) -> Result<bool> {
        let row = sqlx::query(&format!("SELECT 1 FROM {} LIMIT 1", EntityKind::Farm.table()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// The most recently created farm.
    pub async fn latest_farm(&self) -> Result<Option<FarmId>> {
        let mut conn = self.pool.acquire().await?;
        latest_farm_in(&mut conn).await
    }

    /// Resolve a parent reference: an explicit farm must exist, an omitted
    /// one becomes the most recent farm.
    pub async fn resolve_parent(&self, farm_id: Option<&FarmId>) -> Result<FarmId> {
        let mut conn = self.pool.acquire().await?;
        resolve_parent_in(&mut conn, farm_id).await
    }

    /// Everything recorded for a farm (the most recent one when omitted).
    ///
    /// Returns `None` when the farm does not exist. Every child kind appears
    /// in `sections`, possibly empty.
    pub async fn snapshot(&self, farm_id: Option<&FarmId>) -> Result<Option<FarmSnapshot>> {
        let farm_id = match farm_id {
            Some(farm_id) => farm_id.clone(),
            None => match self.latest_farm().await? {
                Some(latest) => latest,
                None => return Ok(None),
            },
        };

        let farm_record_id = RecordId::from(farm_id.clone());
        let farm = match self.get_by_id(EntityKind::Farm, &farm_record_id).await? {
            Some(farm) => farm,
            None => return Ok(None),
        };

        let mut sections = BTreeMap::new();
        for kind in EntityKind::CHILDREN {
            sections.insert(kind, self.get(kind, Some(&farm_id)).await?);
        }

        Ok(Some(FarmSnapshot { farm, sections }))
    }
}

async fn latest_farm_in(conn: &mut SqliteConnection) -> Result<Option<FarmId>> {
    let row = sqlx::query(&format!(
        "SELECT id FROM {} {} LIMIT 1",
        EntityKind::Farm.table(),
        NEWEST_FIRST
    ))
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let id: String = row.get("id");
            Ok(Some(FarmId::parse(&id)?))
        }
        None => Ok(None),
    }
}

async fn resolve_parent_in(conn: &mut SqliteConnection, farm_id: Option<&FarmId>) -> Result<FarmId> {
    match farm_id {
        Some(farm_id) => {
            let exists = sqlx::query(&format!(
                "SELECT 1 FROM {} WHERE id = ?",
                EntityKind::Farm.table()
            ))
            .bind(farm_id.as_str())
            .fetch_optional(&mut *conn)
            .await?
            .is_some();

            if exists {
                Ok(farm_id.clone())
            } else {
                Err(DbError::MissingParent(farm_id.clone()))
            }
        }
        None => {
            let latest = latest_farm_in(conn).await?.ok_or(DbError::NoFarm)?;
            debug!(farm_id = %latest, "Defaulted parent to most recent farm");
            Ok(latest)
        }
    }
}

async fn count_children_in(conn: &mut SqliteConnection, farm_id: &str) -> Result<i64> {
    let mut total = 0;
    for rel in crate::entity::relations() {
        let n: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            rel.table, rel.foreign_key
        ))
        .bind(farm_id)
        .fetch_one(&mut *conn)
        .await?;
        total += n;
    }
    Ok(total)
}

fn row_to_stored(kind: EntityKind, row: &SqliteRow) -> Result<StoredRecord> {
    let id: String = row.get("id");
    let farm_id = if kind.is_root() {
        None
    } else {
        let farm_id: String = row.get(FARM_FK_COLUMN);
        Some(FarmId::parse(&farm_id)?)
    };
    let created_at: i64 = row.get("created_at");

    Ok(StoredRecord {
        id: RecordId::parse(&id)?,
        farm_id,
        created_at: TamboDb::millis_to_datetime(created_at),
        record: Record::from_row(kind, row)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(name: &str) -> Record {
        Record::Farm(Farm {
            name: name.to_string(),
            city: "Rafaela".to_string(),
            industry_sales_percentage: 60.0,
            cheese_usage_percentage: 30.0,
            discard_percentage: 10.0,
            ..Default::default()
        })
    }

    fn herd(category: &str, count: i64) -> Record {
        Record::Herd(Herd {
            category: category.to_string(),
            animal_count: count,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_child_without_any_farm_is_refused() {
        let db = TamboDb::open_in_memory().await.unwrap();

        let err = db.upsert(&herd("Vacas", 10), None, None).await.unwrap_err();
        assert!(matches!(err, DbError::NoFarm));
        assert_eq!(db.count(EntityKind::Herd, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_child_with_unknown_farm_is_refused() {
        let db = TamboDb::open_in_memory().await.unwrap();
        db.upsert(&farm("A"), None, None).await.unwrap();

        let ghost = FarmId::new();
        let err = db
            .upsert(&herd("Vacas", 10), None, Some(&ghost))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingParent(ref id) if *id == ghost));
        assert!(err.is_missing_parent());
    }

    #[tokio::test]
    async fn test_farm_upsert_returns_its_own_id_as_farm() {
        let db = TamboDb::open_in_memory().await.unwrap();

        let outcome = db.upsert(&farm("A"), None, None).await.unwrap();
        assert!(outcome.is_new);
        assert_eq!(outcome.id.as_str(), outcome.farm_id.as_str());
        assert!(db.exists_any().await.unwrap());
    }

    #[tokio::test]
    async fn test_update_keeps_creation_time() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let first = db.upsert(&farm("A"), None, None).await.unwrap();
        let before = db.get(EntityKind::Farm, Some(&first.farm_id)).await.unwrap();

        let second = db.upsert(&farm("B"), Some(&first.id), None).await.unwrap();
        assert!(!second.is_new);

        let after = db.get(EntityKind::Farm, Some(&first.farm_id)).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].created_at, before[0].created_at);
        assert_eq!(after[0].record.as_farm().unwrap().name, "B");
    }

    #[tokio::test]
    async fn test_delete_last_farm_with_children_is_refused() {
        let db = TamboDb::open_in_memory().await.unwrap();
        db.upsert(&farm("A"), None, None).await.unwrap();
        db.upsert(&herd("Vacas", 10), None, None).await.unwrap();

        let err = db.delete_last(EntityKind::Farm).await.unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
        assert_eq!(db.count(EntityKind::Farm, None).await.unwrap(), 1);

        assert!(db.delete_last(EntityKind::Herd).await.unwrap());
        assert!(db.delete_last(EntityKind::Farm).await.unwrap());
        assert!(!db.exists_any().await.unwrap());
    }

    #[tokio::test]
    async fn test_same_millisecond_ties_break_by_insertion_order() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let a = db.upsert(&farm("A"), None, None).await.unwrap();
        let b = db.upsert(&farm("B"), None, None).await.unwrap();

        // force a timestamp collision
        sqlx::query("UPDATE farms SET created_at = 1000")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.latest_farm().await.unwrap(), Some(b.farm_id.clone()));
        assert!(db.delete_last(EntityKind::Farm).await.unwrap());
        assert_eq!(db.latest_farm().await.unwrap(), Some(a.farm_id));
    }
}
