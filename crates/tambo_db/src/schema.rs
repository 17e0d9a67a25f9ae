//! Table creation for every section.
//!
//! Tables are derived from the record column definitions so the schema and
//! the typed records cannot drift apart.

use crate::entity::{EntityKind, FARM_FK_COLUMN};
use crate::error::Result;
use crate::TamboDb;
use tracing::info;

impl TamboDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        for kind in EntityKind::ALL {
            sqlx::query(&create_table_sql(kind))
                .execute(&self.pool)
                .await?;

            for index in create_index_sql(kind) {
                sqlx::query(&index).execute(&self.pool).await?;
            }
        }

        info!(tables = EntityKind::ALL.len(), "Database schema verified");
        Ok(())
    }
}

/// CREATE TABLE statement for a kind.
pub(crate) fn create_table_sql(kind: EntityKind) -> String {
    let mut columns = vec!["id TEXT PRIMARY KEY".to_string()];
    if let Some(rel) = kind.relation() {
        columns.push(format!(
            "{} TEXT NOT NULL REFERENCES {}(id)",
            rel.foreign_key,
            EntityKind::Farm.table()
        ));
    }
    columns.extend(
        kind.columns()
            .iter()
            .map(|col| format!("{} {}", col.column, col.ty.sql_decl())),
    );
    columns.push("created_at INTEGER NOT NULL".to_string());
    columns.push("updated_at INTEGER NOT NULL".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        kind.table(),
        columns.join(",\n    ")
    )
}

fn create_index_sql(kind: EntityKind) -> Vec<String> {
    let table = kind.table();
    let mut indexes = vec![format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created_at DESC)"
    )];
    if kind.relation().is_some() {
        indexes.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_farm ON {table}({FARM_FK_COLUMN})"
        ));
    }
    indexes
}
