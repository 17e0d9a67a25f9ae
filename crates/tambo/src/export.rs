//! Tabular and JSON export of a farm's survey.
//!
//! Tables use the section form keys as headers so the files can be read back
//! by [`crate::import`].

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tambo_db::{EntityKind, FarmSnapshot, StoredRecord};
use tracing::info;

/// One section rendered as rows of text cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub kind: EntityKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.kind.section_key())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every section of the snapshot, farm first.
pub fn export_tables(snapshot: &FarmSnapshot) -> Vec<ExportTable> {
    EntityKind::ALL
        .into_iter()
        .map(|kind| table_for(kind, snapshot.section(kind)))
        .collect()
}

fn table_for(kind: EntityKind, rows: &[StoredRecord]) -> ExportTable {
    let columns = kind.columns();
    let headers = columns.iter().map(|c| c.form_key.to_string()).collect();
    let rows = rows
        .iter()
        .map(|row| {
            let form = row.record.to_form();
            columns
                .iter()
                .map(|c| cell(form.get(c.form_key).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();

    ExportTable {
        kind,
        headers,
        rows,
    }
}

/// Render a form value as a CSV cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write `<section_key>.csv` for every non-empty section. Returns the paths
/// written.
pub fn write_csv_dir(snapshot: &FarmSnapshot, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut written = Vec::new();
    for table in export_tables(snapshot) {
        if table.is_empty() {
            continue;
        }
        let path = dir.join(table.file_name());
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        info!(section = %table.kind, rows = table.rows.len(), path = %path.display(), "Exported section");
        written.push(path);
    }
    Ok(written)
}

/// Pretty JSON keyed by section key. The farm is an object; every other
/// section is an array.
pub fn to_json(snapshot: &FarmSnapshot) -> Result<String> {
    let mut out = Map::new();
    for kind in EntityKind::ALL {
        let rows: Vec<Value> = snapshot
            .section(kind)
            .iter()
            .map(|row| Value::Object(row.record.to_form().into_iter().collect()))
            .collect();

        let value = if kind.is_root() {
            rows.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(rows)
        };
        out.insert(kind.section_key().to_string(), value);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(out))?)
}
