//! Bulk import of section CSV files.
//!
//! A directory holds one `<section_key>.csv` per section, header row = form
//! keys. The farm file is loaded first and its last row becomes the parent of
//! every section file loaded after it. Rows bypass the section rules: the
//! files are trusted survey exports.

use crate::context::SessionContext;
use crate::sections::form_id;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tambo_db::{EntityKind, FarmId, FormData, Record, INTERNAL_FORM_KEYS, ID_FORM_KEY};
use tracing::{info, warn};

/// What an import did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Rows stored per section
    pub rows: BTreeMap<EntityKind, usize>,
    /// Files that do not name a section
    pub skipped: Vec<PathBuf>,
    /// Farm the section rows were attached to
    pub farm_id: Option<FarmId>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.rows.values().sum()
    }
}

/// Import every section file in `dir`.
pub async fn import_dir(ctx: &mut SessionContext, dir: &Path) -> Result<ImportReport> {
    let mut files: Vec<(EntityKind, PathBuf)> = Vec::new();
    let mut report = ImportReport::default();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read import directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let kind = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(EntityKind::parse);
        match kind {
            Some(kind) => files.push((kind, path)),
            None => {
                warn!(path = %path.display(), "Skipping file that names no section");
                report.skipped.push(path);
            }
        }
    }
    // farm first, then sections in survey order
    files.sort();

    for (kind, path) in files {
        let count = import_file(ctx, kind, &path)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;
        *report.rows.entry(kind).or_default() += count;
    }

    report.farm_id = match ctx.farm() {
        Some(farm) => Some(farm.clone()),
        None => ctx.db().latest_farm().await?,
    };
    info!(
        rows = report.total_rows(),
        skipped = report.skipped.len(),
        "Import finished"
    );
    Ok(report)
}

async fn import_file(ctx: &mut SessionContext, kind: EntityKind, path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut count = 0;
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let form = row_to_form(kind, &headers, &row);
        let record = Record::from_form(kind, &form)
            .with_context(|| format!("row {}", line + 2))?;
        let id = form_id(&form).with_context(|| format!("row {}", line + 2))?;

        let outcome = ctx.db().upsert(&record, id.as_ref(), ctx.farm()).await?;
        if kind.is_root() {
            ctx.set_farm(outcome.farm_id);
        }
        count += 1;
    }

    info!(section = %kind, rows = count, "Imported section file");
    Ok(count)
}

fn row_to_form(kind: EntityKind, headers: &[String], row: &csv::StringRecord) -> FormData {
    let columns = kind.columns();
    headers
        .iter()
        .zip(row.iter())
        .filter(|(h, _)| h.as_str() == ID_FORM_KEY || !INTERNAL_FORM_KEYS.contains(&h.as_str()))
        .map(|(h, cell)| {
            let text_column = columns
                .iter()
                .find(|c| c.form_key == h.as_str())
                .is_some_and(|c| !c.ty.is_numeric());
            let value = if h == ID_FORM_KEY {
                Value::String(cell.trim().to_string())
            } else if text_column {
                // codes like "007" or a month "03" stay as written
                Value::String(cell.to_string())
            } else {
                parse_cell(cell)
            };
            (h.clone(), value)
        })
        .collect()
}

/// Empty → null, numeric-looking → number, anything else → text. Used for
/// numeric columns only; text columns keep the cell verbatim.
pub fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        _ => Value::String(cell.to_string()),
    }
}
