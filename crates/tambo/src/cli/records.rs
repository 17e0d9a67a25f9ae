//! Record commands - submit, list and delete-last for one section

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_records, short_id};
use crate::cli::{block_on, open_db, parse_farm, parse_section};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tambo::config::TamboConfig;
use tambo::{SessionContext, SubmitError};
use tambo_db::{EntityKind, FarmId, FormData, RecordId};

#[derive(Debug)]
pub struct SubmitArgs {
    pub section: String,
    pub file: PathBuf,
    pub farm: Option<String>,
    pub json: bool,
}

#[derive(Debug)]
pub struct ListArgs {
    pub section: String,
    pub farm: Option<String>,
    pub json: bool,
}

#[derive(Debug)]
pub struct DeleteLastArgs {
    pub section: String,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SubmitOutput {
    section: EntityKind,
    id: RecordId,
    farm_id: FarmId,
    created: bool,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    section: EntityKind,
    deleted: bool,
}

pub fn submit(args: SubmitArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let kind = parse_section(&args.section)?;
    let farm = parse_farm(args.farm.as_deref())?;
    let form = read_form(&args.file)?;
    block_on(submit_async(kind, farm, form, args.json, config))
}

async fn submit_async(
    kind: EntityKind,
    farm: Option<FarmId>,
    form: FormData,
    json: bool,
    config: &TamboConfig,
) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let mut ctx = SessionContext::with_farm(db, farm);

    let outcome = ctx.submit(kind, &form).await.map_err(|e| match e {
        SubmitError::Validation(errors) => HelpfulError::validation(kind.section_key(), &errors),
        SubmitError::Store(err) => HelpfulError::store(err),
    })?;

    if json {
        let output = SubmitOutput {
            section: kind,
            id: outcome.id,
            farm_id: outcome.farm_id,
            created: outcome.is_new,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let verb = if outcome.is_new { "Created" } else { "Updated" };
        println!(
            "{} {} record {} (farm {})",
            verb,
            kind.title(),
            outcome.id,
            short_id(outcome.farm_id.as_str())
        );
    }
    Ok(())
}

/// Read a JSON object of form key -> value.
fn read_form(path: &Path) -> Result<FormData, HelpfulError> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| HelpfulError::new(format!("Cannot read file: {}", path.display())).with_context(e.to_string()))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| HelpfulError::json_parse_error(path, &e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(HelpfulError::json_parse_error(path, "expected a JSON object")),
    }
}

pub fn list(args: ListArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let kind = parse_section(&args.section)?;
    let farm = parse_farm(args.farm.as_deref())?;
    block_on(list_async(kind, farm, args.json, config))
}

async fn list_async(
    kind: EntityKind,
    farm: Option<FarmId>,
    json: bool,
    config: &TamboConfig,
) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let ctx = SessionContext::with_farm(db, farm);
    let rows = ctx.get(kind).await.map_err(HelpfulError::store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No {} records.", kind.title());
        return Ok(());
    }
    print_records(&rows);
    println!("{} record(s)", rows.len());
    Ok(())
}

pub fn delete_last(args: DeleteLastArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let kind = parse_section(&args.section)?;
    block_on(delete_last_async(kind, args.json, config))
}

async fn delete_last_async(kind: EntityKind, json: bool, config: &TamboConfig) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let deleted = db.delete_last(kind).await.map_err(HelpfulError::store)?;

    if json {
        let output = DeleteOutput {
            section: kind,
            deleted,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if deleted {
        println!("Deleted the most recent {} record.", kind.title());
    } else {
        println!("No {} records to delete.", kind.title());
    }
    Ok(())
}
