//! Export and import commands

use crate::cli::error::HelpfulError;
use crate::cli::output::print_table;
use crate::cli::{block_on, open_db, parse_farm};
use std::path::PathBuf;
use tambo::config::TamboConfig;
use tambo::export::{export_tables, to_json, write_csv_dir};
use tambo::import::import_dir;
use tambo::SessionContext;
use tambo_db::FarmId;

#[derive(Debug)]
pub struct ExportArgs {
    pub farm: Option<String>,
    pub out: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug)]
pub struct ImportArgs {
    pub dir: PathBuf,
    pub farm: Option<String>,
    pub json: bool,
}

pub fn export(args: ExportArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let farm = parse_farm(args.farm.as_deref())?;
    block_on(export_async(farm, args.out, args.json, config))
}

async fn export_async(
    farm: Option<FarmId>,
    out: Option<PathBuf>,
    json: bool,
    config: &TamboConfig,
) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let ctx = SessionContext::with_farm(db, farm);
    let snapshot = ctx
        .snapshot()
        .await
        .map_err(HelpfulError::store)?
        .ok_or_else(HelpfulError::no_data)?;

    if let Some(dir) = out {
        let written = write_csv_dir(&snapshot, &dir)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&written)?);
        } else {
            for path in &written {
                println!("Wrote {}", path.display());
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", to_json(&snapshot)?);
        return Ok(());
    }

    for table in export_tables(&snapshot) {
        if table.is_empty() {
            continue;
        }
        println!("{}", table.kind.title());
        let headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
        print_table(&headers, table.rows.clone());
        println!();
    }
    Ok(())
}

pub fn import(args: ImportArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let farm = parse_farm(args.farm.as_deref())?;
    if !args.dir.is_dir() {
        return Err(HelpfulError::new(format!("Not a directory: {}", args.dir.display()))
            .with_context("import expects a directory of <section>.csv files")
            .into());
    }
    block_on(import_async(args.dir, farm, args.json, config))
}

async fn import_async(
    dir: PathBuf,
    farm: Option<FarmId>,
    json: bool,
    config: &TamboConfig,
) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let mut ctx = SessionContext::with_farm(db, farm);
    let report = import_dir(&mut ctx, &dir).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_table(
        &["section", "rows"],
        report
            .rows
            .iter()
            .map(|(kind, rows)| vec![kind.section_key().to_string(), rows.to_string()])
            .collect(),
    );
    for path in &report.skipped {
        println!("Skipped {}", path.display());
    }
    println!("Imported {} row(s)", report.total_rows());
    Ok(())
}
