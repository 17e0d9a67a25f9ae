//! Status command - database overview

use crate::cli::output::{print_table, short_id};
use crate::cli::{block_on, open_db};
use serde::Serialize;
use tambo::config::TamboConfig;
use tambo_db::{EntityKind, FarmId};

#[derive(Debug)]
pub struct StatusArgs {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    database: String,
    farms: u64,
    latest_farm: Option<FarmId>,
    latest_farm_name: Option<String>,
    /// Rows per section for the latest farm
    sections: Vec<SectionCount>,
}

#[derive(Debug, Serialize)]
struct SectionCount {
    section: EntityKind,
    rows: u64,
}

pub fn run(args: StatusArgs, config: &TamboConfig) -> anyhow::Result<()> {
    block_on(run_async(args, config))
}

async fn run_async(args: StatusArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let db = open_db(config).await?;

    let farms = db.count(EntityKind::Farm, None).await?;
    let latest = db.latest_farm().await?;
    let mut sections = Vec::new();
    let mut latest_farm_name = None;
    if let Some(farm_id) = &latest {
        let farm_rows = db.get(EntityKind::Farm, Some(farm_id)).await?;
        latest_farm_name = farm_rows
            .first()
            .and_then(|r| r.record.as_farm())
            .map(|f| f.name.clone());
        for kind in EntityKind::CHILDREN {
            sections.push(SectionCount {
                section: kind,
                rows: db.count(kind, Some(farm_id)).await?,
            });
        }
    }

    let output = StatusOutput {
        database: config.database_path.display().to_string(),
        farms,
        latest_farm: latest,
        latest_farm_name,
        sections,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database: {}", output.database);
    println!("Farms:    {}", output.farms);
    match (&output.latest_farm, &output.latest_farm_name) {
        (Some(id), name) => println!(
            "Latest:   {} ({})",
            name.as_deref().unwrap_or("unnamed"),
            short_id(id.as_str())
        ),
        (None, _) => {
            println!("Latest:   (none)");
            return Ok(());
        }
    }
    println!();
    print_table(
        &["section", "title", "rows"],
        output
            .sections
            .iter()
            .map(|s| {
                vec![
                    s.section.section_key().to_string(),
                    s.section.title().to_string(),
                    s.rows.to_string(),
                ]
            })
            .collect(),
    );
    Ok(())
}
