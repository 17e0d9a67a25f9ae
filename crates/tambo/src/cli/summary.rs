//! Summary command - computed farm and herd figures

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_number, print_table};
use crate::cli::{block_on, open_db, parse_farm};
use serde::Serialize;
use tambo::config::TamboConfig;
use tambo::summary::{FarmSummary, HerdSummary};
use tambo::SessionContext;
use tambo_db::FarmId;

#[derive(Debug)]
pub struct SummaryArgs {
    pub farm: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    farm_id: FarmId,
    farm: FarmSummary,
    herd: HerdSummary,
}

pub fn run(args: SummaryArgs, config: &TamboConfig) -> anyhow::Result<()> {
    let farm = parse_farm(args.farm.as_deref())?;
    block_on(run_async(farm, args.json, config))
}

async fn run_async(farm: Option<FarmId>, json: bool, config: &TamboConfig) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let ctx = SessionContext::with_farm(db, farm);
    let snapshot = ctx
        .snapshot()
        .await
        .map_err(HelpfulError::store)?
        .ok_or_else(HelpfulError::no_data)?;

    let farm = snapshot
        .farm
        .record
        .as_farm()
        .ok_or_else(|| HelpfulError::new("Stored farm row has the wrong kind"))?;
    let output = SummaryOutput {
        farm_id: snapshot.farm_id(),
        farm: FarmSummary::from_farm(farm),
        herd: HerdSummary::from_snapshot(&snapshot),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let stocking = output
        .farm
        .stocking_rate
        .map(|r| format!("{:.2} cows/ha", r))
        .unwrap_or_else(|| "n/a".to_string());
    let mut rows = vec![
        vec!["Farm".to_string(), output.farm.name.clone()],
        vec![
            "Daily production".to_string(),
            format!("{} L/day", format_number(output.farm.total_daily_production)),
        ],
        vec!["Stocking rate".to_string(), stocking],
        vec!["Animals".to_string(), output.herd.total_animals.to_string()],
        vec!["Herd categories".to_string(), output.herd.categories.to_string()],
        vec![
            "Total live weight".to_string(),
            format!("{} kg", format_number(output.herd.total_live_weight)),
        ],
        vec![
            "Dry matter intake".to_string(),
            format!("{} kg/day", format_number(output.herd.total_dry_matter)),
        ],
    ];
    if let Some(diet) = &output.herd.diet {
        rows.push(vec![
            "Diet (pasture/concentrate/other)".to_string(),
            format!("{:.0}% / {:.0}% / {:.0}%", diet.pasture, diet.concentrate, diet.others),
        ]);
    }
    print_table(&["metric", "value"], rows);
    Ok(())
}
