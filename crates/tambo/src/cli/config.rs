//! Config command - show resolved paths

use crate::cli::output::print_table;
use tambo::config::TamboConfig;

#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
}

pub fn run(args: ConfigArgs, config: &TamboConfig) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let config_file = match &config.config_file {
        Some(path) => path.display().to_string(),
        None => "(none)".to_string(),
    };
    print_table(
        &["setting", "value"],
        vec![
            vec!["home".into(), config.home.display().to_string()],
            vec!["database".into(), config.database_path.display().to_string()],
            vec!["logs".into(), config.log_dir.display().to_string()],
            vec![
                "log filter".into(),
                config
                    .log_filter
                    .clone()
                    .unwrap_or_else(|| tambo_logging::DEFAULT_LOG_FILTER.to_string()),
            ],
            vec!["config file".into(), config_file],
        ],
    );
    Ok(())
}
