//! CLI module for tambo
//!
//! Each command exposes an `Args` struct and a `run` function. Commands that
//! touch the database run on a current-thread tokio runtime.

pub mod config;
pub mod error;
pub mod output;
pub mod records;
pub mod status;
pub mod summary;
pub mod transfer;

use error::HelpfulError;
use std::future::Future;
use tambo::config::TamboConfig;
use tambo_db::{EntityKind, FarmId, TamboDb};

/// Run an async command body to completion.
pub(crate) fn block_on<T>(fut: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(fut)
}

pub(crate) async fn open_db(config: &TamboConfig) -> anyhow::Result<TamboDb> {
    TamboDb::open(&config.database_path).await.map_err(|e| {
        HelpfulError::new("Failed to open database")
            .with_context(format!("Database: {}", config.database_path.display()))
            .with_suggestion(format!("Error: {}", e))
            .with_suggestion("TRY: Check file permissions")
            .with_suggestion("TRY: Pass --db <path> or set TAMBO_DB")
            .into()
    })
}

pub(crate) fn parse_section(name: &str) -> Result<EntityKind, HelpfulError> {
    EntityKind::parse(name).ok_or_else(|| HelpfulError::unknown_section(name))
}

pub(crate) fn parse_farm(farm: Option<&str>) -> Result<Option<FarmId>, HelpfulError> {
    farm.map(|f| {
        FarmId::parse(f).map_err(|e| {
            HelpfulError::new(format!("Invalid farm id: '{}'", f)).with_context(e.to_string())
        })
    })
    .transpose()
}
