use anyhow::{Context as _, Result};
use kairo_config::AppConfig;
use kairo_core::DialingRuleTable;
use kairo_store::Store;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

pub mod reconcile;
pub mod users;
pub mod variations;

pub struct Context<'a> {
    pub store: &'a Store,
    pub db_path: &'a Path,
    pub json: bool,
    pub config: &'a AppConfig,
    pub dialing: &'a DialingRuleTable,
}

pub fn load_dialing_table(config: &AppConfig) -> Result<DialingRuleTable> {
    match config.dialing_codes.as_deref() {
        Some(path) => DialingRuleTable::load(path)
            .with_context(|| format!("load dialing codes {}", path.display())),
        None => DialingRuleTable::builtin().with_context(|| "load built-in dialing codes"),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
