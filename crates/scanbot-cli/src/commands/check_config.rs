use anyhow::{Context, Result};
use scanbot_infrastructure::ConfigService;
use std::path::Path;

use super::run::build_catalog;

pub fn execute(path: Option<&Path>) -> Result<()> {
    let config = ConfigService::new()
        .load(path)
        .context("Failed to load configuration")?;
    let catalog = build_catalog(&config)?;

    println!("{:#?}", config);
    println!("\nScan functions offered:");
    for function in catalog.functions() {
        println!("  - {}", function);
    }

    Ok(())
}
