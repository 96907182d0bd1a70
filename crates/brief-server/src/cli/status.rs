use anyhow::Result;
use brief_core::HealthReporter;

use crate::config::BriefConfig;

pub fn run(config: &BriefConfig) -> Result<()> {
    let store = config.open_store()?;
    let report = HealthReporter::new(store, config.llm.is_configured()).check();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
