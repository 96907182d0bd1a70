use anyhow::Result;
use brief_core::BriefMetadata;

use crate::cli::{truncate, ListArgs};
use crate::config::BriefConfig;

pub fn run(args: ListArgs, config: &BriefConfig) -> Result<()> {
    let store = config.open_store()?;

    let briefs = if args.saved {
        store.list_saved()?
    } else {
        store.list_recent(args.limit)?
    };
    let rows: Vec<BriefMetadata> = briefs.iter().map(|b| b.metadata()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_brief_table(&rows);
    }
    Ok(())
}

pub fn print_brief_table(rows: &[BriefMetadata]) {
    if rows.is_empty() {
        println!("(no briefs)");
        return;
    }
    println!(
        "{:<36}  {:<20}  {:<5}  {:<7}  {}",
        "ID", "CREATED", "SAVED", "SOURCES", "TITLE"
    );
    println!("{}", "─".repeat(100));
    for r in rows {
        println!(
            "{:<36}  {:<20}  {:<5}  {:<7}  {}",
            r.id,
            r.created_at.format("%Y-%m-%d %H:%M:%S"),
            if r.saved_at.is_some() { "yes" } else { "" },
            r.source_count,
            truncate(&r.title, 40)
        );
    }
}
