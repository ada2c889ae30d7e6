pub mod identity;
pub mod reconcile;

use std::fs;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::SaveArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, DictionaryData};
use crate::store;

pub fn run(args: SaveArgs) -> Result<()> {
    let config = Config::load()?;
    let store = store::open_from(args.store.as_deref(), &config)?;

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read dictionary file: {}", args.file.display()))?;
    let data: DictionaryData = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dictionary file: {}", args.file.display()))?;

    println!(
        "{}",
        format!(
            "[Save] {} ({} entries)",
            args.file.display(),
            data.entries.len()
        )
        .green()
    );

    let (published, report) = reconcile::save_dictionary(store.as_ref(), DICTIONARY_ID, &data)?;

    println!(
        "  Entries:     {} updated, {} inserted, {} deleted",
        report.entries_updated, report.entries_inserted, report.entries_deleted
    );
    println!(
        "  Definitions: {} updated, {} inserted, {} deleted",
        report.definitions_updated, report.definitions_inserted, report.definitions_deleted
    );
    println!(
        "{}",
        format!(
            "[OK] Dictionary now holds {} entries",
            published.entries.len()
        )
        .green()
    );

    Ok(())
}
