use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::ExportArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, DictionaryData};
use crate::store;
use crate::store::rows::Catalog;
use crate::utils::sanitize_file_stem;

pub fn run(args: ExportArgs) -> Result<()> {
    let config = Config::load()?;
    let store = store::open_from(args.store.as_deref(), &config)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);
    let data = catalog.load()?;

    let path = match args.output {
        Some(p) => p,
        None => PathBuf::from(format!("{}_dictionary.txt", sanitize_file_stem(&data.title))),
    };

    fs::write(&path, render_listing(&data))
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    println!(
        "{}",
        format!(
            "[OK] Exported {} entries to {}",
            data.entries.len(),
            path.display()
        )
        .green()
    );
    Ok(())
}

/// Plain reading copy of the dictionary. Write-only; the importer never
/// accepts this format back.
pub fn render_listing(data: &DictionaryData) -> String {
    let mut content = format!("{}\n", data.title);
    content.push_str(&format!("{}\n\n", data.description));
    content.push_str(&"=".repeat(50));
    content.push_str("\n\n");

    for (index, entry) in data.entries.iter().enumerate() {
        content.push_str(&format!("{}. {}", index + 1, entry.word));
        if !entry.ipa.is_empty() {
            content.push_str(&format!(" [{}]", entry.ipa));
        }
        content.push('\n');

        if !entry.origin.is_empty() {
            content.push_str(&format!("   Origin: {}\n", entry.origin));
        }

        for (def_index, definition) in entry.definitions.iter().enumerate() {
            content.push_str(&format!(
                "   {}. ({}) {}",
                def_index + 1,
                definition.grammatical_class,
                definition.meaning
            ));
            if let Some(ref example) = definition.example {
                content.push_str(&format!("\n      Example: \"{}\"", example));
            }
            content.push('\n');
        }

        content.push('\n');
    }

    content
}
