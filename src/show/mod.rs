pub mod overlay;

use anyhow::Result;
use colored::{ColoredString, Colorize};

use crate::cli::ShowArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, DictionaryData, Language};
use crate::store;
use crate::store::rows::Catalog;

pub fn run(args: ShowArgs) -> Result<()> {
    let language = Language::from_code(&args.lang).ok_or_else(|| {
        anyhow::anyhow!("Unsupported language: {} (expected en, de or pt)", args.lang)
    })?;

    let config = Config::load()?;
    let store = store::open_from(args.store.as_deref(), &config)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);

    let base = catalog.load()?;
    let view = overlay::overlay(&catalog, &base, language)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_listing(&view, language);
    Ok(())
}

fn print_listing(data: &DictionaryData, language: Language) {
    println!(
        "{}",
        format!("[Dictionary] {} ({})", data.title, language.display_name()).green()
    );
    if !data.description.is_empty() {
        println!("{}", data.description);
    }
    println!();

    if data.entries.is_empty() {
        println!("{}", "[WARN] No entries yet (try `lexikeep init --seed`)".yellow());
        return;
    }

    for (i, entry) in data.entries.iter().enumerate() {
        let mut headline = format!("{}. {}", i + 1, entry.word);
        if !entry.ipa.is_empty() {
            headline.push_str(&format!(" [{}]", entry.ipa));
        }
        println!("{}", paint(&headline, entry.color_combo));

        if !entry.origin.is_empty() {
            println!("   Origin: {}", entry.origin);
        }
        for (j, definition) in entry.definitions.iter().enumerate() {
            if definition.grammatical_class.is_empty() {
                println!("   {}. {}", j + 1, definition.meaning);
            } else {
                println!(
                    "   {}. ({}) {}",
                    j + 1,
                    definition.grammatical_class,
                    definition.meaning
                );
            }
            if let Some(ref example) = definition.example {
                println!("      Example: \"{}\"", example);
            }
        }
        println!();
    }
}

fn paint(text: &str, combo: u8) -> ColoredString {
    match combo {
        1 => text.cyan(),
        2 => text.green(),
        3 => text.yellow(),
        _ => text.magenta(),
    }
}
