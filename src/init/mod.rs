//! Store bootstrap and sample data

use anyhow::Result;
use colored::Colorize;

use crate::cli::InitArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, Definition, DictionaryData, DictionaryEntry};
use crate::save::reconcile::save_dictionary;
use crate::store;
use crate::store::rows::{Catalog, DictionaryRow, to_row};
use crate::store::{StoreError, Table};

pub fn run(args: InitArgs) -> Result<()> {
    let config = Config::load()?;
    let store = store::open_from(args.store.as_deref(), &config)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);

    println!("{}", "[Init] Preparing dictionary store".green());

    if args.seed {
        let existing = catalog.entries()?;
        if !existing.is_empty() {
            anyhow::bail!(
                "Refusing to seed: the dictionary already holds {} entries",
                existing.len()
            );
        }

        let (published, _) = save_dictionary(store.as_ref(), DICTIONARY_ID, &sample_dictionary())?;
        println!(
            "  Seeded \"{}\" with {} entries",
            published.title,
            published.entries.len()
        );
        println!("{}", "[OK] Store ready".green());
        return Ok(());
    }

    match catalog.dictionary() {
        Ok(row) => {
            println!("  Dictionary already present: \"{}\"", row.title);
        }
        Err(StoreError::MissingDictionary(_)) => {
            let row = DictionaryRow {
                id: DICTIONARY_ID.to_string(),
                title: "My Dictionary".to_string(),
                description: String::new(),
            };
            store.insert(Table::Dictionaries, &[to_row(&row)?])?;
            println!("  Created empty dictionary \"My Dictionary\"");
        }
        Err(e) => return Err(e.into()),
    }

    println!("{}", "[OK] Store ready".green());
    Ok(())
}

/// Starter content passed through the normal save path, so ids, slugs,
/// sort order and colors all come out the same way user data would.
fn sample_dictionary() -> DictionaryData {
    DictionaryData {
        title: "Luca's Dictionary".to_string(),
        description: "A collection of unique words from our little linguist as he learns \
                      to speak three languages at once."
            .to_string(),
        entries: vec![
            DictionaryEntry {
                word: "baba".to_string(),
                ipa: "/ˈbaba/".to_string(),
                origin: "From seeing soap bubbles in the bath".to_string(),
                definitions: vec![Definition {
                    grammatical_class: "noun".to_string(),
                    meaning: "Any round object, especially balls or bubbles".to_string(),
                    example: Some("Look at the baba in the sky!".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            DictionaryEntry {
                word: "nana-nana".to_string(),
                ipa: "/ˈnana ˈnana/".to_string(),
                origin: "Started with bananas, expanded to all favorite fruits".to_string(),
                definitions: vec![
                    Definition {
                        grammatical_class: "noun".to_string(),
                        meaning: "Banana, but also any yellow fruit".to_string(),
                        ..Default::default()
                    },
                    Definition {
                        grammatical_class: "exclamation".to_string(),
                        meaning: "Expression of joy when eating something sweet".to_string(),
                        example: Some("Nana-nana! (while eating apple slices)".to_string()),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            DictionaryEntry {
                word: "wawa".to_string(),
                ipa: "/ˈwawa/".to_string(),
                origin: "One of his first words, from trying to say \"water\"".to_string(),
                definitions: vec![Definition {
                    grammatical_class: "noun".to_string(),
                    meaning: "Water in any form - drinking water, bath water, rain".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            DictionaryEntry {
                word: "tata".to_string(),
                ipa: "/ˈtata/".to_string(),
                origin: "From Italian \"ciao\" mixed with English \"ta-ta\"".to_string(),
                definitions: vec![
                    Definition {
                        grammatical_class: "interjection".to_string(),
                        meaning: "Goodbye, but also used when throwing things away".to_string(),
                        ..Default::default()
                    },
                    Definition {
                        grammatical_class: "verb".to_string(),
                        meaning: "To leave or to make something disappear".to_string(),
                        example: Some("Tata toys! (when putting toys in the box)".to_string()),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            DictionaryEntry {
                word: "mimi".to_string(),
                ipa: "/ˈmimi/".to_string(),
                origin: "From Spanish \"dormir\" and French \"dodo\"".to_string(),
                definitions: vec![
                    Definition {
                        grammatical_class: "noun".to_string(),
                        meaning: "Sleep or anything related to bedtime".to_string(),
                        ..Default::default()
                    },
                    Definition {
                        grammatical_class: "adjective".to_string(),
                        meaning: "Tired, sleepy".to_string(),
                        example: Some("Luca mimi now".to_string()),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        ],
    }
}
