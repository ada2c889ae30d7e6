//! Identity-preserving persistence of an edited dictionary
//!
//! Replaces the stored dictionary contents with the edited state while
//! keeping row ids stable for everything that logically survived the edit.
//! Translation rows are keyed by those ids, so id churn here silently strips
//! translations from the whole dictionary.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde_json::{Value, json};

use super::identity::Resolver;
use crate::model::{self, Definition, DictionaryData, slugify};
use crate::store::rows::{Catalog, DefinitionRow, EntryRow, to_row};
use crate::store::{Filter, Row, RowStore, StoreError, Table};

/// Row-level outcome counts for one save.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub entries_updated: usize,
    pub entries_inserted: usize,
    pub entries_deleted: usize,
    pub definitions_updated: usize,
    pub definitions_inserted: usize,
    pub definitions_deleted: usize,
}

fn patch(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Persist `data` as the new contents of the dictionary and return the
/// re-fetched state plus what changed.
///
/// Steps run in a fixed order: validate, normalize, overwrite the singleton
/// dictionary row, reconcile entries and their definitions against the
/// persisted snapshot, delete what the editor removed, then re-read. A store
/// failure aborts at that point; writes already issued stay committed, the
/// backends used here offer no multi-statement transaction to roll back.
pub fn save_dictionary(
    store: &dyn RowStore,
    dictionary_id: &str,
    data: &DictionaryData,
) -> Result<(DictionaryData, SaveReport)> {
    model::validate(data)?;

    let mut state = data.clone();
    model::normalize_entries(&mut state.entries);
    tracing::debug!(entries = state.entries.len(), "reconciling dictionary");

    let dict_patch = patch(json!({
        "title": state.title,
        "description": state.description,
    }));
    let affected = store.update(
        Table::Dictionaries,
        &Filter::eq("id", dictionary_id),
        &dict_patch,
    )?;
    if affected == 0 {
        store.insert(
            Table::Dictionaries,
            &[patch(json!({
                "id": dictionary_id,
                "title": state.title,
                "description": state.description,
            }))],
        )?;
    }

    let catalog = Catalog::new(store, dictionary_id);
    let persisted_entries = catalog.entries()?;
    let entry_ids: Vec<String> = persisted_entries.iter().map(|e| e.id.clone()).collect();
    let persisted_defs = catalog.definitions_for(&entry_ids)?;

    let mut defs_by_entry: HashMap<String, Vec<DefinitionRow>> = HashMap::new();
    let mut used_def_ids: HashSet<String> = HashSet::new();
    for def in persisted_defs {
        used_def_ids.insert(def.id.clone());
        defs_by_entry
            .entry(def.entry_id.clone())
            .or_default()
            .push(def);
    }

    let resolver = Resolver::new();
    let mut used_ids: HashSet<String> = entry_ids.iter().cloned().collect();
    let mut touched: HashSet<String> = HashSet::new();
    let mut report = SaveReport::default();

    for (index, entry) in state.entries.iter().enumerate() {
        // A target already claimed by an earlier duplicate is off the table;
        // the later copy falls through to the insert path.
        let resolved = resolver
            .resolve_entry(entry, &persisted_entries)
            .filter(|row| !touched.contains(&row.id));

        let entry_id = match resolved {
            Some(row) => {
                let entry_patch = patch(json!({
                    "word": entry.word,
                    "ipa": entry.ipa,
                    "origin": entry.origin,
                    "audio_url": entry.audio_url,
                    "color_combo": entry.color_combo,
                    "position": index as i64,
                }));
                store.update(
                    Table::Entries,
                    &Filter::eq("id", row.id.clone()),
                    &entry_patch,
                )?;
                report.entries_updated += 1;
                row.id.clone()
            }
            None => {
                let id = resolver.insertion_id(&entry.id, &used_ids);
                let slug = entry
                    .slug
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| slugify(&entry.word));
                let row = EntryRow {
                    id: id.clone(),
                    dictionary_id: dictionary_id.to_string(),
                    word: entry.word.clone(),
                    ipa: entry.ipa.clone(),
                    origin: entry.origin.clone(),
                    audio_url: entry.audio_url.clone(),
                    color_combo: i64::from(entry.color_combo),
                    position: index as i64,
                    slug: Some(slug).filter(|s| !s.is_empty()),
                };
                store.insert(Table::Entries, &[to_row(&row)?])?;
                report.entries_inserted += 1;
                id
            }
        };
        used_ids.insert(entry_id.clone());
        touched.insert(entry_id.clone());

        let persisted_for_entry = defs_by_entry.remove(&entry_id).unwrap_or_default();
        reconcile_definitions(
            store,
            &resolver,
            &entry_id,
            &entry.definitions,
            &persisted_for_entry,
            &mut used_def_ids,
            &mut report,
        )?;
    }

    let stale: Vec<String> = persisted_entries
        .iter()
        .filter(|row| !touched.contains(&row.id))
        .map(|row| row.id.clone())
        .collect();
    if !stale.is_empty() {
        store.delete(Table::Definitions, &Filter::id_set("entry_id", &stale))?;
        report.entries_deleted = store.delete(Table::Entries, &Filter::id_set("id", &stale))?;
    }

    let published = catalog.load()?;
    Ok((published, report))
}

fn reconcile_definitions(
    store: &dyn RowStore,
    resolver: &Resolver,
    entry_id: &str,
    edited: &[Definition],
    persisted: &[DefinitionRow],
    used_ids: &mut HashSet<String>,
    report: &mut SaveReport,
) -> Result<(), StoreError> {
    let mut touched: HashSet<String> = HashSet::new();

    for (index, definition) in edited.iter().enumerate() {
        let resolved = resolver
            .resolve_definition(definition, index, persisted)
            .filter(|row| !touched.contains(&row.id));

        match resolved {
            Some(row) => {
                let def_patch = patch(json!({
                    "grammatical_class": definition.grammatical_class,
                    "meaning": definition.meaning,
                    "example": definition.example,
                    "position": index as i64,
                }));
                store.update(
                    Table::Definitions,
                    &Filter::eq("id", row.id.clone()),
                    &def_patch,
                )?;
                touched.insert(row.id.clone());
                report.definitions_updated += 1;
            }
            None => {
                let id = resolver.insertion_id(&definition.id, used_ids);
                let row = DefinitionRow {
                    id: id.clone(),
                    entry_id: entry_id.to_string(),
                    grammatical_class: definition.grammatical_class.clone(),
                    meaning: definition.meaning.clone(),
                    example: definition.example.clone(),
                    position: index as i64,
                };
                store.insert(Table::Definitions, &[to_row(&row)?])?;
                used_ids.insert(id.clone());
                touched.insert(id);
                report.definitions_inserted += 1;
            }
        }
    }

    let stale: Vec<String> = persisted
        .iter()
        .filter(|row| !touched.contains(&row.id))
        .map(|row| row.id.clone())
        .collect();
    if !stale.is_empty() {
        report.definitions_deleted += store.delete(Table::Definitions, &Filter::id_set("id", &stale))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DICTIONARY_ID, DictionaryEntry, ValidationError};
    use crate::store::sqlite::SqliteStore;

    fn def(class: &str, meaning: &str) -> Definition {
        Definition {
            grammatical_class: class.to_string(),
            meaning: meaning.to_string(),
            ..Default::default()
        }
    }

    fn entry(word: &str, definitions: Vec<Definition>) -> DictionaryEntry {
        DictionaryEntry {
            word: word.to_string(),
            definitions,
            ..Default::default()
        }
    }

    fn sample() -> DictionaryData {
        DictionaryData {
            title: "My Words".to_string(),
            description: "Collected while reading".to_string(),
            entries: vec![
                entry("zebra", vec![def("noun", "a striped animal")]),
                entry("apple", vec![def("noun", "a fruit"), def("noun", "a tree")]),
            ],
        }
    }

    #[test]
    fn test_first_save_inserts_and_normalizes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (published, report) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        assert_eq!(report.entries_inserted, 2);
        assert_eq!(report.definitions_inserted, 3);
        assert_eq!(report.entries_updated, 0);

        let words: Vec<&str> = published.entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["apple", "zebra"]);
        assert_eq!(published.entries[0].color_combo, 1);
        assert_eq!(published.entries[1].color_combo, 2);
        assert_eq!(published.entries[0].slug.as_deref(), Some("apple"));
    }

    #[test]
    fn test_resave_with_trivial_edit_preserves_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (mut published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        let entry_ids: Vec<String> = published.entries.iter().map(|e| e.id.clone()).collect();
        let def_ids: Vec<String> = published
            .entries
            .iter()
            .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
            .collect();

        published.entries[0].definitions[0].meaning = "a crisp orchard fruit".to_string();
        let (republished, report) = save_dictionary(&store, DICTIONARY_ID, &published).unwrap();

        assert_eq!(report.entries_updated, 2);
        assert_eq!(report.entries_inserted, 0);
        assert_eq!(report.definitions_updated, 3);
        assert_eq!(report.definitions_inserted, 0);
        assert_eq!(report.definitions_deleted, 0);

        let new_entry_ids: Vec<String> = republished.entries.iter().map(|e| e.id.clone()).collect();
        let new_def_ids: Vec<String> = republished
            .entries
            .iter()
            .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
            .collect();
        assert_eq!(entry_ids, new_entry_ids);
        assert_eq!(def_ids, new_def_ids);
    }

    #[test]
    fn test_resave_without_ids_matches_by_slug() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();
        let original_ids: Vec<String> = published.entries.iter().map(|e| e.id.clone()).collect();

        let mut stripped = published.clone();
        for entry in &mut stripped.entries {
            entry.id = String::new();
        }
        let (republished, report) = save_dictionary(&store, DICTIONARY_ID, &stripped).unwrap();

        assert_eq!(report.entries_updated, 2);
        assert_eq!(report.entries_inserted, 0);
        let ids: Vec<String> = republished.entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, original_ids);
    }

    #[test]
    fn test_removed_entry_is_deleted_with_its_children() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        let zebra_id = published.entries[1].id.clone();
        let apple_id = published.entries[0].id.clone();

        let mut edited = published.clone();
        edited.entries.remove(1);
        let (republished, report) = save_dictionary(&store, DICTIONARY_ID, &edited).unwrap();

        assert_eq!(report.entries_deleted, 1);
        assert_eq!(republished.entries.len(), 1);
        assert_eq!(republished.entries[0].id, apple_id);

        let orphans = store
            .select(
                Table::Definitions,
                &Filter::eq("entry_id", zebra_id.clone()),
                None,
            )
            .unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_duplicate_resolution_targets_do_not_corrupt() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();
        let apple_id = published.entries[0].id.clone();

        // Two edited entries both claim apple's id; the first keeps it, the
        // second must become a new row rather than clobber anything.
        let mut edited = published.clone();
        let mut twin = edited.entries[0].clone();
        twin.word = "apricot".to_string();
        twin.slug = None;
        edited.entries.push(twin);

        let (republished, _) = save_dictionary(&store, DICTIONARY_ID, &edited).unwrap();
        assert_eq!(republished.entries.len(), 3);

        let ids: HashSet<String> = republished.entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&apple_id));
    }

    #[test]
    fn test_color_rotation_over_many_entries() {
        let store = SqliteStore::open_in_memory().unwrap();
        let words = ["fig", "date", "elm", "ash", "cedar", "birch"];
        let data = DictionaryData {
            title: "Trees".to_string(),
            description: String::new(),
            entries: words
                .iter()
                .map(|w| entry(w, vec![def("noun", "a tree")]))
                .collect(),
        };

        let (published, _) = save_dictionary(&store, DICTIONARY_ID, &data).unwrap();
        let colors: Vec<u8> = published.entries.iter().map(|e| e.color_combo).collect();
        assert_eq!(colors, vec![1, 2, 3, 4, 1, 2]);
    }

    #[test]
    fn test_stale_definition_is_deleted() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        let mut edited = published.clone();
        edited.entries[0].definitions.truncate(1);
        let (republished, report) = save_dictionary(&store, DICTIONARY_ID, &edited).unwrap();

        assert_eq!(report.definitions_deleted, 1);
        assert_eq!(republished.entries[0].definitions.len(), 1);
        assert_eq!(republished.entries[0].definitions[0].meaning, "a fruit");
    }

    #[test]
    fn test_validation_failure_leaves_store_untouched() {
        let store = SqliteStore::open_in_memory().unwrap();
        save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        let mut bad = sample();
        bad.title = "Changed".to_string();
        bad.entries[0].definitions[0].meaning = "   ".to_string();

        let err = save_dictionary(&store, DICTIONARY_ID, &bad).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());

        let catalog = Catalog::new(&store, DICTIONARY_ID);
        assert_eq!(catalog.dictionary().unwrap().title, "My Words");
    }

    #[test]
    fn test_title_and_description_always_overwritten() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (mut published, _) = save_dictionary(&store, DICTIONARY_ID, &sample()).unwrap();

        published.title = "Renamed".to_string();
        published.description = String::new();
        let (republished, _) = save_dictionary(&store, DICTIONARY_ID, &published).unwrap();

        assert_eq!(republished.title, "Renamed");
        assert_eq!(republished.description, "");
    }
}
