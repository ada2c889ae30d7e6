//! Translation import: matching a filled template or JSON document against
//! the dictionary and persisting the recovered fields

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;

use crate::cli::ImportArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, Definition, DictionaryData, DictionaryEntry, Language};
use crate::store;
use crate::store::rows::{
    Catalog, DefinitionTranslationRow, DictionaryTranslationRow, EntryTranslationRow,
};
use crate::template::{
    DefinitionPatch, EntryPatch, TemplatePatch, TemplateParser, translation_value,
};
use crate::utils::{normalize_lookup, parse_target_language, truncate_display};

/// What an import run did, reported to the user in full. Matching failures
/// are warnings here, never hard errors.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub entries_processed: usize,
    pub entries_matched: usize,
    pub definitions_processed: usize,
    pub definitions_matched: usize,
    pub fields_written: usize,
    pub warnings: Vec<String>,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let language = parse_target_language(&args.lang)?;
    let config = Config::load()?;
    let store = store::open_from(args.store.as_deref(), &config)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read translation file: {}", args.file.display()))?;
    let is_json = args
        .file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let patch = if is_json {
        json_document_patch(&content)?
    } else {
        TemplateParser::new().parse(&content)
    };

    let base = catalog.load()?;
    let report = apply_patch(&catalog, &base, language, &patch)?;

    println!(
        "{}",
        format!(
            "[Import] {} translations from {}",
            language.display_name(),
            args.file.display()
        )
        .green()
    );
    println!(
        "  Entries:     {}/{} matched",
        report.entries_matched, report.entries_processed
    );
    println!(
        "  Definitions: {}/{} matched",
        report.definitions_matched, report.definitions_processed
    );
    println!("  Fields written: {}", report.fields_written);
    for warning in &report.warnings {
        println!("{}", format!("[WARN] {}", warning).yellow());
    }

    Ok(())
}

/// Match the patch against `base` and upsert one translation row per touched
/// owner. Rows are merged with their stored state first, so filling one
/// field never blanks a neighbour written by an earlier import.
pub fn apply_patch(
    catalog: &Catalog,
    base: &DictionaryData,
    language: Language,
    patch: &TemplatePatch,
) -> Result<ImportReport> {
    let mut report = ImportReport {
        warnings: patch.warnings.clone(),
        ..Default::default()
    };
    let code = language.code();

    let entry_ids: Vec<String> = base.entries.iter().map(|e| e.id.clone()).collect();
    let definition_ids: Vec<String> = base
        .entries
        .iter()
        .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
        .collect();
    let existing = catalog.translations_for(language, &entry_ids, &definition_ids)?;

    if patch.title.is_some() || patch.description.is_some() {
        let mut row = existing
            .dictionary
            .clone()
            .unwrap_or(DictionaryTranslationRow {
                dictionary_id: catalog.dictionary_id().to_string(),
                language: code.to_string(),
                title: None,
                description: None,
            });
        if let Some(ref title) = patch.title {
            row.title = Some(title.clone());
            report.fields_written += 1;
        }
        if let Some(ref description) = patch.description {
            row.description = Some(description.clone());
            report.fields_written += 1;
        }
        if row.has_content() {
            catalog.upsert_dictionary_translation(&row)?;
        }
    }

    let mut entry_rows: BTreeMap<String, EntryTranslationRow> = BTreeMap::new();
    let mut definition_rows: BTreeMap<String, DefinitionTranslationRow> = BTreeMap::new();

    for entry_patch in patch.entries.values() {
        report.entries_processed += 1;

        if entry_patch.word.trim().is_empty() {
            report
                .warnings
                .push("Entry block without a word line skipped".to_string());
            continue;
        }
        let Some(matched) = match_entry(base, &entry_patch.word) else {
            report
                .warnings
                .push(format!("Entry not found for word: {}", entry_patch.word));
            continue;
        };
        report.entries_matched += 1;

        if let Some(ref origin) = entry_patch.origin_translation {
            let row = entry_rows.entry(matched.id.clone()).or_insert_with(|| {
                existing
                    .entries
                    .get(&matched.id)
                    .cloned()
                    .unwrap_or(EntryTranslationRow {
                        entry_id: matched.id.clone(),
                        language: code.to_string(),
                        origin: None,
                    })
            });
            row.origin = Some(origin.clone());
            report.fields_written += 1;
        }

        for (index, def_patch) in &entry_patch.definitions {
            report.definitions_processed += 1;

            let Some(matched_def) = match_definition(matched, *index, def_patch) else {
                report.warnings.push(format!(
                    "Definition not found for: {} - {}",
                    def_patch.grammatical_class,
                    truncate_display(&def_patch.meaning, 40)
                ));
                continue;
            };
            report.definitions_matched += 1;

            if def_patch.is_empty() {
                continue;
            }
            let row = definition_rows
                .entry(matched_def.id.clone())
                .or_insert_with(|| {
                    existing
                        .definitions
                        .get(&matched_def.id)
                        .cloned()
                        .unwrap_or(DefinitionTranslationRow {
                            definition_id: matched_def.id.clone(),
                            language: code.to_string(),
                            grammatical_class: None,
                            meaning: None,
                            example: None,
                        })
                });
            if let Some(ref value) = def_patch.class_translation {
                row.grammatical_class = Some(value.clone());
                report.fields_written += 1;
            }
            if let Some(ref value) = def_patch.meaning_translation {
                row.meaning = Some(value.clone());
                report.fields_written += 1;
            }
            if let Some(ref value) = def_patch.example_translation {
                row.example = Some(value.clone());
                report.fields_written += 1;
            }
        }
    }

    let entry_rows: Vec<EntryTranslationRow> = entry_rows
        .into_values()
        .filter(|r| r.has_content())
        .collect();
    if !entry_rows.is_empty() {
        catalog.upsert_entry_translations(&entry_rows)?;
    }

    let definition_rows: Vec<DefinitionTranslationRow> = definition_rows
        .into_values()
        .filter(|r| r.has_content())
        .collect();
    if !definition_rows.is_empty() {
        catalog.upsert_definition_translations(&definition_rows)?;
    }

    Ok(report)
}

/// Case-insensitive exact word match, then an alphanumeric-only lowercased
/// fallback for words that differ in punctuation or spacing.
fn match_entry<'a>(base: &'a DictionaryData, word: &str) -> Option<&'a DictionaryEntry> {
    let lowered = word.to_lowercase();
    if let Some(entry) = base.entries.iter().find(|e| e.word.to_lowercase() == lowered) {
        return Some(entry);
    }

    let normalized = normalize_lookup(word);
    if normalized.is_empty() {
        return None;
    }
    base.entries
        .iter()
        .find(|e| normalize_lookup(&e.word) == normalized)
}

/// Case-insensitive (class, meaning) match, then the template's positional
/// index, then class alone.
fn match_definition<'a>(
    entry: &'a DictionaryEntry,
    template_index: usize,
    patch: &DefinitionPatch,
) -> Option<&'a Definition> {
    let class = patch.grammatical_class.to_lowercase();
    let meaning = patch.meaning.to_lowercase();

    if let Some(definition) = entry.definitions.iter().find(|d| {
        d.grammatical_class.to_lowercase() == class && d.meaning.to_lowercase() == meaning
    }) {
        return Some(definition);
    }

    if template_index >= 1
        && let Some(definition) = entry.definitions.get(template_index - 1)
    {
        return Some(definition);
    }

    if class.is_empty() {
        return None;
    }
    entry
        .definitions
        .iter()
        .find(|d| d.grammatical_class.to_lowercase() == class)
}

#[derive(Debug, Deserialize)]
struct JsonDocument {
    dictionary: JsonDictionary,
    entries: Vec<JsonEntry>,
}

#[derive(Debug, Deserialize)]
struct JsonDictionary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntry {
    word: String,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    definitions: Vec<JsonDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonDefinition {
    #[serde(default)]
    grammatical_class: String,
    #[serde(default)]
    meaning: String,
    #[serde(default)]
    grammatical_class_translation: Option<String>,
    #[serde(default)]
    meaning_translation: Option<String>,
    #[serde(default)]
    example_translation: Option<String>,
}

/// Convert a JSON translation document into the same sparse patch the
/// template parser produces, so both formats share one apply path.
fn json_document_patch(content: &str) -> Result<TemplatePatch> {
    let document: JsonDocument = serde_json::from_str(content).context(
        "Invalid translation file format (expected dictionary and entries properties)",
    )?;

    let mut patch = TemplatePatch {
        title: document
            .dictionary
            .title
            .as_deref()
            .and_then(translation_value),
        description: document
            .dictionary
            .description
            .as_deref()
            .and_then(translation_value),
        ..Default::default()
    };

    for (i, entry) in document.entries.into_iter().enumerate() {
        let mut entry_patch = EntryPatch {
            word: entry.word,
            origin_translation: entry.origin.as_deref().and_then(translation_value),
            definitions: BTreeMap::new(),
        };
        for (j, definition) in entry.definitions.into_iter().enumerate() {
            entry_patch.definitions.insert(
                j + 1,
                DefinitionPatch {
                    grammatical_class: definition.grammatical_class,
                    meaning: definition.meaning,
                    class_translation: definition
                        .grammatical_class_translation
                        .as_deref()
                        .and_then(translation_value),
                    meaning_translation: definition
                        .meaning_translation
                        .as_deref()
                        .and_then(translation_value),
                    example_translation: definition
                        .example_translation
                        .as_deref()
                        .and_then(translation_value),
                },
            );
        }
        patch.entries.insert(i + 1, entry_patch);
    }

    Ok(patch)
}
