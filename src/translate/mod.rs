//! Fill missing translation rows through an external provider

pub mod cache;
pub mod llm;
pub mod machine_translate;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::TranslateArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, DictionaryData, Language};
use crate::store;
use crate::store::rows::{
    Catalog, DefinitionTranslationRow, DictionaryTranslationRow, EntryTranslationRow,
    TranslationSet,
};
use crate::utils::parse_target_language;
use cache::TranslationCache;
use llm::{LlmClient, LlmConfig, LlmProvider};
use machine_translate::{MachineTranslateClient, MachineTranslateConfig};

/// Which translation-row field a provider result lands in.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    DictionaryTitle,
    DictionaryDescription,
    EntryOrigin(String),
    DefinitionClass(String),
    DefinitionMeaning(String),
    DefinitionExample(String),
}

/// One base-language field queued for the provider. The context string lets
/// an LLM disambiguate short fragments like a bare part-of-speech label.
#[derive(Debug)]
struct FieldTask {
    slot: Slot,
    label: String,
    text: String,
    context: Option<String>,
}

struct TranslationStats {
    cache_hits: usize,
    api_calls: usize,
}

enum TranslateClient {
    Llm(LlmClient),
    Machine(MachineTranslateClient),
}

impl TranslateClient {
    fn translate_tasks<F>(
        &self,
        tasks: &[FieldTask],
        cache: Option<&TranslationCache>,
        progress_callback: Option<F>,
    ) -> (Vec<Result<String>>, TranslationStats)
    where
        F: Fn(usize) + Send + Sync,
    {
        match self {
            Self::Machine(c) => {
                let texts: Vec<String> = tasks.iter().map(|t| t.text.clone()).collect();
                if let Some(cache) = cache {
                    let result = c.translate_batch_cached(&texts, cache, progress_callback);
                    let stats = TranslationStats {
                        cache_hits: result.cache_hits,
                        api_calls: result.api_calls,
                    };
                    (result.translations, stats)
                } else {
                    let results = c.translate_batch(&texts, progress_callback);
                    let stats = TranslationStats {
                        cache_hits: 0,
                        api_calls: texts.len(),
                    };
                    (results, stats)
                }
            }
            Self::Llm(c) => {
                let results: Vec<Result<String>> = tasks
                    .iter()
                    .enumerate()
                    .map(|(i, task)| {
                        let result = c.translate(&task.text, task.context.as_deref());
                        if let Some(ref cb) = progress_callback {
                            cb(i + 1);
                        }
                        result
                    })
                    .collect();
                let stats = TranslationStats {
                    cache_hits: 0,
                    api_calls: tasks.len(),
                };
                (results, stats)
            }
        }
    }
}

pub fn run(args: TranslateArgs) -> Result<()> {
    let cfg = Config::load()?;

    // CLI arg > config > built-in default, for both the provider and the
    // target language.
    let provider_str = if args.api != "google" {
        args.api.clone()
    } else {
        cfg.api.provider.clone()
    };
    let provider = LlmProvider::from_str(&provider_str);

    let lang_code = args
        .lang
        .clone()
        .unwrap_or_else(|| cfg.translation.default_language.clone());
    let language = parse_target_language(&lang_code)?;

    let client = if provider.is_machine_translate() {
        create_machine_client(provider, language, &cfg, &args)?
    } else {
        create_llm_client(provider, &provider_str, language, &cfg, &args)?
    };

    let store = store::open_from(args.store.as_deref(), &cfg)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);
    let base = catalog.load()?;

    println!(
        "{}",
        format!("[Translate] {} -> {}", base.title, language.display_name()).green()
    );

    let entry_ids: Vec<String> = base.entries.iter().map(|e| e.id.clone()).collect();
    let definition_ids: Vec<String> = base
        .entries
        .iter()
        .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
        .collect();
    let existing = catalog.translations_for(language, &entry_ids, &definition_ids)?;

    let tasks = collect_tasks(&base, &existing, args.overwrite);

    if tasks.is_empty() {
        println!(
            "{}",
            format!(
                "[WARN] Nothing to translate; every field already has a {} translation",
                language.display_name()
            )
            .yellow()
        );
        return Ok(());
    }

    println!("  Found {} untranslated field(s)", tasks.len());

    let cache = TranslationCache::open().ok();
    if cache.is_some() {
        println!("  Translation cache enabled");
    }

    let pb = ProgressBar::new(tasks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let (results, stats) = client.translate_tasks(
        &tasks,
        cache.as_ref(),
        Some(|count| {
            pb.set_position(count as u64);
        }),
    );

    let staged = stage_results(
        &tasks,
        results,
        &existing,
        catalog.dictionary_id(),
        language,
        |label, e| {
            pb.suspend(|| {
                eprintln!(
                    "{}",
                    format!("[ERROR] Failed to translate {}: {}", label, e).red()
                );
            });
        },
    );

    pb.finish_and_clear();

    if let Some(ref row) = staged.dictionary {
        catalog.upsert_dictionary_translation(row)?;
    }
    if !staged.entries.is_empty() {
        catalog.upsert_entry_translations(&staged.entries)?;
    }
    if !staged.definitions.is_empty() {
        catalog.upsert_definition_translations(&staged.definitions)?;
    }

    if stats.cache_hits > 0 {
        println!(
            "  Stats: {} cached, {} API calls",
            format!("{}", stats.cache_hits).green(),
            stats.api_calls
        );
    }
    if staged.failed > 0 {
        println!(
            "{}",
            format!(
                "[WARN] {} field(s) failed; rerun translate to retry them",
                staged.failed
            )
            .yellow()
        );
    }
    println!(
        "{}",
        format!(
            "[OK] Stored {} translated field(s) for {}",
            staged.written,
            language.display_name()
        )
        .green()
    );

    Ok(())
}

fn create_machine_client(
    provider: LlmProvider,
    language: Language,
    cfg: &Config,
    args: &TranslateArgs,
) -> Result<TranslateClient> {
    let config = match provider {
        LlmProvider::Google => {
            println!("{}", "[Translate] Using Google Translate".cyan());
            MachineTranslateConfig::google(language)
        }
        LlmProvider::DeepL => {
            let api_key = args
                .api_key
                .clone()
                .or_else(|| cfg.get_api_key("deepl"))
                .context("DeepL API key required. Get free key at https://www.deepl.com/pro-api")?;
            println!("{}", "[Translate] Using DeepL".cyan());
            MachineTranslateConfig::deepl(language, api_key)
        }
        _ => unreachable!(),
    };

    let client = MachineTranslateClient::new(config)?;
    Ok(TranslateClient::Machine(client))
}

fn create_llm_client(
    provider: LlmProvider,
    provider_str: &str,
    language: Language,
    cfg: &Config,
    args: &TranslateArgs,
) -> Result<TranslateClient> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| cfg.get_api_key(provider_str));

    if api_key.is_none() && provider != LlmProvider::Ollama {
        anyhow::bail!(
            "API key required for {}. Set via --api-key, config, or environment variable.\n\
             Run 'lexikeep config init' to create a config file.\n\
             Or use --api google for free translation.",
            provider_str
        );
    }

    let api_base = args
        .api_base
        .clone()
        .or_else(|| cfg.get_api_base(provider_str));
    let model = args.model.clone().or_else(|| cfg.get_model(provider_str));

    let config = LlmConfig::new(provider, language)
        .with_api_key(api_key)
        .with_base_url(api_base)
        .with_model(model);

    let client = LlmClient::new(config)?;
    Ok(TranslateClient::Llm(client))
}

/// Decide which base fields need a provider call. The base text must be
/// non-blank, and the stored translation must be blank unless `overwrite`
/// asks for a full re-run.
fn collect_tasks(
    base: &DictionaryData,
    existing: &TranslationSet,
    overwrite: bool,
) -> Vec<FieldTask> {
    let mut tasks = Vec::new();

    let dictionary = existing.dictionary.as_ref();
    if needs_translation(&base.title, dictionary.and_then(|d| d.title.as_ref()), overwrite) {
        tasks.push(FieldTask {
            slot: Slot::DictionaryTitle,
            label: "dictionary title".to_string(),
            text: base.title.clone(),
            context: Some("the title of a personal dictionary".to_string()),
        });
    }
    if needs_translation(
        &base.description,
        dictionary.and_then(|d| d.description.as_ref()),
        overwrite,
    ) {
        tasks.push(FieldTask {
            slot: Slot::DictionaryDescription,
            label: "dictionary description".to_string(),
            text: base.description.clone(),
            context: Some("the description of a personal dictionary".to_string()),
        });
    }

    for entry in &base.entries {
        let stored = existing.entries.get(&entry.id);
        if needs_translation(&entry.origin, stored.and_then(|r| r.origin.as_ref()), overwrite) {
            tasks.push(FieldTask {
                slot: Slot::EntryOrigin(entry.id.clone()),
                label: format!("origin of \"{}\"", entry.word),
                text: entry.origin.clone(),
                context: Some(format!("etymology note for the word \"{}\"", entry.word)),
            });
        }

        for (i, definition) in entry.definitions.iter().enumerate() {
            let stored = existing.definitions.get(&definition.id);
            let position = i + 1;

            if needs_translation(
                &definition.grammatical_class,
                stored.and_then(|r| r.grammatical_class.as_ref()),
                overwrite,
            ) {
                tasks.push(FieldTask {
                    slot: Slot::DefinitionClass(definition.id.clone()),
                    label: format!("class of \"{}\" definition {}", entry.word, position),
                    text: definition.grammatical_class.clone(),
                    context: Some("a part-of-speech label such as noun or verb".to_string()),
                });
            }
            if needs_translation(
                &definition.meaning,
                stored.and_then(|r| r.meaning.as_ref()),
                overwrite,
            ) {
                tasks.push(FieldTask {
                    slot: Slot::DefinitionMeaning(definition.id.clone()),
                    label: format!("meaning of \"{}\" definition {}", entry.word, position),
                    text: definition.meaning.clone(),
                    context: Some(format!("dictionary definition of \"{}\"", entry.word)),
                });
            }
            let example = definition.example.as_deref().unwrap_or("");
            if needs_translation(example, stored.and_then(|r| r.example.as_ref()), overwrite) {
                tasks.push(FieldTask {
                    slot: Slot::DefinitionExample(definition.id.clone()),
                    label: format!("example of \"{}\" definition {}", entry.word, position),
                    text: example.to_string(),
                    context: Some(format!("example sentence for the word \"{}\"", entry.word)),
                });
            }
        }
    }

    tasks
}

fn needs_translation(source: &str, stored: Option<&String>, overwrite: bool) -> bool {
    if source.trim().is_empty() {
        return false;
    }
    if overwrite {
        return true;
    }
    stored.is_none_or(|s| s.trim().is_empty())
}

#[derive(Default)]
struct StagedRows {
    dictionary: Option<DictionaryTranslationRow>,
    entries: Vec<EntryTranslationRow>,
    definitions: Vec<DefinitionTranslationRow>,
    written: usize,
    failed: usize,
}

/// Fold provider results into translation rows, merging with the stored row
/// for each owner so untouched fields survive. Failed or blank results leave
/// their field as it was.
fn stage_results<F>(
    tasks: &[FieldTask],
    results: Vec<Result<String>>,
    existing: &TranslationSet,
    dictionary_id: &str,
    language: Language,
    on_error: F,
) -> StagedRows
where
    F: Fn(&str, &anyhow::Error),
{
    let code = language.code();
    let mut staged = StagedRows::default();
    let mut dictionary: Option<DictionaryTranslationRow> = None;
    let mut entries: BTreeMap<String, EntryTranslationRow> = BTreeMap::new();
    let mut definitions: BTreeMap<String, DefinitionTranslationRow> = BTreeMap::new();

    for (task, result) in tasks.iter().zip(results.into_iter()) {
        let translated = match result {
            Ok(t) => t,
            Err(e) => {
                staged.failed += 1;
                on_error(&task.label, &e);
                continue;
            }
        };
        let value = translated.trim().to_string();
        if value.is_empty() {
            continue;
        }

        match &task.slot {
            Slot::DictionaryTitle => {
                dictionary_slot(&mut dictionary, existing, dictionary_id, code).title = Some(value);
            }
            Slot::DictionaryDescription => {
                dictionary_slot(&mut dictionary, existing, dictionary_id, code).description =
                    Some(value);
            }
            Slot::EntryOrigin(id) => {
                entry_slot(&mut entries, existing, id, code).origin = Some(value);
            }
            Slot::DefinitionClass(id) => {
                definition_slot(&mut definitions, existing, id, code).grammatical_class =
                    Some(value);
            }
            Slot::DefinitionMeaning(id) => {
                definition_slot(&mut definitions, existing, id, code).meaning = Some(value);
            }
            Slot::DefinitionExample(id) => {
                definition_slot(&mut definitions, existing, id, code).example = Some(value);
            }
        }
        staged.written += 1;
    }

    staged.dictionary = dictionary.filter(|r| r.has_content());
    staged.entries = entries.into_values().filter(|r| r.has_content()).collect();
    staged.definitions = definitions
        .into_values()
        .filter(|r| r.has_content())
        .collect();
    staged
}

fn dictionary_slot<'a>(
    row: &'a mut Option<DictionaryTranslationRow>,
    existing: &TranslationSet,
    dictionary_id: &str,
    code: &str,
) -> &'a mut DictionaryTranslationRow {
    row.get_or_insert_with(|| {
        existing
            .dictionary
            .clone()
            .unwrap_or(DictionaryTranslationRow {
                dictionary_id: dictionary_id.to_string(),
                language: code.to_string(),
                title: None,
                description: None,
            })
    })
}

fn entry_slot<'a>(
    rows: &'a mut BTreeMap<String, EntryTranslationRow>,
    existing: &TranslationSet,
    id: &str,
    code: &str,
) -> &'a mut EntryTranslationRow {
    rows.entry(id.to_string()).or_insert_with(|| {
        existing
            .entries
            .get(id)
            .cloned()
            .unwrap_or(EntryTranslationRow {
                entry_id: id.to_string(),
                language: code.to_string(),
                origin: None,
            })
    })
}

fn definition_slot<'a>(
    rows: &'a mut BTreeMap<String, DefinitionTranslationRow>,
    existing: &TranslationSet,
    id: &str,
    code: &str,
) -> &'a mut DefinitionTranslationRow {
    rows.entry(id.to_string()).or_insert_with(|| {
        existing
            .definitions
            .get(id)
            .cloned()
            .unwrap_or(DefinitionTranslationRow {
                definition_id: id.to_string(),
                language: code.to_string(),
                grammatical_class: None,
                meaning: None,
                example: None,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Definition, DictionaryEntry};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn base_tree() -> DictionaryData {
        DictionaryData {
            title: "My Words".to_string(),
            description: String::new(),
            entries: vec![DictionaryEntry {
                id: "e1".to_string(),
                word: "apple".to_string(),
                origin: "Old English".to_string(),
                definitions: vec![
                    Definition {
                        id: "f1".to_string(),
                        grammatical_class: "noun".to_string(),
                        meaning: "a fruit".to_string(),
                        example: Some("An apple a day.".to_string()),
                    },
                    Definition {
                        id: "f2".to_string(),
                        grammatical_class: String::new(),
                        meaning: "a tree".to_string(),
                        example: None,
                    },
                ],
                ..Default::default()
            }],
        }
    }

    fn existing_with_f1_meaning() -> TranslationSet {
        let mut definitions = HashMap::new();
        definitions.insert(
            "f1".to_string(),
            DefinitionTranslationRow {
                definition_id: "f1".to_string(),
                language: "de".to_string(),
                grammatical_class: None,
                meaning: Some("eine Frucht".to_string()),
                example: None,
            },
        );
        TranslationSet {
            dictionary: None,
            entries: HashMap::new(),
            definitions,
        }
    }

    #[test]
    fn test_collect_skips_blank_sources_and_filled_translations() {
        let tasks = collect_tasks(&base_tree(), &existing_with_f1_meaning(), false);

        let slots: Vec<&Slot> = tasks.iter().map(|t| &t.slot).collect();
        assert_eq!(
            slots,
            vec![
                &Slot::DictionaryTitle,
                &Slot::EntryOrigin("e1".to_string()),
                &Slot::DefinitionClass("f1".to_string()),
                &Slot::DefinitionExample("f1".to_string()),
                &Slot::DefinitionMeaning("f2".to_string()),
            ]
        );
    }

    #[test]
    fn test_overwrite_requeues_filled_fields_but_not_blank_sources() {
        let tasks = collect_tasks(&base_tree(), &existing_with_f1_meaning(), true);

        assert!(
            tasks
                .iter()
                .any(|t| t.slot == Slot::DefinitionMeaning("f1".to_string()))
        );
        // Blank description and f2's empty class still produce no work.
        assert!(!tasks.iter().any(|t| t.slot == Slot::DictionaryDescription));
        assert!(
            !tasks
                .iter()
                .any(|t| t.slot == Slot::DefinitionClass("f2".to_string()))
        );
    }

    #[test]
    fn test_stage_merges_stored_row_and_counts_failures() {
        let existing = TranslationSet {
            dictionary: Some(DictionaryTranslationRow {
                dictionary_id: "d1".to_string(),
                language: "de".to_string(),
                title: None,
                description: Some("Gesammelt".to_string()),
            }),
            entries: HashMap::new(),
            definitions: HashMap::new(),
        };
        let tasks = vec![
            FieldTask {
                slot: Slot::DictionaryTitle,
                label: "dictionary title".to_string(),
                text: "My Words".to_string(),
                context: None,
            },
            FieldTask {
                slot: Slot::EntryOrigin("e1".to_string()),
                label: "origin of \"apple\"".to_string(),
                text: "Old English".to_string(),
                context: None,
            },
        ];
        let results = vec![
            Ok("Meine Wörter".to_string()),
            Err(anyhow::anyhow!("timed out")),
        ];

        let errors: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let staged = stage_results(&tasks, results, &existing, "d1", Language::De, |label, _| {
            errors.borrow_mut().push(label.to_string());
        });

        assert_eq!(staged.written, 1);
        assert_eq!(staged.failed, 1);
        assert_eq!(errors.into_inner(), vec!["origin of \"apple\""]);

        let dictionary = staged.dictionary.unwrap();
        assert_eq!(dictionary.title.as_deref(), Some("Meine Wörter"));
        assert_eq!(dictionary.description.as_deref(), Some("Gesammelt"));
        assert!(staged.entries.is_empty());
    }

    #[test]
    fn test_stage_drops_blank_provider_output() {
        let tasks = vec![FieldTask {
            slot: Slot::EntryOrigin("e1".to_string()),
            label: "origin of \"apple\"".to_string(),
            text: "Old English".to_string(),
            context: None,
        }];
        let results = vec![Ok("   ".to_string())];

        let staged = stage_results(
            &tasks,
            results,
            &TranslationSet::default(),
            "d1",
            Language::De,
            |_, _| {},
        );

        assert_eq!(staged.written, 0);
        assert_eq!(staged.failed, 0);
        assert!(staged.entries.is_empty());
    }
}
