//! Line-oriented translation template codec
//!
//! Renders a dictionary into `KEY: value` lines a translator can fill in
//! offline, and parses the filled file back into a sparse patch. Source
//! lines carry the base text used for matching on import; `_TRANSLATION`
//! lines carry the values to persist.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;

use crate::cli::TemplateArgs;
use crate::config::Config;
use crate::model::{DICTIONARY_ID, DictionaryData};
use crate::store;
use crate::store::rows::{Catalog, TranslationSet};
use crate::utils::parse_target_language;

pub const PLACEHOLDER: &str = "[ADD YOUR TRANSLATION HERE]";

const SEPARATOR: &str = "--- ENTRIES ---";

pub fn run(args: TemplateArgs) -> Result<()> {
    let config = Config::load()?;
    let code = args
        .lang
        .unwrap_or_else(|| config.translation.default_language.clone());
    let language = parse_target_language(&code)?;

    let store = store::open_from(args.store.as_deref(), &config)?;
    let catalog = Catalog::new(store.as_ref(), DICTIONARY_ID);
    let data = catalog.load()?;

    let entry_ids: Vec<String> = data.entries.iter().map(|e| e.id.clone()).collect();
    let definition_ids: Vec<String> = data
        .entries
        .iter()
        .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
        .collect();
    let translations = catalog.translations_for(language, &entry_ids, &definition_ids)?;

    let path = match args.output {
        Some(p) => p,
        None => PathBuf::from(format!("translation_template_{}.txt", language.code())),
    };
    fs::write(&path, render(&data, &translations))
        .with_context(|| format!("Failed to write template file: {}", path.display()))?;

    println!(
        "{}",
        format!(
            "[OK] Template for {} written to {}",
            language.display_name(),
            path.display()
        )
        .green()
    );
    Ok(())
}

fn slot(stored: Option<&str>) -> &str {
    match stored {
        Some(s) if !s.trim().is_empty() => s,
        _ => PLACEHOLDER,
    }
}

/// Render the template for one target language. Translation slots are
/// pre-filled from already-stored rows so a re-export can be revised instead
/// of retyped; everything else gets the placeholder.
pub fn render(data: &DictionaryData, translations: &TranslationSet) -> String {
    let mut out = String::new();
    let dict_tr = translations.dictionary.as_ref();

    out.push_str(&format!("DICTIONARY_TITLE: {}\n", data.title));
    out.push_str(&format!(
        "DICTIONARY_TITLE_TRANSLATION: {}\n",
        slot(dict_tr.and_then(|t| t.title.as_deref()))
    ));
    out.push_str(&format!("DICTIONARY_DESCRIPTION: {}\n", data.description));
    out.push_str(&format!(
        "DICTIONARY_DESCRIPTION_TRANSLATION: {}\n",
        slot(dict_tr.and_then(|t| t.description.as_deref()))
    ));
    out.push_str(SEPARATOR);
    out.push('\n');

    for (i, entry) in data.entries.iter().enumerate() {
        let n = i + 1;
        let entry_tr = translations.entries.get(&entry.id);

        out.push_str(&format!("ENTRY_{}_WORD: {}\n", n, entry.word));
        out.push_str(&format!("ENTRY_{}_ORIGIN: {}\n", n, entry.origin));
        out.push_str(&format!(
            "ENTRY_{}_ORIGIN_TRANSLATION: {}\n",
            n,
            slot(entry_tr.and_then(|t| t.origin.as_deref()))
        ));

        for (j, definition) in entry.definitions.iter().enumerate() {
            let m = j + 1;
            let def_tr = translations.definitions.get(&definition.id);

            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_CLASS: {}\n",
                n, m, definition.grammatical_class
            ));
            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_CLASS_TRANSLATION: {}\n",
                n,
                m,
                slot(def_tr.and_then(|t| t.grammatical_class.as_deref()))
            ));
            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_MEANING: {}\n",
                n, m, definition.meaning
            ));
            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_MEANING_TRANSLATION: {}\n",
                n,
                m,
                slot(def_tr.and_then(|t| t.meaning.as_deref()))
            ));
            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_EXAMPLE: {}\n",
                n,
                m,
                definition.example.as_deref().unwrap_or("")
            ));
            out.push_str(&format!(
                "ENTRY_{}_DEF_{}_EXAMPLE_TRANSLATION: {}\n",
                n,
                m,
                slot(def_tr.and_then(|t| t.example.as_deref()))
            ));
        }
    }

    out
}

/// A `_TRANSLATION` value from a filled template. Empty or still the
/// placeholder means the translator left it alone.
pub fn translation_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == PLACEHOLDER {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DefinitionPatch {
    pub grammatical_class: String,
    pub meaning: String,
    pub class_translation: Option<String>,
    pub meaning_translation: Option<String>,
    pub example_translation: Option<String>,
}

impl DefinitionPatch {
    pub fn is_empty(&self) -> bool {
        self.class_translation.is_none()
            && self.meaning_translation.is_none()
            && self.example_translation.is_none()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntryPatch {
    pub word: String,
    pub origin_translation: Option<String>,
    pub definitions: BTreeMap<usize, DefinitionPatch>,
}

/// Sparse set of translations recovered from a filled template, keyed by the
/// template's own 1-based indices. Source texts ride along for matching.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub entries: BTreeMap<usize, EntryPatch>,
    pub warnings: Vec<String>,
}

pub struct TemplateParser {
    def_re: Regex,
    entry_re: Regex,
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateParser {
    pub fn new() -> Self {
        Self {
            def_re: Regex::new(r"^ENTRY_(\d+)_DEF_(\d+)_(CLASS|MEANING|EXAMPLE)(_TRANSLATION)?$")
                .unwrap(),
            entry_re: Regex::new(r"^ENTRY_(\d+)_(WORD|ORIGIN)(_TRANSLATION)?$").unwrap(),
        }
    }

    /// Parse a filled template. Never fails: malformed lines and unknown
    /// keys become warnings and the rest of the file is still used.
    pub fn parse(&self, content: &str) -> TemplatePatch {
        let mut patch = TemplatePatch::default();

        for (number, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line == SEPARATOR {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                patch
                    .warnings
                    .push(format!("Line {}: not a KEY: value line", number + 1));
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "DICTIONARY_TITLE" | "DICTIONARY_DESCRIPTION" => continue,
                "DICTIONARY_TITLE_TRANSLATION" => {
                    patch.title = translation_value(value);
                    continue;
                }
                "DICTIONARY_DESCRIPTION_TRANSLATION" => {
                    patch.description = translation_value(value);
                    continue;
                }
                _ => {}
            }

            if let Some(caps) = self.def_re.captures(key) {
                let (Ok(n), Ok(m)) = (caps[1].parse::<usize>(), caps[2].parse::<usize>()) else {
                    patch
                        .warnings
                        .push(format!("Line {}: index out of range", number + 1));
                    continue;
                };
                let definition = patch
                    .entries
                    .entry(n)
                    .or_default()
                    .definitions
                    .entry(m)
                    .or_default();
                let translated = caps.get(4).is_some();
                match (&caps[3], translated) {
                    ("CLASS", false) => definition.grammatical_class = value.to_string(),
                    ("MEANING", false) => definition.meaning = value.to_string(),
                    ("EXAMPLE", false) => {}
                    ("CLASS", true) => definition.class_translation = translation_value(value),
                    ("MEANING", true) => definition.meaning_translation = translation_value(value),
                    ("EXAMPLE", true) => definition.example_translation = translation_value(value),
                    _ => unreachable!(),
                }
                continue;
            }

            if let Some(caps) = self.entry_re.captures(key) {
                let Ok(n) = caps[1].parse::<usize>() else {
                    patch
                        .warnings
                        .push(format!("Line {}: index out of range", number + 1));
                    continue;
                };
                let translated = caps.get(3).is_some();
                match (&caps[2], translated) {
                    ("WORD", false) => {
                        patch.entries.entry(n).or_default().word = value.to_string();
                    }
                    ("ORIGIN", false) => {}
                    ("ORIGIN", true) => {
                        patch.entries.entry(n).or_default().origin_translation =
                            translation_value(value);
                    }
                    _ => {
                        patch
                            .warnings
                            .push(format!("Line {}: unknown key {}", number + 1, key));
                    }
                }
                continue;
            }

            patch
                .warnings
                .push(format!("Line {}: unknown key {}", number + 1, key));
        }

        patch
    }
}
