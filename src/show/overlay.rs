//! Read-side composition of base data with stored translations
//!
//! Produces the tree a reader in some language should see. The base tree is
//! never mutated; callers keep it as the source of truth for saves and
//! re-translation.

use crate::model::{DictionaryData, Language};
use crate::store::StoreError;
use crate::store::rows::Catalog;

/// Compose `base` with the stored translation rows for `language`.
///
/// The base language short-circuits to a plain copy without touching the
/// store. Every translated field falls back to its base value independently;
/// a blank translation means "not translated yet", never "translated to
/// nothing".
pub fn overlay(
    catalog: &Catalog,
    base: &DictionaryData,
    language: Language,
) -> Result<DictionaryData, StoreError> {
    if language.is_base() {
        return Ok(base.clone());
    }

    let entry_ids: Vec<String> = base.entries.iter().map(|e| e.id.clone()).collect();
    let definition_ids: Vec<String> = base
        .entries
        .iter()
        .flat_map(|e| e.definitions.iter().map(|d| d.id.clone()))
        .collect();
    let translations = catalog.translations_for(language, &entry_ids, &definition_ids)?;

    let mut view = base.clone();
    if let Some(ref tr) = translations.dictionary {
        apply(&mut view.title, &tr.title);
        apply(&mut view.description, &tr.description);
    }

    for entry in &mut view.entries {
        if let Some(tr) = translations.entries.get(&entry.id) {
            apply(&mut entry.origin, &tr.origin);
        }
        for definition in &mut entry.definitions {
            if let Some(tr) = translations.definitions.get(&definition.id) {
                apply(&mut definition.grammatical_class, &tr.grammatical_class);
                apply(&mut definition.meaning, &tr.meaning);
                apply_opt(&mut definition.example, &tr.example);
            }
        }
    }

    Ok(view)
}

fn apply(base: &mut String, translated: &Option<String>) {
    if let Some(t) = translated
        && !t.trim().is_empty()
    {
        *base = t.clone();
    }
}

fn apply_opt(base: &mut Option<String>, translated: &Option<String>) {
    if let Some(t) = translated
        && !t.trim().is_empty()
    {
        *base = Some(t.clone());
    }
}
