//! Typed rows and the catalog that maps them onto the domain tree

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Filter, Order, Row, RowStore, StoreError, Table};
use crate::model::{Definition, DictionaryData, DictionaryEntry, Language};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryRow {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRow {
    pub id: String,
    pub dictionary_id: String,
    pub word: String,
    #[serde(default)]
    pub ipa: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub color_combo: i64,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRow {
    pub id: String,
    pub entry_id: String,
    #[serde(default)]
    pub grammatical_class: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryTranslationRow {
    pub dictionary_id: String,
    pub language: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryTranslationRow {
    pub entry_id: String,
    pub language: String,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionTranslationRow {
    pub definition_id: String,
    pub language: String,
    #[serde(default)]
    pub grammatical_class: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl DictionaryTranslationRow {
    /// A translation row is only worth persisting when at least one field
    /// carries actual text.
    pub fn has_content(&self) -> bool {
        filled(&self.title) || filled(&self.description)
    }
}

impl EntryTranslationRow {
    pub fn has_content(&self) -> bool {
        filled(&self.origin)
    }
}

impl DefinitionTranslationRow {
    pub fn has_content(&self) -> bool {
        filled(&self.grammatical_class) || filled(&self.meaning) || filled(&self.example)
    }
}

impl DefinitionRow {
    pub fn into_definition(self) -> Definition {
        Definition {
            id: self.id,
            grammatical_class: self.grammatical_class,
            meaning: self.meaning,
            example: self.example,
        }
    }
}

impl EntryRow {
    pub fn into_entry(self, definitions: Vec<Definition>) -> DictionaryEntry {
        DictionaryEntry {
            id: self.id,
            word: self.word,
            ipa: self.ipa,
            definitions,
            origin: self.origin,
            audio_url: self.audio_url,
            color_combo: u8::try_from(self.color_combo).unwrap_or(1),
            slug: self.slug,
        }
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::BadValue("row".to_string())),
    }
}

/// All stored translation rows for one language, indexed by owner id.
#[derive(Debug, Default)]
pub struct TranslationSet {
    pub dictionary: Option<DictionaryTranslationRow>,
    pub entries: HashMap<String, EntryTranslationRow>,
    pub definitions: HashMap<String, DefinitionTranslationRow>,
}

/// Read/write access to one dictionary's rows, whatever the backend.
pub struct Catalog<'a> {
    store: &'a dyn RowStore,
    dictionary_id: &'a str,
}

impl<'a> Catalog<'a> {
    pub fn new(store: &'a dyn RowStore, dictionary_id: &'a str) -> Self {
        Self {
            store,
            dictionary_id,
        }
    }

    pub fn dictionary_id(&self) -> &str {
        self.dictionary_id
    }

    pub fn dictionary(&self) -> Result<DictionaryRow, StoreError> {
        let rows = self.store.select(
            Table::Dictionaries,
            &Filter::eq("id", self.dictionary_id),
            None,
        )?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::MissingDictionary(self.dictionary_id.to_string()))?;
        from_row(row)
    }

    pub fn entries(&self) -> Result<Vec<EntryRow>, StoreError> {
        let rows = self.store.select(
            Table::Entries,
            &Filter::eq("dictionary_id", self.dictionary_id),
            Some(Order::asc("position")),
        )?;
        rows.into_iter().map(from_row).collect()
    }

    pub fn definitions_for(&self, entry_ids: &[String]) -> Result<Vec<DefinitionRow>, StoreError> {
        let rows = self.store.select(
            Table::Definitions,
            &Filter::id_set("entry_id", entry_ids),
            Some(Order::asc("position")),
        )?;
        rows.into_iter().map(from_row).collect()
    }

    /// Assemble the full base-language tree from persisted rows.
    pub fn load(&self) -> Result<DictionaryData, StoreError> {
        let dictionary = self.dictionary()?;
        let entry_rows = self.entries()?;
        let entry_ids: Vec<String> = entry_rows.iter().map(|e| e.id.clone()).collect();

        let mut defs_by_entry: HashMap<String, Vec<Definition>> = HashMap::new();
        for def in self.definitions_for(&entry_ids)? {
            defs_by_entry
                .entry(def.entry_id.clone())
                .or_default()
                .push(def.into_definition());
        }

        let entries = entry_rows
            .into_iter()
            .map(|row| {
                let defs = defs_by_entry.remove(&row.id).unwrap_or_default();
                row.into_entry(defs)
            })
            .collect();

        Ok(DictionaryData {
            title: dictionary.title,
            description: dictionary.description,
            entries,
        })
    }

    /// Fetch every stored translation row for `language` owned by the given
    /// entries and definitions.
    pub fn translations_for(
        &self,
        language: Language,
        entry_ids: &[String],
        definition_ids: &[String],
    ) -> Result<TranslationSet, StoreError> {
        let code = language.code();

        let rows = self.store.select(
            Table::DictionaryTranslations,
            &Filter::And(vec![
                Filter::eq("dictionary_id", self.dictionary_id),
                Filter::eq("language", code),
            ]),
            None,
        )?;
        let dictionary = match rows.into_iter().next() {
            Some(row) => Some(from_row(row)?),
            None => None,
        };

        let rows = self.store.select(
            Table::EntryTranslations,
            &Filter::And(vec![
                Filter::id_set("entry_id", entry_ids),
                Filter::eq("language", code),
            ]),
            None,
        )?;
        let mut entries = HashMap::new();
        for row in rows {
            let tr: EntryTranslationRow = from_row(row)?;
            entries.insert(tr.entry_id.clone(), tr);
        }

        let rows = self.store.select(
            Table::DefinitionTranslations,
            &Filter::And(vec![
                Filter::id_set("definition_id", definition_ids),
                Filter::eq("language", code),
            ]),
            None,
        )?;
        let mut definitions = HashMap::new();
        for row in rows {
            let tr: DefinitionTranslationRow = from_row(row)?;
            definitions.insert(tr.definition_id.clone(), tr);
        }

        Ok(TranslationSet {
            dictionary,
            entries,
            definitions,
        })
    }

    pub fn upsert_dictionary_translation(
        &self,
        row: &DictionaryTranslationRow,
    ) -> Result<(), StoreError> {
        self.store.upsert(
            Table::DictionaryTranslations,
            &[to_row(row)?],
            &["dictionary_id", "language"],
        )
    }

    pub fn upsert_entry_translations(
        &self,
        rows: &[EntryTranslationRow],
    ) -> Result<(), StoreError> {
        let rows: Vec<Row> = rows.iter().map(to_row).collect::<Result<_, _>>()?;
        self.store
            .upsert(Table::EntryTranslations, &rows, &["entry_id", "language"])
    }

    pub fn upsert_definition_translations(
        &self,
        rows: &[DefinitionTranslationRow],
    ) -> Result<(), StoreError> {
        let rows: Vec<Row> = rows.iter().map(to_row).collect::<Result<_, _>>()?;
        self.store.upsert(
            Table::DefinitionTranslations,
            &rows,
            &["definition_id", "language"],
        )
    }
}
