//! Identity resolution for edited entries and definitions
//!
//! Edited data arrives with whatever ids the editor happened to carry:
//! persisted uuids threaded through an edit, stale placeholder strings, or
//! nothing useful at all. The resolver decides which persisted row an edited
//! item logically IS, so saves update rows in place instead of churning ids
//! and severing the translation rows keyed by them.

use std::collections::HashSet;

use regex::Regex;
use uuid::Uuid;

use crate::model::{Definition, DictionaryEntry};
use crate::store::rows::{DefinitionRow, EntryRow};

pub struct Resolver {
    id_re: Regex,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            id_re: Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )
            .unwrap(),
        }
    }

    /// Whether `id` has the canonical hyphenated uuid shape. Anything else
    /// (editor placeholders, empty strings) never matches a persisted row.
    pub fn is_canonical_id(&self, id: &str) -> bool {
        self.id_re.is_match(id)
    }

    /// Match an edited entry against the persisted snapshot: by id first,
    /// then by slug (case-sensitive). The returned row's id is the entry's
    /// true identity, whatever the edited copy carried.
    pub fn resolve_entry<'a>(
        &self,
        entry: &DictionaryEntry,
        persisted: &'a [EntryRow],
    ) -> Option<&'a EntryRow> {
        if self.is_canonical_id(&entry.id)
            && let Some(row) = persisted.iter().find(|r| r.id == entry.id)
        {
            return Some(row);
        }
        if let Some(slug) = entry.slug.as_deref()
            && !slug.is_empty()
            && let Some(row) = persisted.iter().find(|r| r.slug.as_deref() == Some(slug))
        {
            return Some(row);
        }
        None
    }

    /// Match an edited definition against one entry's persisted definitions:
    /// by id, then by case-insensitive (class, meaning) content, then by
    /// position. Content matching alone is fragile under meaning edits, so
    /// the positional tier catches in-place text changes.
    pub fn resolve_definition<'a>(
        &self,
        definition: &Definition,
        index: usize,
        persisted: &'a [DefinitionRow],
    ) -> Option<&'a DefinitionRow> {
        if self.is_canonical_id(&definition.id)
            && let Some(row) = persisted.iter().find(|r| r.id == definition.id)
        {
            return Some(row);
        }

        let class = definition.grammatical_class.to_lowercase();
        let meaning = definition.meaning.to_lowercase();
        if let Some(row) = persisted.iter().find(|r| {
            r.grammatical_class.to_lowercase() == class && r.meaning.to_lowercase() == meaning
        }) {
            return Some(row);
        }

        persisted.iter().find(|r| r.position == index as i64)
    }

    /// Pick the id for a row about to be inserted: keep the edited id when it
    /// is well formed and not already taken, otherwise mint a fresh one.
    pub fn insertion_id(&self, id: &str, used: &HashSet<String>) -> String {
        if self.is_canonical_id(id) && !used.contains(id) {
            id.to_string()
        } else {
            Uuid::new_v4().to_string()
        }
    }
}
