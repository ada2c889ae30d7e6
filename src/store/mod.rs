//! Row-level persistence behind a backend-agnostic interface

pub mod rest;
pub mod rows;
pub mod sqlite;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;

/// One record as the store sees it: column name to JSON value.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Dictionaries,
    Entries,
    Definitions,
    DictionaryTranslations,
    EntryTranslations,
    DefinitionTranslations,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dictionaries => "dictionaries",
            Self::Entries => "dictionary_entries",
            Self::Definitions => "definitions",
            Self::DictionaryTranslations => "dictionary_translations",
            Self::EntryTranslations => "entry_translations",
            Self::DefinitionTranslations => "definition_translations",
        }
    }
}

/// Row selection predicate. `In` with an empty list matches nothing.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::Eq(column, value.into())
    }

    pub fn id_set(column: &'static str, ids: &[String]) -> Self {
        Self::In(column, ids.iter().map(|s| Value::from(s.as_str())).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store request failed ({status}): {body}")]
    Response { status: u16, body: String },

    #[error("row decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("column {0} holds a value the store cannot represent")]
    BadValue(String),

    #[error("dictionary {0} not found in the store")]
    MissingDictionary(String),

    #[error("could not prepare store location: {0}")]
    Location(String),
}

/// The five operations the dictionary core is allowed to issue.
///
/// Implementations execute each call to completion before returning;
/// callers sequence them and treat any error as fatal to the operation
/// in progress.
pub trait RowStore {
    fn select(&self, table: Table, filter: &Filter, order: Option<Order>)
    -> Result<Vec<Row>, StoreError>;

    fn insert(&self, table: Table, rows: &[Row]) -> Result<(), StoreError>;

    /// Returns the number of rows the patch was applied to.
    fn update(&self, table: Table, filter: &Filter, patch: &Row) -> Result<usize, StoreError>;

    fn upsert(&self, table: Table, rows: &[Row], conflict_columns: &[&str])
    -> Result<(), StoreError>;

    /// Returns the number of rows removed.
    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError>;
}

/// Resolve the store target from a CLI argument and the config file, then
/// open the matching backend. URLs select the REST backend; anything else
/// is treated as a SQLite path.
pub fn open_from(arg: Option<&str>, cfg: &Config) -> Result<Box<dyn RowStore>> {
    if let Some(target) = arg {
        return open_target(target, cfg);
    }
    if let Some(url) = cfg.store.url.as_deref() {
        return open_target(url, cfg);
    }
    if let Some(path) = cfg.store.path.as_deref() {
        return open_target(path, cfg);
    }

    let path = sqlite::default_path().context("Could not determine a default store location")?;
    let store = sqlite::SqliteStore::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "opened default sqlite store");
    Ok(Box::new(store))
}

fn open_target(target: &str, cfg: &Config) -> Result<Box<dyn RowStore>> {
    if target.starts_with("http://") || target.starts_with("https://") {
        let store = rest::RestStore::new(target, cfg.get_store_key())
            .with_context(|| format!("Failed to create REST store client for {}", target))?;
        Ok(Box::new(store))
    } else {
        let path = PathBuf::from(target);
        let store = sqlite::SqliteStore::open(&path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Ok(Box::new(store))
    }
}
