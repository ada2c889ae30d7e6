//! Translation cache using SQLite

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};

/// Caches provider responses keyed by source text, target code and provider,
/// so re-running translate after adding one entry only pays for the new
/// fields.
pub struct TranslationCache {
    conn: Connection,
}

impl TranslationCache {
    pub fn open() -> Result<Self> {
        let path = Self::cache_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open translation cache")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY,
                source_text TEXT NOT NULL,
                target_lang TEXT NOT NULL,
                provider TEXT NOT NULL,
                translated_text TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                UNIQUE(source_text, target_lang, provider)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_lookup
             ON translations(source_text, target_lang, provider)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn get(&self, text: &str, lang: &str, provider: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT translated_text FROM translations
                 WHERE source_text = ?1 AND target_lang = ?2 AND provider = ?3",
                params![text, lang, provider],
                |row| row.get(0),
            )
            .ok()
    }

    pub fn set(&self, text: &str, lang: &str, provider: &str, translated: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO translations (source_text, target_lang, provider, translated_text)
             VALUES (?1, ?2, ?3, ?4)",
            params![text, lang, provider, translated],
        )?;
        Ok(())
    }

    fn cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .context("Failed to find cache directory")?
            .join("lexikeep");
        Ok(cache_dir.join("translations.db"))
    }
}
