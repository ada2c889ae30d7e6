//! Common utility functions

use anyhow::{Result, bail};

use crate::model::Language;

/// Parse a translation target language code. The base language is not a
/// valid target: it has no translation rows to read or write.
pub fn parse_target_language(code: &str) -> Result<Language> {
    let Some(language) = Language::from_code(code) else {
        bail!("Unsupported language: {} (expected de or pt)", code);
    };
    if language.is_base() {
        bail!(
            "'{}' is the base language; pick a translation target (de or pt)",
            code
        );
    }
    Ok(language)
}

pub fn truncate_display(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Lowercased, alphanumeric-only form used for fuzzy word matching
/// during template import ("Nana-Nana" and "nana nana" both become
/// "nananana").
pub fn normalize_lookup(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// File-name-safe stem: every non-alphanumeric character becomes an
/// underscore, case is kept.
pub fn sanitize_file_stem(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
