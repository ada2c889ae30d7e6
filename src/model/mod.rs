//! Dictionary data model shared by every command

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known identifier of the singleton dictionary row.
pub const DICTIONARY_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Number of rotating color combinations assigned to entries.
pub const COLOR_COMBOS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    De,
    Pt,
}

impl Language {
    /// Target languages that carry translation rows. `en` is the base
    /// language and is never translated.
    pub const TARGETS: [Language; 2] = [Language::De, Language::Pt];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "de" => Some(Self::De),
            "pt" => Some(Self::Pt),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Pt => "pt",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "German",
            Self::Pt => "Portuguese",
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Self::En)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub grammatical_class: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    #[serde(default)]
    pub id: String,
    pub word: String,
    #[serde(default)]
    pub ipa: String,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default = "default_color_combo")]
    pub color_combo: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entries: Vec<DictionaryEntry>,
}

fn default_color_combo() -> u8 {
    1
}

impl Default for DictionaryEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            word: String::new(),
            ipa: String::new(),
            definitions: Vec::new(),
            origin: String::new(),
            audio_url: None,
            color_combo: default_color_combo(),
            slug: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("entry {position} has an empty word")]
    EmptyWord { position: usize },

    #[error("definition {position} of '{word}' has an empty meaning")]
    EmptyMeaning { word: String, position: usize },
}

/// Reject trees that must never reach the store.
pub fn validate(data: &DictionaryData) -> Result<(), ValidationError> {
    for (i, entry) in data.entries.iter().enumerate() {
        if entry.word.trim().is_empty() {
            return Err(ValidationError::EmptyWord { position: i + 1 });
        }
        for (j, def) in entry.definitions.iter().enumerate() {
            if def.meaning.trim().is_empty() {
                return Err(ValidationError::EmptyMeaning {
                    word: entry.word.clone(),
                    position: j + 1,
                });
            }
        }
    }
    Ok(())
}

pub fn color_combo_for(sorted_index: usize) -> u8 {
    (sorted_index % COLOR_COMBOS) as u8 + 1
}

/// Sort entries case-insensitively by word and re-derive each entry's
/// color combo from its post-sort index. Run on every save so that
/// inserting or removing a word shifts the rotation for everything after it.
pub fn normalize_entries(entries: &mut [DictionaryEntry]) {
    entries.sort_by(|a, b| a.word.to_lowercase().cmp(&b.word.to_lowercase()));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.color_combo = color_combo_for(i);
    }
}

/// Stable human-readable alias derived from the word at insert time:
/// lowercased alphanumeric runs joined by dashes.
pub fn slugify(word: &str) -> String {
    let mut slug = String::with_capacity(word.len());
    for c in word.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str) -> DictionaryEntry {
        DictionaryEntry {
            id: String::new(),
            word: word.to_string(),
            ipa: String::new(),
            definitions: vec![],
            origin: String::new(),
            audio_url: None,
            color_combo: 1,
            slug: None,
        }
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let mut entries = vec![entry("zebra"), entry("Apple"), entry("mango")];
        normalize_entries(&mut entries);

        let words: Vec<&str> = entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["Apple", "mango", "zebra"]);
    }

    #[test]
    fn test_color_combo_rotates() {
        let mut entries: Vec<DictionaryEntry> =
            ["a", "b", "c", "d", "e", "f"].iter().map(|w| entry(w)).collect();
        normalize_entries(&mut entries);

        let combos: Vec<u8> = entries.iter().map(|e| e.color_combo).collect();
        assert_eq!(combos, vec![1, 2, 3, 4, 1, 2]);
    }

    #[test]
    fn test_zebra_apple_scenario() {
        let mut entries = vec![entry("zebra"), entry("apple")];
        normalize_entries(&mut entries);

        assert_eq!(entries[0].word, "apple");
        assert_eq!(entries[0].color_combo, 1);
        assert_eq!(entries[1].word, "zebra");
        assert_eq!(entries[1].color_combo, 2);
    }

    #[test]
    fn test_validate_rejects_empty_word() {
        let data = DictionaryData {
            title: "t".to_string(),
            description: String::new(),
            entries: vec![entry("  ")],
        };
        assert_eq!(
            validate(&data),
            Err(ValidationError::EmptyWord { position: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_empty_meaning() {
        let mut e = entry("baba");
        e.definitions.push(Definition {
            id: String::new(),
            grammatical_class: "noun".to_string(),
            meaning: "".to_string(),
            example: None,
        });
        let data = DictionaryData {
            title: String::new(),
            description: String::new(),
            entries: vec![e],
        };
        assert_eq!(
            validate(&data),
            Err(ValidationError::EmptyMeaning {
                word: "baba".to_string(),
                position: 1,
            })
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Nana-Nana!"), "nana-nana");
        assert_eq!(slugify("  wawa  "), "wawa");
        assert_eq!(slugify("Água boa"), "água-boa");
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("DE"), Some(Language::De));
        assert_eq!(Language::from_code("fr"), None);
        assert!(Language::En.is_base());
        assert_eq!(Language::Pt.display_name(), "Portuguese");
    }

    #[test]
    fn test_entry_json_uses_camel_case() {
        let mut e = entry("baba");
        e.audio_url = Some("https://example.com/baba.mp3".to_string());
        e.color_combo = 3;

        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["colorCombo"], 3);
        assert_eq!(json["audioUrl"], "https://example.com/baba.mp3");
        assert!(json.get("audio_url").is_none());
    }
}
