//! Translation template and import workflow tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn lexikeep() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lexikeep"))
}

const TWO_WORDS: &str = r#"{
    "title": "My Words",
    "description": "Collected while reading",
    "entries": [
        {
            "word": "zebra",
            "definitions": [{ "grammaticalClass": "noun", "meaning": "a striped animal" }]
        },
        {
            "word": "apple",
            "origin": "Old English",
            "definitions": [
                { "grammaticalClass": "noun", "meaning": "a fruit", "example": "An apple a day." }
            ]
        }
    ]
}"#;

fn seeded_store(temp_dir: &TempDir) -> PathBuf {
    let db = temp_dir.path().join("dict.db");
    let file = temp_dir.path().join("dict.json");
    fs::write(&file, TWO_WORDS).unwrap();

    let output = lexikeep()
        .args([
            "save",
            file.to_str().unwrap(),
            "--store",
            db.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run save");
    assert!(
        output.status.success(),
        "Fixture save failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    db
}

fn import(db: &Path, file: &Path, lang: &str) -> std::process::Output {
    lexikeep()
        .args([
            "import",
            file.to_str().unwrap(),
            "-l",
            lang,
            "--store",
            db.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run import")
}

fn show(db: &Path, lang: &str) -> String {
    let output = lexikeep()
        .args(["show", "-l", lang, "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run show");
    assert!(
        output.status.success(),
        "Show failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_template_renders_every_field_slot() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);
    let template = temp_dir.path().join("template.txt");

    let output = lexikeep()
        .args([
            "template",
            "-l",
            "de",
            "-o",
            template.to_str().unwrap(),
            "--store",
            db.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run template");
    assert!(
        output.status.success(),
        "Template failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[OK] Template for German written to"),
        "Should report the file: {}",
        stdout
    );

    let content = fs::read_to_string(&template).unwrap();
    assert!(content.contains("DICTIONARY_TITLE: My Words"));
    assert!(content.contains("DICTIONARY_TITLE_TRANSLATION: [ADD YOUR TRANSLATION HERE]"));
    assert!(content.contains("--- ENTRIES ---"));
    assert!(content.contains("ENTRY_1_WORD: apple"), "Sorted first: {}", content);
    assert!(content.contains("ENTRY_1_ORIGIN: Old English"));
    assert!(content.contains("ENTRY_1_DEF_1_MEANING: a fruit"));
    assert!(content.contains("ENTRY_1_DEF_1_EXAMPLE: An apple a day."));
    assert!(content.contains("ENTRY_2_WORD: zebra"));
    assert!(content.contains("ENTRY_2_DEF_1_MEANING_TRANSLATION: [ADD YOUR TRANSLATION HERE]"));
}

#[test]
fn test_filled_template_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);
    let template = temp_dir.path().join("template.txt");

    let output = lexikeep()
        .args([
            "template",
            "-l",
            "de",
            "-o",
            template.to_str().unwrap(),
            "--store",
            db.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run template");
    assert!(output.status.success());

    // Fill three slots and rewrite the word in caps; matching is
    // case-insensitive so the entry must still be found.
    let content = fs::read_to_string(&template)
        .unwrap()
        .replace("ENTRY_1_WORD: apple", "ENTRY_1_WORD: APPLE")
        .replace(
            "DICTIONARY_TITLE_TRANSLATION: [ADD YOUR TRANSLATION HERE]",
            "DICTIONARY_TITLE_TRANSLATION: Meine Wörter",
        )
        .replace(
            "ENTRY_1_ORIGIN_TRANSLATION: [ADD YOUR TRANSLATION HERE]",
            "ENTRY_1_ORIGIN_TRANSLATION: Altenglisch",
        )
        .replace(
            "ENTRY_1_DEF_1_MEANING_TRANSLATION: [ADD YOUR TRANSLATION HERE]",
            "ENTRY_1_DEF_1_MEANING_TRANSLATION: eine Frucht",
        );
    let filled = temp_dir.path().join("filled.txt");
    fs::write(&filled, content).unwrap();

    let output = import(&db, &filled, "de");
    assert!(
        output.status.success(),
        "Import failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[Import] German translations from"),
        "Should name the language: {}",
        stdout
    );
    assert!(
        stdout.contains("Entries:     2/2 matched"),
        "Both entry blocks should match: {}",
        stdout
    );
    assert!(
        stdout.contains("Definitions: 2/2 matched"),
        "Both definition blocks should match: {}",
        stdout
    );
    assert!(
        stdout.contains("Fields written: 3"),
        "Only the filled slots count: {}",
        stdout
    );

    let german = show(&db, "de");
    assert!(
        german.contains("[Dictionary] Meine Wörter (German)"),
        "Title should be overlaid: {}",
        german
    );
    assert!(
        german.contains("Origin: Altenglisch"),
        "Origin should be overlaid: {}",
        german
    );
    assert!(
        german.contains("1. (noun) eine Frucht"),
        "Meaning should be overlaid: {}",
        german
    );
    assert!(
        german.contains("a striped animal"),
        "Untranslated fields keep the base text: {}",
        german
    );

    let english = show(&db, "en");
    assert!(
        english.contains("[Dictionary] My Words (English)"),
        "Base view must stay untranslated: {}",
        english
    );
    assert!(english.contains("1. (noun) a fruit"), "Base view: {}", english);
}

#[test]
fn test_template_prefills_stored_translations() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);

    let filled = temp_dir.path().join("filled.txt");
    fs::write(
        &filled,
        "ENTRY_1_WORD: apple\n\
         ENTRY_1_DEF_1_CLASS: noun\n\
         ENTRY_1_DEF_1_MEANING: a fruit\n\
         ENTRY_1_DEF_1_MEANING_TRANSLATION: eine Frucht\n",
    )
    .unwrap();
    assert!(import(&db, &filled, "de").status.success());

    let template = temp_dir.path().join("template.txt");
    let output = lexikeep()
        .args([
            "template",
            "-l",
            "de",
            "-o",
            template.to_str().unwrap(),
            "--store",
            db.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run template");
    assert!(output.status.success());

    let content = fs::read_to_string(&template).unwrap();
    assert!(
        content.contains("ENTRY_1_DEF_1_MEANING_TRANSLATION: eine Frucht"),
        "Stored translation should be pre-filled: {}",
        content
    );
    assert!(
        content.contains("ENTRY_1_DEF_1_CLASS_TRANSLATION: [ADD YOUR TRANSLATION HERE]"),
        "Untranslated slots keep the placeholder: {}",
        content
    );
}

#[test]
fn test_import_json_document_stays_per_language() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);

    let document = temp_dir.path().join("portuguese.json");
    fs::write(
        &document,
        r#"{
            "dictionary": { "title": "Minhas Palavras", "description": "" },
            "entries": [
                {
                    "word": "apple",
                    "definitions": [
                        {
                            "grammaticalClass": "noun",
                            "meaning": "a fruit",
                            "meaningTranslation": "uma fruta"
                        }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let output = import(&db, &document, "pt");
    assert!(
        output.status.success(),
        "Import failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[Import] Portuguese translations from"),
        "Should name the language: {}",
        stdout
    );
    assert!(stdout.contains("Fields written: 2"), "Title and meaning: {}", stdout);

    let portuguese = show(&db, "pt");
    assert!(
        portuguese.contains("[Dictionary] Minhas Palavras (Portuguese)"),
        "Portuguese view: {}",
        portuguese
    );
    assert!(portuguese.contains("uma fruta"), "Portuguese view: {}", portuguese);

    let german = show(&db, "de");
    assert!(
        german.contains("[Dictionary] My Words (German)"),
        "Other languages must be untouched: {}",
        german
    );
    assert!(german.contains("a fruit"), "Other languages: {}", german);
}

#[test]
fn test_import_warns_on_unmatched_entry() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);

    let filled = temp_dir.path().join("filled.txt");
    fs::write(
        &filled,
        "ENTRY_1_WORD: pear\nENTRY_1_ORIGIN_TRANSLATION: Birne\n",
    )
    .unwrap();

    let output = import(&db, &filled, "de");
    assert!(
        output.status.success(),
        "Unmatched entries are warnings, not errors: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Entries:     0/1 matched"),
        "Nothing should match: {}",
        stdout
    );
    assert!(
        stdout.contains("[WARN] Entry not found for word: pear"),
        "Should warn about the miss: {}",
        stdout
    );
    assert!(stdout.contains("Fields written: 0"), "No writes: {}", stdout);
}

#[test]
fn test_import_rejects_malformed_json() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);

    let document = temp_dir.path().join("broken.json");
    fs::write(&document, r#"{ "entries": [] }"#).unwrap();

    let output = import(&db, &document, "de");
    assert!(!output.status.success(), "Malformed document must fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid translation file format"),
        "Should explain the expected shape: {}",
        stderr
    );
}

#[test]
fn test_template_rejects_base_language() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded_store(&temp_dir);

    let output = lexikeep()
        .args(["template", "-l", "en", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run template");
    assert!(!output.status.success(), "en has no translation rows");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("base language"),
        "Should explain the target set: {}",
        stderr
    );
}
