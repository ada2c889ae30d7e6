//! Store initialization and seeding tests

use std::process::Command;

use tempfile::TempDir;

fn lexikeep() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lexikeep"))
}

#[test]
fn test_init_creates_an_empty_dictionary() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = lexikeep()
        .args(["init", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run init");
    assert!(
        output.status.success(),
        "Init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Created empty dictionary \"My Dictionary\""),
        "Should create the dictionary row: {}",
        stdout
    );
    assert!(stdout.contains("[OK] Store ready"), "Should confirm: {}", stdout);

    let output = lexikeep()
        .args(["show", "--json", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run show");
    assert!(output.status.success());
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["title"], "My Dictionary");
    assert_eq!(tree["entries"].as_array().unwrap().len(), 0);
}

#[test]
fn test_init_twice_reports_existing_dictionary() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    assert!(
        lexikeep()
            .args(["init", "--store", db.to_str().unwrap()])
            .output()
            .expect("Failed to run init")
            .status
            .success()
    );

    let output = lexikeep()
        .args(["init", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run init again");
    assert!(output.status.success(), "Second init should be a no-op");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Dictionary already present: \"My Dictionary\""),
        "Should report the existing row: {}",
        stdout
    );
}

#[test]
fn test_seed_loads_sample_entries() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = lexikeep()
        .args(["init", "--seed", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run init --seed");
    assert!(
        output.status.success(),
        "Seed failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Seeded \"Luca's Dictionary\" with 5 entries"),
        "Should report the seed: {}",
        stdout
    );

    let output = lexikeep()
        .args(["show", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run show");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[Dictionary] Luca's Dictionary (English)"),
        "Listing should carry the title: {}",
        stdout
    );
    assert!(stdout.contains("1. baba"), "Entries should be sorted: {}", stdout);
    assert!(stdout.contains("3. nana-nana"), "Listing: {}", stdout);
    assert!(stdout.contains("5. wawa"), "Listing: {}", stdout);
}

#[test]
fn test_seed_refuses_a_populated_store() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    assert!(
        lexikeep()
            .args(["init", "--seed", "--store", db.to_str().unwrap()])
            .output()
            .expect("Failed to run init --seed")
            .status
            .success()
    );

    let output = lexikeep()
        .args(["init", "--seed", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run init --seed again");
    assert!(!output.status.success(), "Reseeding must be refused");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Refusing to seed"),
        "Should explain the refusal: {}",
        stderr
    );
}

#[test]
fn test_show_before_init_names_the_missing_dictionary() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = lexikeep()
        .args(["show", "--store", db.to_str().unwrap()])
        .output()
        .expect("Failed to run show");
    assert!(!output.status.success(), "Show needs an initialized store");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not found in the store"),
        "Should point at the missing dictionary: {}",
        stderr
    );
}
