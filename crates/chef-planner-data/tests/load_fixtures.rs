use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chef_planner_data::{
    DataError, DataSource, Dataset, CUSTOMERS_FILE, INGREDIENTS_FILE, MATCHES_FILE,
};

fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
        .join("sample")
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!(
        "chef-planner-{tag}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
    dir
}

fn write_files(dir: &PathBuf, customers: &str, ingredients: &str, matches: &str) {
    for (file, body) in [
        (CUSTOMERS_FILE, customers),
        (INGREDIENTS_FILE, ingredients),
        (MATCHES_FILE, matches),
    ] {
        fs::write(dir.join(file), body).unwrap_or_else(|e| panic!("write {file}: {e}"));
    }
}

#[test]
fn sample_directory_loads_with_expected_warnings() {
    let dir = sample_dir();
    let data = Dataset::load_dir(&dir).unwrap_or_else(|e| panic!("load {}: {e}", dir.display()));

    assert_eq!(data.source, DataSource::Directory(dir));
    assert_eq!(data.catalog.len(), 35);
    assert_eq!(
        data.segment_names(),
        vec!["Gourmet", "Families", "Students", "Healthy Eaters"]
    );

    // Out-of-range values are clamped, not dropped.
    assert_eq!(data.index.pair_value("Sugar", "Lemon"), 3);
    assert_eq!(data.index.pair_value("Salmon", "Capers"), 3);

    let students = data
        .segment("students")
        .unwrap_or_else(|| panic!("students segment missing"));
    assert!(students.favourite_tags.contains("Carbs"));
    assert!(students.favourite_tags.contains("Meat"));

    let healthy = data
        .segment("Healthy Eaters")
        .unwrap_or_else(|| panic!("healthy segment missing"));
    assert!((healthy.section("Soup").cost_expectation - 10.0).abs() < 1e-9);

    assert_eq!(
        data.warnings,
        vec![
            "Customers: Customer 'Healthy Eaters': section 'Soup' missing cost_expectation"
                .to_string(),
            "Matches: Match 69: MatchValue should be 1, 2, or 3 (found 5)".to_string(),
        ]
    );
}

#[test]
fn warnings_are_prefixed_by_file() {
    let dir = scratch_dir("prefixed");
    write_files(
        &dir,
        r#"[{"name": "Walk-ins", "sections": {"MainCourse": {"probability": 1.0, "cost_expectation": 9}}}]"#,
        r#"[{"name": "Rice", "tags": ["Carbs"]}, {"name": "Rice", "tags": ["Carbs"]}]"#,
        "[]",
    );

    let data = Dataset::load_dir(&dir).unwrap_or_else(|e| panic!("load failed: {e}"));
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(data.catalog.len(), 1);
    assert_eq!(data.index.edge_count(), 0);
    assert!(data
        .warnings
        .contains(&"Customers: Customer 'Walk-ins': missing favourite_tags".to_string()));
    assert!(data
        .warnings
        .contains(&"Ingredients: Ingredient 'Rice': duplicate entry ignored".to_string()));
    assert!(data
        .warnings
        .contains(&"Matches: Matches array is empty".to_string()));
    assert!(data.warnings.iter().all(|w| w.starts_with("Customers: ")
        || w.starts_with("Ingredients: ")
        || w.starts_with("Matches: ")));
}

#[test]
fn broken_file_is_an_error_and_triggers_demo_fallback() {
    let dir = scratch_dir("broken");
    write_files(
        &dir,
        r#"[{"favourite_tags": ["Wine"]}]"#,
        r#"[{"name": "Rice"}]"#,
        "[]",
    );

    let err = Dataset::load_dir(&dir).err();
    assert!(matches!(err, Some(DataError::InvalidInput(ref msg)) if msg.contains("name")));

    let data = Dataset::load_dir_or_demo(Some(&dir));
    let _ = fs::remove_dir_all(&dir);
    assert!(data.is_demo());
    assert_eq!(data.warnings.len(), 1);
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = scratch_dir("partial");
    fs::write(dir.join(CUSTOMERS_FILE), r#"[{"name": "Solo"}]"#)
        .unwrap_or_else(|e| panic!("write customers: {e}"));

    let result = Dataset::load_dir(&dir);
    let _ = fs::remove_dir_all(&dir);
    assert!(matches!(result, Err(DataError::Io(_))));
}
