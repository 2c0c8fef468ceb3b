//! Integration tests for the CLI commands over record files.

use std::fs;
use std::path::PathBuf;

use fuzzyrank::cli::{FieldsArgs, SearchArgs, run_fields, run_search};
use fuzzyrank::error::{FuzzyRankError, Result};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn search_args(records_file: PathBuf, query: &str) -> SearchArgs {
    SearchArgs {
        records_file,
        query: query.to_string(),
        identity_field: "id".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_search_json_array() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        &temp_dir,
        "hotels.json",
        r#"[
            {"id": 1, "name": "Alpine Ridge"},
            {"id": 2, "name": "Alpine Lodge"},
            {"id": 3, "name": "Coastal View"}
        ]"#,
    );

    let mut args = search_args(path, "Alpine%20Lodge");
    args.fields = vec!["name".to_string()];
    args.model = Some("Hotel".to_string());

    let results = run_search(&args)?;
    assert_eq!(results.query, "Alpine%20Lodge");
    assert_eq!(results.total_hits, 2);
    assert_eq!(results.hits[0].id.to_string(), "2");
    assert_eq!(results.hits[1].id.to_string(), "1");
    assert!(
        results
            .hits
            .iter()
            .all(|hit| hit.model_name.as_deref() == Some("Hotel"))
    );
    Ok(())
}

#[test]
fn test_search_jsonl_with_config() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        &temp_dir,
        "hotels.jsonl",
        "{\"slug\": \"ridge\", \"name\": \"Alpine Ridge\"}\n\
         {\"slug\": \"lodge\", \"name\": \"Alpine Lodge\"}\n",
    );

    let mut args = search_args(path, "alpine");
    args.identity_field = "slug".to_string();
    args.config = Some(r#"{"limit": "1", "fields": ["name"]}"#.to_string());

    let results = run_search(&args)?;
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id.to_string(), "ridge");
    Ok(())
}

#[test]
fn test_search_collections_file() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        &temp_dir,
        "central.json",
        r#"{
            "Hotel": [{"id": 1, "name": "Alpine Lodge"}],
            "Restaurant": [{"id": 1, "title": "Lodge Grill"}]
        }"#,
    );

    let results = run_search(&search_args(path.clone(), "lodge"))?;
    let models: Vec<_> = results
        .hits
        .iter()
        .map(|hit| hit.model_name.clone().unwrap_or_default())
        .collect();
    assert_eq!(models, vec!["Hotel", "Restaurant"]);

    let mut args = search_args(path, "lodge");
    args.model = Some("Restaurant".to_string());
    let results = run_search(&args)?;
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].model_name.as_deref(), Some("Restaurant"));
    Ok(())
}

#[test]
fn test_search_invalid_weights() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(&temp_dir, "hotels.json", r#"[{"id": 1, "name": "Alpine"}]"#);

    let mut args = search_args(path, "alpine");
    args.weights = Some("[1, 2]".to_string());

    assert!(matches!(
        run_search(&args),
        Err(FuzzyRankError::Configuration(_))
    ));
}

#[test]
fn test_search_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let args = search_args(temp_dir.path().join("missing.json"), "alpine");
    assert!(matches!(run_search(&args), Err(FuzzyRankError::Io(_))));
}

#[test]
fn test_fields() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        &temp_dir,
        "central.json",
        r#"{"Hotel": [{"name": "a", "id": 1, "city": "b"}], "Empty": []}"#,
    );

    let lists = run_fields(&FieldsArgs { records_file: path })?;
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].model.as_deref(), Some("Empty"));
    assert!(lists[0].fields.is_empty());
    assert_eq!(lists[1].fields, vec!["city", "id", "name"]);
    Ok(())
}
