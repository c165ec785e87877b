use csv_sink::{CsvFileWriter, RunInput};
use serde_json::{Map, Value, json};
use std::fs;
use tempfile::TempDir;

fn config(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn results(value: Value) -> Map<String, Value> {
    config(value)
}

#[test]
fn test_round_trip_writes_two_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("t.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path })))
        .expect("Failed to create writer");
    assert_eq!(writer.output_path(), path);

    let rows = results(json!({ "rows": [["a", "1"], ["b", "2"]] }));
    let outcome = writer
        .run(RunInput::from_results(rows.clone()))
        .expect("run failed")
        .expect("expected a write outcome");

    assert_eq!(outcome.results, rows);
    assert_eq!(outcome.file_path, path);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a,1\nb,2\n");
}

#[test]
fn test_no_results_performs_no_io() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("never.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    let outcome = writer.run(RunInput::default()).unwrap();

    assert!(outcome.is_none());
    assert!(!path.exists());
}

#[test]
fn test_overwrite_mode_keeps_only_last_write() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();

    writer
        .run(RunInput::from_results(results(json!({ "rows": [["first"]] }))))
        .unwrap();
    writer
        .run(RunInput::from_results(results(json!({ "rows": [["second"]] }))))
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
}

#[test]
fn test_append_mode_concatenates_writes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer =
        CsvFileWriter::new(&config(json!({ "_path": path, "_append": true }))).unwrap();

    writer
        .run(RunInput::from_results(results(json!({ "rows": [["first"]] }))))
        .unwrap();
    writer
        .run(RunInput::from_results(results(json!({ "rows": [["second"]] }))))
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
}

#[test]
fn test_append_mode_creates_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("fresh.csv");

    let writer =
        CsvFileWriter::new(&config(json!({ "_path": path, "_append": true }))).unwrap();
    writer
        .run(RunInput::from_results(results(json!({ "rows": [["only"]] }))))
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "only\n");
}

#[test]
fn test_pass_through_options_reach_the_renderer() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({
        "_path": path,
        "delimiter": ";",
        "header": true,
        "columns": ["name", "count"],
    })))
    .unwrap();

    writer
        .run(RunInput::from_results(results(json!({
            "rows": [["a", "1"], ["b", "2"]],
        }))))
        .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "name;count\na;1\nb;2\n"
    );
}

#[test]
fn test_first_key_is_the_root_key() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    writer
        .run(RunInput::from_results(results(json!({
            "rows": [["written"]],
            "ignored": [["not written"]],
        }))))
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "written\n");
}

#[test]
fn test_render_failure_writes_no_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    let input = RunInput::from_results(results(json!({ "rows": [[["nested"]]] })));

    assert!(writer.run(input).is_err());
    assert!(!path.exists());
}

#[test]
fn test_io_failure_propagates() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("missing").join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    let input = RunInput::from_results(results(json!({ "rows": [["a"]] })));

    let err = writer.run(input).unwrap_err();
    assert!(err.to_string().contains("out.csv"));
}

#[test]
fn test_non_sequence_root_value_is_an_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    let input = RunInput::from_results(results(json!({ "rows": "not-a-sequence" })));

    assert!(writer.run(input).is_err());
    assert!(!path.exists());
}

#[test]
fn test_parse_results_are_ignored() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out.csv");

    let writer = CsvFileWriter::new(&config(json!({ "_path": path }))).unwrap();
    let input = RunInput {
        results: Some(results(json!({ "rows": [["a"]] }))),
        parse_results: Some(json!({ "anything": "at all" })),
    };

    let outcome = writer.run(input).unwrap().unwrap();
    assert_eq!(outcome.file_path, path);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\n");
}
