use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};

fn classforge_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_classforge"))
}

fn run(args: &[&str]) -> Output {
    Command::new(classforge_bin())
        .args(args)
        .output()
        .expect("run classforge")
}

fn write_diagram(dir: &Path, document: &Value) -> PathBuf {
    let path = dir.join("diagram.json");
    fs::write(&path, serde_json::to_string_pretty(document).expect("serialize")).expect("write diagram");
    path
}

fn library() -> Value {
    json!({
        "elements": {
            "a": { "id": "a", "name": "Author", "type": "class",
                   "attributes": [{ "name": "id", "type": "Long", "isPrimaryKey": true }, "name: String"] },
            "b": { "id": "b", "name": "Book", "type": "class",
                   "attributes": [
                       { "name": "id", "type": "Long", "isPrimaryKey": true },
                       "title: String",
                       { "name": "author", "type": "Long", "isForeignKey": true, "referencedEntity": "Author" }
                   ] }
        },
        "connections": {
            "r1": { "id": "r1", "source": "a", "target": "b", "type": "association",
                    "sourceMultiplicity": "1", "targetMultiplicity": "*" }
        }
    })
}

#[test]
fn generate_writes_layered_sources() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = write_diagram(tmp.path(), &library());
    let out = tmp.path().join("out");
    let diagnostics = tmp.path().join("diagnostics.json");

    let output = run(&[
        "generate",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--package",
        "org.acme.library",
        "--diagnostics-json",
        diagnostics.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));

    for path in [
        "entities/Author.java",
        "entities/Book.java",
        "dto/BookDTO.java",
        "mappers/BookMapper.java",
        "repositories/BookRepository.java",
        "services/BookService.java",
        "controllers/BookController.java",
    ] {
        assert!(out.join(path).is_file(), "missing {path}");
    }
    let book = fs::read_to_string(out.join("entities/Book.java")).unwrap();
    assert!(book.starts_with("package org.acme.library.entities;"));

    let report: Value = serde_json::from_str(&fs::read_to_string(diagnostics).unwrap()).unwrap();
    assert_eq!(report, json!([]));
}

#[test]
fn check_reports_warnings_as_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut document = library();
    document["connections"]["r1"]["type"] = json!("uses-a");
    let input = write_diagram(tmp.path(), &document);

    let output = run(&["check", input.to_str().unwrap(), "--json"]);
    assert!(output.status.success());
    let diagnostics: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    let entries = diagnostics.as_array().expect("array");
    assert!(entries
        .iter()
        .any(|d| d["kind"] == "classification" && d["message"].as_str().unwrap_or("").contains("uses-a")));

    let denied = run(&["check", input.to_str().unwrap(), "--deny-warnings"]);
    assert!(!denied.status.success());
}

#[test]
fn check_fails_on_malformed_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("broken.json");
    fs::write(&input, "{ \"elements\": [ { \"name\": \"NoId\" } ] }").unwrap();

    let output = run(&["check", input.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse diagram"), "stderr={stderr}");
}

#[test]
fn surface_prints_predicted_accessors() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = write_diagram(tmp.path(), &library());

    let output = run(&["surface", input.to_str().unwrap()]);
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(report["surfaces"]["b"]["entity"]["author"]["setter"], "setAuthor");
    assert_eq!(report["surfaces"]["b"]["dto"]["authorId"]["javaType"], "Long");
    assert_eq!(report["surfaces"]["a"]["entity"]["books"]["getter"], "getBooks");
}

#[test]
fn config_file_sets_api_prefix() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = write_diagram(tmp.path(), &library());
    let config = tmp.path().join("classforge.json");
    fs::write(&config, r#"{ "apiPrefix": "/v2", "derivedQueryLimit": 0 }"#).unwrap();
    let out = tmp.path().join("out");

    let output = run(&[
        "generate",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));

    let controller = fs::read_to_string(out.join("controllers/AuthorController.java")).unwrap();
    assert!(controller.contains("@RequestMapping(\"/v2/authors\")"));
    let repository = fs::read_to_string(out.join("repositories/BookRepository.java")).unwrap();
    assert!(!repository.contains("findByTitle"));
}
