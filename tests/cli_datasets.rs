use std::fs;
use std::path::{Path, PathBuf};

use datautils::cli::run;
use datautils::{EmbeddingTable, VectorModel};
use tempfile::{TempDir, tempdir};

fn write_dataset() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let base = temp.path().join("data");
    fs::create_dir_all(base.join("docs")).unwrap();
    fs::create_dir_all(base.join("split")).unwrap();
    fs::write(base.join("docs/a.txt"), "From: x\n\nPlanet rocket.").unwrap();
    fs::write(base.join("docs/b.txt"), "Subject: y\n\nComet!").unwrap();
    fs::write(base.join("split/space"), "docs/a.txt\ndocs/b.txt\n").unwrap();
    (temp, base)
}

fn args(items: &[&str]) -> impl Iterator<Item = String> {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .into_iter()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn vectorize_words_mirrors_the_input_layout() {
    let (temp, base) = write_dataset();
    let model_path = temp.path().join("vectors.txt");
    fs::write(&model_path, "2 2\nplanet 1 0\nrocket 0 1\n").unwrap();
    let out = temp.path().join("out");

    let base_arg = path_arg(&base);
    let split_arg = path_arg(&base.join("split"));
    let model_arg = path_arg(&model_path);
    let out_arg = path_arg(&out);
    run(args(&[
        "vectorize",
        "--base-dir",
        &base_arg,
        "--split-dir",
        &split_arg,
        "--model",
        &model_arg,
        "--out-dir",
        &out_arg,
    ]))
    .unwrap();

    assert_eq!(fs::read_to_string(out.join("docs/a.txt")).unwrap(), "0.5\n0.5\n");
    assert_eq!(fs::read_to_string(out.join("docs/b.txt")).unwrap(), "0\n0\n");
    assert_eq!(
        fs::read_to_string(out.join("split/space")).unwrap(),
        "docs/a.txt\ndocs/b.txt\n"
    );
}

#[test]
fn vectorize_documents_looks_up_ids() {
    let (temp, base) = write_dataset();
    let mut table = EmbeddingTable::new(3);
    table.insert("src=docs/a.txt", vec![0.25, 0.5, 1.0]).unwrap();
    let model_path = temp.path().join("docs.json");
    table.save(&model_path).unwrap();
    let out = temp.path().join("out");

    let base_arg = path_arg(&base);
    let split_arg = path_arg(&base.join("split"));
    let model_arg = path_arg(&model_path);
    let out_arg = path_arg(&out);
    run(args(&[
        "vectorize",
        "--base-dir",
        &base_arg,
        "--split-dir",
        &split_arg,
        "--model",
        &model_arg,
        "--method",
        "documents",
        "--out-dir",
        &out_arg,
    ]))
    .unwrap();

    assert_eq!(fs::read_to_string(out.join("docs/a.txt")).unwrap(), "0.25\n0.5\n1\n");
    assert_eq!(fs::read_to_string(out.join("docs/b.txt")).unwrap(), "0\n0\n0\n");
}

#[test]
fn bow_writes_records_and_vocabulary() {
    let (temp, base) = write_dataset();
    let output = temp.path().join("bow.json");

    let base_arg = path_arg(&base);
    let split_arg = path_arg(&base.join("split"));
    let output_arg = path_arg(&output);
    run(args(&[
        "bow",
        "--base-dir",
        &base_arg,
        "--split-dir",
        &split_arg,
        "--min-count",
        "1",
        "--output",
        &output_arg,
    ]))
    .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["vocabulary"], serde_json::json!(["planet", "rocket", "comet"]));
    assert_eq!(written["records"][0]["data"], serde_json::json!([[0, 1], [1, 1]]));
    assert_eq!(written["records"][1]["label"], serde_json::json!("space"));
}

#[test]
fn annotations_attach_seeded_majority_and_buckets() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("votes.csv");
    fs::write(
        &input,
        "worker,source,annotation,score\n1,doc1,yes,0.2\n2,doc1,yes,0.45\n3,doc1,no,0.9\n1,doc2,no,0.3\n2,doc2,no,0.1\n",
    )
    .unwrap();
    let output = temp.path().join("labels.json");

    let input_arg = path_arg(&input);
    let output_arg = path_arg(&output);
    run(args(&[
        "annotations",
        "--input",
        &input_arg,
        "--seed",
        "7",
        "--threshold-attr",
        "score",
        "--levels",
        "0.3,0.6",
        "--names",
        "low,medium,high",
        "--output",
        &output_arg,
    ]))
    .unwrap();

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(rows.len(), 5);
    let labels: Vec<Option<&str>> = rows
        .iter()
        .map(|row| row.get("label").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(labels, vec![Some("yes"), Some("yes"), Some("yes"), None, None]);
    let buckets: Vec<&str> = rows.iter().map(|row| row["score"].as_str().unwrap()).collect();
    assert_eq!(buckets, vec!["low", "medium", "high", "medium", "low"]);
}

#[test]
fn annotations_read_tab_separated_votes() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("votes.tsv");
    fs::write(
        &input,
        "worker\tsource\tannotation\n1\tdoc1\tyes, mostly\n2\tdoc1\tyes, mostly\n3\tdoc1\tno\n",
    )
    .unwrap();
    let output = temp.path().join("labels.json");

    let input_arg = path_arg(&input);
    let output_arg = path_arg(&output);
    run(args(&["annotations", "--input", &input_arg, "--output", &output_arg])).unwrap();

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["source"], serde_json::json!("doc1"));
    assert_eq!(rows[2]["annotation"], serde_json::json!("no"));
    for row in &rows {
        assert_eq!(row["label"], serde_json::json!("yes, mostly"));
    }
}

#[test]
fn missing_split_dir_is_reported() {
    let temp = tempdir().unwrap();
    let base_arg = path_arg(temp.path());
    let split_arg = path_arg(&temp.path().join("absent"));
    let err = run(args(&["bow", "--base-dir", &base_arg, "--split-dir", &split_arg])).unwrap_err();
    assert!(err.to_string().contains("absent"));
}

#[test]
fn stored_models_load_back() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("vectors.txt");
    let mut table = EmbeddingTable::new(1);
    table.insert("galaxy", vec![2.5]).unwrap();
    table.save(&path).unwrap();
    assert_eq!(EmbeddingTable::load(&path).unwrap().lookup("galaxy"), Some(vec![2.5]));
}
