// End-to-end tests for the `labelrecon` binary.
// Run with: cargo test -p labelrecon-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

fn labelrecon(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_labelrecon"))
        .args(args)
        .env_remove("LABELRECON_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("run labelrecon")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ===========================================================================
// Successful runs
// ===========================================================================

#[test]
fn reconciled_csv_with_explanations() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("reconciled.csv");
    let config = fixture("labels.toml");

    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--config",
        &config,
        "-r",
        path_arg(&out),
        "-e",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = std::fs::read_to_string(&out).unwrap();
    let header = content.lines().next().unwrap();
    assert!(header.starts_with("classification_id,classification_id: Explanation,subject_id"));
    assert!(header.contains("country,country: Explanation"));
    assert!(header.contains("leaf scale 0.5 mm: length mm"));
    assert_eq!(content.lines().count(), 4, "header plus s1, s2, s4");

    let err = stderr(&output);
    assert!(err.contains("'Herbarium labels' (10): 3 subjects from 6 transcripts, problems: 3"), "{err}");
    assert!(err.contains("wrote"));
}

#[test]
fn json_summary_on_stdout() {
    let config = fixture("labels.toml");
    let output = labelrecon(&[&fixture("labels.csv"), "--config", &config, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(summary["subjects"], 3);
    assert_eq!(summary["transcripts"], 6);
    assert_eq!(summary["transcribers"]["alice"], 2);

    let problems = summary["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 3);
    assert_eq!(problems[0]["group"], "s2");
    assert_eq!(problems[0]["flag"], "no_match");
}

#[test]
fn json_input_matches_csv_input() {
    let dir = tempdir().unwrap();
    let from_csv = dir.path().join("csv.csv");
    let from_json = dir.path().join("json.csv");
    let config = fixture("labels.toml");

    let a = labelrecon(&[&fixture("labels.csv"), "--config", &config, "-r", path_arg(&from_csv)]);
    let b = labelrecon(&[&fixture("labels.json"), "--config", &config, "-r", path_arg(&from_json)]);
    assert!(a.status.success() && b.status.success());

    assert_eq!(
        std::fs::read_to_string(from_csv).unwrap(),
        std::fs::read_to_string(from_json).unwrap()
    );
}

#[test]
fn flags_override_config_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("reconciled.csv");
    let config = fixture("labels.toml");

    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--config",
        &config,
        "-c",
        "country:noop",
        "--workflow-name",
        "Labels",
        "-r",
        path_arg(&out),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("'Labels' (10): 3 subjects from 6 transcripts, problems: 1"));
}

#[test]
fn summary_report_html() {
    let dir = tempdir().unwrap();
    let full = dir.path().join("full.html");
    let short = dir.path().join("short.html");
    let config = fixture("labels.toml");

    let a = labelrecon(&[&fixture("labels.csv"), "--config", &config, "-s", path_arg(&full), "--page-size", "1"]);
    let b = labelrecon(&[&fixture("labels.csv"), "--config", &config, "-s", path_arg(&short), "--no-summary-detail"]);
    assert!(a.status.success() && b.status.success());

    let full = std::fs::read_to_string(full).unwrap();
    assert!(full.contains("<h1>Summary of &#39;Herbarium labels&#39; (10)</h1>"));
    assert!(full.contains("<section id=\"page-3\">"));

    let short = std::fs::read_to_string(short).unwrap();
    assert!(short.contains("<h2>Problems (3)</h2>"));
    assert!(!short.contains("<h2>Details</h2>"));
}

#[test]
fn zip_removes_originals() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let out = dir.path().join("out.csv");
    let zip = dir.path().join("outputs.zip");
    let config = fixture("labels.toml");

    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--config",
        &config,
        "-u",
        path_arg(&raw),
        "-r",
        path_arg(&out),
        "-z",
        path_arg(&zip),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(zip.exists());
    assert!(!raw.exists());
    assert!(!out.exists());
}

#[test]
fn zip_keep_leaves_originals() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let zip = dir.path().join("outputs.zip");
    let config = fixture("labels.toml");

    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--config",
        &config,
        "-r",
        path_arg(&out),
        "--zip-keep",
        path_arg(&zip),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(zip.exists());
    assert!(out.exists());
}

#[test]
fn long_version_names_commit_and_target() {
    let output = labelrecon(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with(&format!("labelrecon {} (", env!("CARGO_PKG_VERSION"))), "{stdout}");
    assert!(!first.ends_with("()"), "{stdout}");
    let target = stdout.lines().find_map(|l| l.strip_prefix("target:  ")).unwrap();
    assert!(!target.trim().is_empty());
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn threshold_out_of_range_is_config_error() {
    let output = labelrecon(&[&fixture("labels.csv"), "--fuzzy-ratio-threshold", "101"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).starts_with("error: config validation error"));
}

#[test]
fn unknown_column_type_is_config_error() {
    let output = labelrecon(&[&fixture("labels.csv"), "-c", "country:circle"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("unknown column type 'circle'"));
}

#[test]
fn missing_group_column() {
    let output = labelrecon(&[&fixture("labels.csv"), "--group-by", "specimen_id"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("missing column 'specimen_id'"));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn empty_workflow_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--workflow-id",
        "99",
        "--workflow-name",
        "Nothing",
        "-r",
        path_arg(&out),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("error: workflow 'Nothing' (99) has no data"));
    assert!(!out.exists());
}

#[test]
fn unknown_format_is_usage_error() {
    let output = labelrecon(&[&fixture("labels.csv"), "--format", "nfn"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("expected one of: csv, json"));
}

#[test]
fn zip_without_outputs_is_usage_error() {
    let dir = tempdir().unwrap();
    let output = labelrecon(&[&fixture("labels.csv"), "-z", path_arg(&dir.path().join("o.zip"))]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("nothing to archive"));
}

#[test]
fn missing_input_is_io_error() {
    let dir = tempdir().unwrap();
    let output = labelrecon(&[path_arg(&dir.path().join("absent.csv"))]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("absent.csv"));
}

#[test]
fn failed_write_leaves_no_outputs() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let bad = dir.path().join("no-such-dir").join("out.csv");
    let config = fixture("labels.toml");

    let output = labelrecon(&[
        &fixture("labels.csv"),
        "--config",
        &config,
        "-u",
        path_arg(&raw),
        "-r",
        path_arg(&bad),
    ]);
    assert_eq!(output.status.code(), Some(6));
    assert!(!raw.exists());
}
