//! End-to-end tests driving the `cqa` binary.
//!
//! Everything here runs offline: dry-run ingestion stops before the
//! embedding provider, and the rest exercises argument and configuration
//! validation.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cqa_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("cqa");
    path
}

fn setup_env() -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    let src_dir = root.join("src");
    fs::create_dir_all(&src_dir).unwrap();

    fs::write(
        src_dir.join("main.go"),
        "package main\n\nfunc main() {\n\tprintln(\"hello\")\n}\n",
    )
    .unwrap();
    fs::write(
        src_dir.join("util.go"),
        "package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n",
    )
    .unwrap();
    fs::write(src_dir.join("util_test.go"), "package main\n").unwrap();

    let config_content = format!(
        r#"[chunking]
max_tokens = 500

[[sources.tree]]
root = "{}/src"
extension = "go"

[output]
corpus_csv = "{root}/processed/corpus.csv"
embeddings_csv = "{root}/processed/embeddings.csv"
"#,
        root.display(),
        root = root.display()
    );
    fs::write(root.join("config").join("cqa.toml"), config_content).unwrap();

    (tmp, root.join("config").join("cqa.toml"))
}

fn run_cqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cqa_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cqa: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn ingest_dry_run_reports_counts() {
    let (_tmp, config_path) = setup_env();

    let (stdout, stderr, success) = run_cqa(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ingest (dry-run)"), "got: {}", stdout);
    // util_test.go is excluded by default
    assert!(stdout.contains("documents: 2"), "got: {}", stdout);
    assert!(stdout.contains("tokenizer:"), "got: {}", stdout);
}

#[test]
fn ingest_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_env();
    let root = _tmp.path();

    let (_, _, success) = run_cqa(&config_path, &["ingest", "--dry-run"]);
    assert!(success);
    assert!(!root.join("processed").exists());
}

#[test]
fn no_arguments_prints_usage() {
    let output = Command::new(cqa_binary()).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "got: {}", stderr);
}

#[test]
fn missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_cqa(&missing, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("config"), "got: {}", stderr);
}

#[test]
fn budget_overflow_rejected_at_startup() {
    let (_tmp, config_path) = setup_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[completion]\nmax_context_tokens = 7000\nmax_answer_tokens = 2000\nhard_window = 8192\n");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_cqa(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("hard_window"), "got: {}", stderr);
}

#[test]
fn unknown_provider_rejected_at_startup() {
    let (_tmp, config_path) = setup_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[embedding]\nprovider = \"cohere\"\n");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_cqa(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("provider"), "got: {}", stderr);
}

#[test]
fn ask_fails_cleanly_without_embeddings_table() {
    let (_tmp, config_path) = setup_env();

    let (_, _, success) = run_cqa(&config_path, &["ask", "what does main do?"]);
    assert!(!success);
}
