//! CLI command integration tests.
//! Each test writes its corpus into a temp directory and runs with the
//! offline hash embedder.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CHAT: &str = "\
alice: the deploy pipeline failed again on the staging cluster
bob: staging cluster ran out of disk, pipeline logs filled the volume
alice: lunch plans? bob: tacos sound great
carol: rotated the staging credentials, pipeline should pick them up
";

fn stasis_cmd() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("stasis").unwrap();
    cmd.env_remove("STASIS_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write_corpus(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, CHAT).unwrap();
    path
}

fn query_json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let corpus = write_corpus(dir);
    let output = stasis_cmd()
        .arg("--corpus")
        .arg(&corpus)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn query_prints_ranked_json() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["query", "staging disk"]);

    assert_eq!(json["query"], "staging disk");
    let results = json["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["chunk_id"], "chat:2");
    assert!(results[0]["combined_score"].as_f64().unwrap() > 0.0);
}

#[test]
fn top_k_flag_limits_results() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["query", "staging pipeline", "--top-k", "1"]);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[test]
fn no_cross_reference_uses_similarity_source() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["query", "staging pipeline", "--no-cross-reference"]);
    let results = json["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["source"] == "similarity"));
}

#[test]
fn stop_term_only_query_is_empty() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["query", "the of and"]);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[test]
fn anchor_picks_rarest_term() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["anchor", "staging disk"]);
    assert_eq!(json["anchor"]["term"], "disk");
    assert_eq!(json["anchor"]["corpus_frequency"], 1);
}

#[test]
fn anchor_reports_degradation() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["anchor", "zebra giraffe"]);
    assert!(json["anchor"].is_null());
    assert!(json["reason"].as_str().unwrap().contains("anchor"));
}

#[test]
fn stats_counts_chunks() {
    let dir = TempDir::new().unwrap();
    let json = query_json(&dir, &["stats", "--rarest", "3"]);
    assert_eq!(json["chunks"], 4);
    assert_eq!(json["rarest"].as_array().unwrap().len(), 3);
}

#[test]
fn boundary_marker_sets_thread_segment() {
    let dir = TempDir::new().unwrap();
    let json = query_json(
        &dir,
        &["query", "tacos", "--boundary-marker", "alice", "--boundary-marker", "bob"],
    );
    let thread = &json["results"][0]["supporting_detail"]["best_thread"];
    assert_eq!(thread["anchor_term"], "tacos");
    assert_eq!(thread["segment"], 2);
}

#[test]
fn config_file_applies() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("stasis.toml");
    std::fs::write(&config, "[ranking]\ntop_k = 2\n").unwrap();
    let corpus = write_corpus(&dir);

    let output = stasis_cmd()
        .env("STASIS_CONFIG", &config)
        .arg("--corpus")
        .arg(&corpus)
        .args(["query", "staging pipeline"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_corpus_fails() {
    stasis_cmd()
        .args(["query", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--corpus"));
}

#[test]
fn invalid_threshold_fails() {
    let dir = TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    stasis_cmd()
        .arg("--corpus")
        .arg(&corpus)
        .args(["query", "staging", "--threshold=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid ranking options"));
}
