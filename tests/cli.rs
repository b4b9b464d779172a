//! Integration tests running the linedex binary against a fixture corpus.

use linedex::server::{IndexClient, IndexServer, ServerConfig};
use linedex::{Corpus, Engine};
use std::collections::HashSet;
use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use std::thread;

static FIXTURE_DIR: OnceLock<PathBuf> = OnceLock::new();

const CORPUS: &str = "\
Captain Nemo was at the helm.
Ned Land wanted to escape.
\"Ned Land!\" said Conseil.

The Nautilus surfaced near NED LAND's island.
";

/// Get or create the fixture directory (singleton)
fn get_fixture_dir() -> PathBuf {
    FIXTURE_DIR.get_or_init(create_fixture_dir).clone()
}

fn create_fixture_dir() -> PathBuf {
    let dir = std::env::temp_dir()
        .join("linedex_test_fixtures")
        .join(format!("test_{}", std::process::id()));

    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create fixture dir");
    fs::write(dir.join("corpus.txt"), CORPUS).unwrap();
    fs::write(dir.join("config.json"), r#"{"progress_every": 1}"#).unwrap();

    dir
}

/// Run linedex against the fixture corpus; returns (stdout, stderr, exit code)
fn run_linedex(args: &[&str]) -> (String, String, Option<i32>) {
    let dir = get_fixture_dir();
    let corpus = dir.join("corpus.txt");
    let config = dir.join("config.json");

    let mut cmd_args: Vec<&str> = args.to_vec();
    cmd_args.extend(["--config", config.to_str().unwrap()]);
    if matches!(args.first(), Some(&("search" | "get" | "stats" | "perf"))) {
        cmd_args.extend(["--corpus", corpus.to_str().unwrap()]);
    }

    let output = Command::new(env!("CARGO_BIN_EXE_linedex"))
        .args(&cmd_args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run linedex");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

fn line_set(stdout: &str) -> HashSet<&str> {
    stdout.lines().collect()
}

#[test]
fn test_search_prints_matching_lines() {
    let (stdout, _, code) = run_linedex(&["search", "ned land", "--color", "never"]);
    assert_eq!(code, Some(0));
    assert_eq!(
        line_set(&stdout),
        HashSet::from([
            "Ned Land wanted to escape.",
            "\"Ned Land!\" said Conseil.",
            "The Nautilus surfaced near NED LAND's island.",
        ])
    );
}

#[test]
fn test_search_line_numbers() {
    let (stdout, _, code) = run_linedex(&["search", "nautilus", "-n", "--color", "never"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "4:The Nautilus surfaced near NED LAND's island.\n");
}

#[test]
fn test_search_count() {
    let (stdout, _, code) = run_linedex(&["search", "Ned Land", "--count", "--color", "never"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_search_not_found_exits_with_one() {
    let (stdout, stderr, code) = run_linedex(&["search", "land ned", "--color", "never"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert!(stderr.contains("Not found phrase 'land ned'"), "stderr: {}", stderr);
}

#[test]
fn test_search_with_limit() {
    let (stdout, _, code) = run_linedex(&[
        "search",
        "The Nautilus surfaced near",
        "--limit",
        "2",
        "--color",
        "never",
    ]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "The Nautilus surfaced near NED LAND's island.\n");
}

#[test]
fn test_search_logs_to_stderr() {
    let (stdout, stderr, code) = run_linedex(&["search", "nemo", "--color", "never"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "Captain Nemo was at the helm.\n");
    assert!(stderr.contains("Read 5 lines from"), "stderr: {}", stderr);
}

#[test]
fn test_get_line() {
    let (stdout, _, code) = run_linedex(&["get", "1"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "Ned Land wanted to escape.\n");

    let (stdout, _, code) = run_linedex(&["get", "3"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "\n");
}

#[test]
fn test_get_line_out_of_range() {
    let (_, stderr, code) = run_linedex(&["get", "99"]);
    assert_ne!(code, Some(0));
    assert!(stderr.contains("Can't find line 99. Read only 5 lines."), "stderr: {}", stderr);
}

#[test]
fn test_stats() {
    let (stdout, _, code) = run_linedex(&["stats"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Lines:"), "stdout: {}", stdout);
    assert!(stdout.contains("Trie nodes:"), "stdout: {}", stdout);
}

#[test]
fn test_perf_local() {
    let (stdout, _, code) = run_linedex(&[
        "perf",
        "--phrase",
        "Ned Land",
        "--threads",
        "2",
        "--searches",
        "100",
    ]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Phrase 'Ned Land' found in 3 lines"), "stdout: {}", stdout);
    assert!(stdout.contains("Performed 200 searches on 2 threads"), "stdout: {}", stdout);
}

#[test]
fn test_config_prints_effective_values() {
    let (stdout, _, code) = run_linedex(&["config"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("\"progress_every\": 1"), "stdout: {}", stdout);
    assert!(stdout.contains("\"bench_phrase\": \"Ned Land\""), "stdout: {}", stdout);
}

#[test]
fn test_client_without_server() {
    // Bind then drop to get a port nobody listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .to_string();
    let (_, stderr, code) = run_linedex(&["status", "--bind", &addr]);
    assert_ne!(code, Some(0));
    assert!(stderr.contains("Failed to connect"), "stderr: {}", stderr);
}

#[test]
fn test_query_count_respects_color_never() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = Engine::build(Corpus::from_text(CORPUS), Default::default());
    let server = IndexServer::new(engine, None, ServerConfig::default());
    let handle = thread::spawn(move || server.serve(listener).unwrap());

    let bind = addr.to_string();
    let config = get_fixture_dir().join("config.json");
    let query = |extra: &[&str]| {
        let output = Command::new(env!("CARGO_BIN_EXE_linedex"))
            .args(["query", "Ned Land", "--bind", &bind, "--color", "never"])
            .args(extra)
            .args(["--config", config.to_str().unwrap()])
            // A color-capable terminal would otherwise get escape codes
            .env("TERM", "xterm-256color")
            .env_remove("NO_COLOR")
            .output()
            .expect("Failed to run linedex");
        (String::from_utf8_lossy(&output.stdout).to_string(), output.status.code())
    };

    let (stdout, code) = query(&["--count"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout, "3\n");

    let (stdout, code) = query(&[]);
    assert_eq!(code, Some(0));
    assert!(!stdout.contains('\x1b'), "stdout: {:?}", stdout);
    assert_eq!(line_set(&stdout).len(), 3);

    IndexClient::connect(addr).unwrap().shutdown().unwrap();
    handle.join().unwrap();
}
