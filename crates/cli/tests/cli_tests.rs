// End-to-end tests for the `faed` binary.
//
// Settings are isolated by pointing XDG_CONFIG_HOME / XDG_DATA_HOME at a
// temporary directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn faed(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_faed"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("HOME", home)
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn json(out: &Output) -> serde_json::Value {
    serde_json::from_str(stdout(out).trim())
        .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\n{}", stdout(out)))
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ===========================================================================
// run
// ===========================================================================

#[test]
fn run_json_readme_scenario() {
    let home = TempDir::new().unwrap();
    let out = faed(home.path())
        .args(["run", "--json", "--no-export", "--no-backup"])
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let v = json(&out);
    assert_eq!(v["stats"]["total_input"], 4);
    assert_eq!(v["stats"]["excluded"], 1);
    assert_eq!(v["stats"]["conserved"], 2);
    assert_eq!(v["stats"]["to_delete"], 1);
    assert_eq!(v["to_delete"][0]["record"]["signalisation_id"], "12345");
    assert_eq!(v["to_delete"][0]["rule"], "self_referential");
    assert_eq!(v["input"]["delimiter"], ";");
    assert!(v["input"]["fingerprint"].as_str().unwrap().starts_with("sha256:"));
    assert!(v.get("export").is_none());
    assert!(v.get("backup").is_none());
    assert!(stderr(&out).contains("conserved: 2 (66.7%), to delete: 1 (33.3%)"));
}

#[test]
fn run_writes_reports_and_backup() {
    let home = TempDir::new().unwrap();
    let exports = home.path().join("exports");
    let backups = home.path().join("backups");

    let out = faed(home.path())
        .arg("run")
        .arg(fixture("readme.csv"))
        .arg("--export-dir")
        .arg(&exports)
        .arg("--backup-dir")
        .arg(&backups)
        .arg("--json")
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let v = json(&out);

    let files = v["export"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 5);
    for f in files {
        let path = PathBuf::from(f["path"].as_str().unwrap());
        assert!(path.starts_with(&exports));
        assert!(path.is_file(), "{} missing", path.display());
    }

    let backup = PathBuf::from(v["backup"].as_str().unwrap());
    assert!(backup.starts_with(&backups));
    let name = backup.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("backup_") && name.ends_with("_readme.csv"), "{name}");
    assert_eq!(
        std::fs::read(&backup).unwrap(),
        std::fs::read(fixture("readme.csv")).unwrap()
    );
}

#[test]
fn run_writes_output_file() {
    let home = TempDir::new().unwrap();
    let output = home.path().join("result.json");
    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup", "--output"])
        .arg(&output)
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).trim().is_empty());
    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(v["meta"]["excluded_prefix"], "PN");
}

#[test]
fn strict_exit_reports_duplicates() {
    let home = TempDir::new().unwrap();
    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup", "--strict-exit"])
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(6));
    assert!(stderr(&out).contains("1 signalisations to delete"));
}

#[test]
fn settings_disable_backup() {
    let home = TempDir::new().unwrap();
    let settings_dir = home.path().join("config/faed");
    std::fs::create_dir_all(&settings_dir).unwrap();
    std::fs::write(settings_dir.join("settings.json"), "{\"backup.enabled\": false}").unwrap();

    let out = faed(home.path())
        .args(["run", "--json", "--no-export"])
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(json(&out).get("backup").is_none());
}

#[test]
fn custom_config_changes_exclusion() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("policy.toml");
    std::fs::write(&config, "excluded_prefix = \"XX\"\nparallel = false\n").unwrap();

    let out = faed(home.path())
        .args(["run", "--json", "--no-export", "--no-backup", "--config"])
        .arg(&config)
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let v = json(&out);
    assert_eq!(v["stats"]["excluded"], 0);
    assert_eq!(v["stats"]["eligible"], 4);
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn missing_input_file_is_io_error() {
    let home = TempDir::new().unwrap();
    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup"])
        .arg(home.path().join("absent.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn missing_column_is_input_error_with_hint() {
    let home = TempDir::new().unwrap();
    let input = write_input(&home, "bad.csv", "NUMERO_SIGNALISATION;NOM\n1;A\n");
    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup"])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("missing required column"), "{err}");
    assert!(err.contains("hint:  required columns: NUMERO_SIGNALISATION"), "{err}");
}

#[test]
fn duplicate_signalisation_is_input_error() {
    let home = TempDir::new().unwrap();
    let content = std::fs::read_to_string(fixture("readme.csv")).unwrap();
    let last = content.lines().last().unwrap().to_string();
    let input = write_input(&home, "dup.csv", &format!("{content}{last}\n"));

    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup"])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("already appears at line 5"));
}

#[test]
fn invalid_config_exit_code() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("policy.toml");
    std::fs::write(&config, "[dates]\nformats = []\n").unwrap();

    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup", "--config"])
        .arg(&config)
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn non_ascii_delimiter_is_usage_error() {
    let home = TempDir::new().unwrap();
    let out = faed(home.path())
        .args(["run", "--no-export", "--no-backup", "--delimiter", "é"])
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

// ===========================================================================
// validate
// ===========================================================================

#[test]
fn validate_writes_nothing() {
    let home = TempDir::new().unwrap();
    let out = faed(home.path())
        .args(["validate", "--json"])
        .arg(fixture("readme.csv"))
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let v = json(&out);
    assert_eq!(v["rows"], 4);
    assert_eq!(v["excluded"], 1);
    assert_eq!(v["class_counts"]["GN"], 3);
    assert_eq!(v["class_counts"]["PN"], 1);
    assert!(stderr(&out).contains("valid: 4 signalisations"));
    assert!(!home.path().join("data").exists());
}

#[test]
fn validate_rejects_empty_table() {
    let home = TempDir::new().unwrap();
    let input = write_input(&home, "empty.csv", "");
    let out = faed(home.path()).arg("validate").arg(&input).output().unwrap();
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("input table is empty"));
}
