#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Pinned "today" for every CLI invocation in the tests
pub const TODAY: &str = "2024-06-10";

pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("studylog.toml", contents)
    }

    pub fn read_file(&self, rel_path: &str) -> std::io::Result<String> {
        fs::read_to_string(self.dir.path().join(rel_path))
    }

    /// Command bound to this data directory with a pinned date
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("studylog").expect("binary");
        cmd.env_remove("STUDYLOG_DIR")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.dir.path())
            .arg("--today")
            .arg(TODAY);
        cmd
    }

    /// Run with `--json`, expect success, and return the whole envelope
    pub fn json_envelope(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output).expect("json envelope");
        assert_eq!(value["status"], "success");
        value
    }

    /// Run with `--json`, expect success, and return the `data` payload
    pub fn json(&self, args: &[&str]) -> Value {
        self.json_envelope(args)["data"].clone()
    }

    /// Run with `--json`, expect failure with `code`, and return the envelope
    pub fn json_error(&self, args: &[&str], code: i32) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output).expect("json error envelope");
        assert_eq!(value["status"], "error");
        value
    }
}
