//! Shared setup for the tutils integration tests.
//!
//! Every test gets its own data directory and config file so nothing
//! touches the real `~/.tutils` and no test reaches the network.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated data directory plus a config that disables the startup update check.
pub struct TestEnv {
    pub temp: TempDir,
    pub home: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("data");
        let config = temp.path().join("config.toml");
        fs::write(&config, "background_update_check = false\n").unwrap();
        Self {
            temp,
            home,
            config,
        }
    }

    /// `tutils` with this environment's config and data directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tutils").unwrap();
        cmd.env("TUTILS_HOME", &self.home)
            .env("NO_COLOR", "1")
            .env_remove("TUTILS_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    pub fn servers_file(&self) -> PathBuf {
        self.home.join("servers.txt")
    }

    pub fn write_servers(&self, content: &str) {
        fs::create_dir_all(&self.home).unwrap();
        fs::write(self.servers_file(), content).unwrap();
    }

    pub fn read_servers(&self) -> String {
        fs::read_to_string(self.servers_file()).unwrap()
    }

    /// A scratch directory for project files.
    pub fn project_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("project");
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}
