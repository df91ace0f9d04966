//! Common test utilities for lampkitctl integration tests

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Apache and hosts-file layout in a temp directory, plus a config file
/// pointing the binary at it
pub struct TestHost {
    pub temp: TempDir,
    pub config: PathBuf,
}

impl TestHost {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();
        for dir in ["apache2/sites-available", "apache2/sites-enabled", "www"] {
            fs::create_dir_all(root.join(dir)).expect("Failed to create layout directory");
        }
        fs::write(root.join("hosts"), "127.0.0.1 localhost\n").expect("Failed to write hosts");

        let config = root.join("config.yaml");
        let yaml = format!(
            "apache_dir: {root}/apache2\n\
             sites_available: {root}/apache2/sites-available\n\
             sites_enabled: {root}/apache2/sites-enabled\n\
             hosts_file: {root}/hosts\n\
             web_root: {root}/www\n\
             os_release: {root}/os-release\n",
            root = root.display()
        );
        fs::write(&config, yaml).expect("Failed to write config");
        Self { temp, config }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// Write a vhost file under sites-available
    pub fn add_vhost(&self, file: &str, content: &str) {
        fs::write(self.path("apache2/sites-available").join(file), content)
            .expect("Failed to write vhost");
    }

    /// The binary, configured for this layout and never prompting
    pub fn cmd(&self) -> Command {
        let mut cmd = lampkit_cmd();
        cmd.env("LAMPKIT_CONFIG", &self.config)
            .env("LAMPKIT_NON_INTERACTIVE", "true");
        cmd
    }
}

/// The binary with a clean lampkitctl environment
pub fn lampkit_cmd() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("lampkitctl").expect("binary is built");
    for var in [
        "LAMPKIT_CONFIG",
        "LAMPKIT_DRY_RUN",
        "LAMPKIT_NON_INTERACTIVE",
        "LAMPKIT_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}
