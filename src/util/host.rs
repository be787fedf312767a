//! Host capabilities consumed by the engine.
//!
//! Everything that touches the operating system (files, directory
//! matching, subprocesses, environment, memory) goes through [`Host`], so
//! the heuristics can run against an in-memory fake in tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::platform::Platform;
use super::process::ProcessBuilder;

/// Read-only view of the machine the launcher runs on.
pub trait Host {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Read a text file as lines.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>>;

    /// Expand a glob pattern into matching paths, sorted.
    fn glob(&self, pattern: &str) -> Vec<PathBuf>;

    /// Run a program and capture its output lines.
    fn run(&self, program: &Path, args: &[String]) -> Result<Vec<String>>;

    /// Snapshot of the process environment.
    fn env_vars(&self) -> HashMap<String, String>;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Total physical memory in bytes, if it can be determined.
    fn total_memory(&self) -> Option<u64>;

    /// The running platform.
    fn platform(&self) -> Platform;
}

/// Whether a string contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// [`Host`] backed by the real operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealHost;

impl RealHost {
    pub fn new() -> Self {
        RealHost
    }
}

impl Host for RealHost {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("invalid glob pattern `{}`: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => results.push(path),
                Err(e) => tracing::debug!("glob error: {}", e),
            }
        }
        results.sort();
        results
    }

    fn run(&self, program: &Path, args: &[String]) -> Result<Vec<String>> {
        ProcessBuilder::new(program).args(args).output_lines()
    }

    fn env_vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf())
    }

    fn total_memory(&self) -> Option<u64> {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        match sys.total_memory() {
            0 => None,
            total => Some(total),
        }
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }
}
