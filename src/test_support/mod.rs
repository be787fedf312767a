//! Test utilities and mocks for launchpad unit tests.
//!
//! [`MockHost`] is an in-memory [`Host`]: files, directories, canned
//! process output, environment and memory are all set up by the test.
//! [`StubBackend`] is a runtime backend that only recognizes arguments.
//!
//! # Example
//!
//! ```rust,ignore
//! use launchpad::test_support::{JdkFixture, MockHost};
//!
//! #[test]
//! fn test_example() {
//!     let mut host = MockHost::new();
//!     JdkFixture::new("/opt/jdk-17-linux-x64")
//!         .release("IMPLEMENTOR=\"Eclipse Adoptium\"")
//!         .install(&mut host);
//!
//!     // Hand `&host` to the code under test...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};

use crate::core::config::Config;
use crate::core::router::RoutedArgs;
use crate::core::rules::Context;
use crate::runtime::{InstallInfo, LaunchPlan, RuntimeBackend};
use crate::util::errors::LaunchResult;
use crate::util::host::Host;
use crate::util::platform::{Arch, Os, Platform};

pub use fixtures::*;

/// Canned result of running a program.
#[derive(Debug, Clone, Default)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    /// A successful run printing `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A successful run printing only to stderr, as `java -version` does.
    pub fn stderr(stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// A failed run.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// In-memory [`Host`].
///
/// Defaults to a Linux x64 machine with no home directory, no environment
/// and unknown memory. Every `run` is recorded, matched or not.
#[derive(Debug)]
pub struct MockHost {
    files: HashMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    outputs: HashMap<PathBuf, MockProcessOutput>,
    calls: RefCell<Vec<String>>,
    env: HashMap<String, String>,
    home: Option<PathBuf>,
    memory: Option<u64>,
    platform: Platform,
}

impl Default for MockHost {
    fn default() -> Self {
        MockHost::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        MockHost {
            files: HashMap::new(),
            dirs: BTreeSet::new(),
            outputs: HashMap::new(),
            calls: RefCell::new(Vec::new()),
            env: HashMap::new(),
            home: None,
            memory: None,
            platform: Platform::new(Os::Linux, Arch::X64),
        }
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add a directory and all its ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Output returned when `program` is run, whatever the arguments.
    pub fn expect_run(&mut self, program: impl AsRef<Path>, output: MockProcessOutput) {
        self.outputs.insert(program.as_ref().to_path_buf(), output);
    }

    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.insert(key.to_string(), value.to_string());
    }

    pub fn set_home(&mut self, home: impl Into<PathBuf>) {
        self.home = Some(home.into());
    }

    pub fn set_memory(&mut self, bytes: u64) {
        self.memory = Some(bytes);
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Every command run so far, as `program arg...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Host for MockHost {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        self.files
            .get(path)
            .map(|content| content.lines().map(str::to_string).collect())
            .ok_or_else(|| anyhow!("file not found: {}", path.display()))
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let Ok(pattern) = glob::Pattern::new(pattern) else {
            return Vec::new();
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..glob::MatchOptions::new()
        };

        let mut matches: Vec<PathBuf> = self
            .files
            .keys()
            .chain(self.dirs.iter())
            .filter(|p| pattern.matches_path_with(p, options))
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();
        matches
    }

    fn run(&self, program: &Path, args: &[String]) -> Result<Vec<String>> {
        let mut command = program.display().to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        self.calls.borrow_mut().push(command.clone());

        let Some(output) = self.outputs.get(program) else {
            bail!("unexpected command: {}", command);
        };
        if output.status != 0 {
            bail!("command `{}` exited with status {}", command, output.status);
        }
        Ok(output
            .stdout
            .lines()
            .chain(output.stderr.lines())
            .map(str::to_string)
            .collect())
    }

    fn env_vars(&self) -> HashMap<String, String> {
        self.env.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn total_memory(&self) -> Option<u64> {
        self.memory
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

/// Backend that recognizes arguments by pattern and does nothing else.
#[derive(Debug, Default)]
pub struct StubBackend {
    patterns: Vec<String>,
}

impl StubBackend {
    pub fn with_patterns(patterns: &[&str]) -> Self {
        StubBackend {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl RuntimeBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn recognized_patterns(&self) -> &[String] {
        &self.patterns
    }

    fn configure(
        &mut self,
        _host: &dyn Host,
        _config: &Config,
        _ctx: &mut Context,
        _routed: &RoutedArgs,
    ) -> LaunchResult<()> {
        Ok(())
    }

    fn launch(&self) -> LaunchResult<LaunchPlan> {
        Ok(LaunchPlan::default())
    }

    fn try_directive(&self, _name: &str, _out: &mut dyn Write) -> LaunchResult<bool> {
        Ok(false)
    }

    fn installation(&self) -> Option<&InstallInfo> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_host_glob() {
        let mut host = MockHost::new();
        host.add_file("/opt/jvm/jdk-17/lib/server/libjvm.so", "");
        host.add_dir("/opt/jvm/jdk-21");

        let found = host.glob("/opt/jvm/*");
        assert_eq!(
            found,
            vec![PathBuf::from("/opt/jvm/jdk-17"), PathBuf::from("/opt/jvm/jdk-21")]
        );
        assert!(host.is_dir(Path::new("/opt/jvm/jdk-17/lib/server")));
    }

    #[test]
    fn test_mock_host_run() {
        let mut host = MockHost::new();
        host.expect_run("/bin/tool", MockProcessOutput::stderr("a = 1\nb = 2"));
        host.expect_run("/bin/broken", MockProcessOutput::failure(1, "boom"));

        let lines = host.run(Path::new("/bin/tool"), &["-v".to_string()]).unwrap();
        assert_eq!(lines, vec!["a = 1", "b = 2"]);
        assert!(host.run(Path::new("/bin/broken"), &[]).is_err());
        assert!(host.run(Path::new("/bin/missing"), &[]).is_err());
        assert_eq!(host.calls(), vec!["/bin/tool -v", "/bin/broken", "/bin/missing"]);
    }
}
