//! Subprocess execution for runtime self-reporting.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for a runtime probe subprocess.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Execute the command and wait for completion.
    ///
    /// There is no timeout: a runtime binary that hangs blocks the caller.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to run `{}`", self.display_command()))
    }

    /// Execute and return stdout lines followed by stderr lines.
    ///
    /// Some runtimes report their settings on stderr, so both streams count
    /// as output. A non-zero exit status is an error.
    pub fn output_lines(&self) -> Result<Vec<String>> {
        let output = self.exec()?;
        if !output.status.success() {
            bail!(
                "`{}` failed with exit code {:?}",
                self.display_command(),
                output.status.code()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(stdout
            .lines()
            .chain(stderr.lines())
            .map(str::to_string)
            .collect())
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}
