//! CLI definitions using clap.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use clap::Parser;

/// launchpad - decides how a native launcher should start its runtime
///
/// The first argument is the path of the calling launcher; everything
/// after it is what the user typed. A single `-` reads the same argument
/// vector from stdin instead: a count line, then one argument per line.
#[derive(Parser, Debug)]
#[command(name = "launchpad")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Launcher path followed by the user's arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub argv: Vec<String>,
}

impl Cli {
    /// The effective argument vector, reading stdin for `-`.
    pub fn argument_vector(self, stdin: impl BufRead) -> Result<Vec<String>> {
        if self.argv.len() == 1 && self.argv[0] == "-" {
            return read_argument_vector(stdin);
        }
        if self.argv.is_empty() {
            bail!("missing launcher path argument");
        }
        Ok(self.argv)
    }
}

/// Read a count line followed by that many argument lines.
pub fn read_argument_vector(input: impl BufRead) -> Result<Vec<String>> {
    let mut lines = input.lines();
    let count_line = lines
        .next()
        .context("expected an argument count on stdin")??;
    let count: usize = count_line
        .trim()
        .parse()
        .with_context(|| format!("invalid argument count `{}`", count_line.trim()))?;

    let mut argv = Vec::with_capacity(count);
    for i in 0..count {
        let line = lines
            .next()
            .with_context(|| format!("expected {} arguments on stdin, got {}", count, i))??;
        argv.push(line);
    }
    if argv.is_empty() {
        bail!("argument vector read from stdin is empty");
    }
    Ok(argv)
}
