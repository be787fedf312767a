//! Launcher configuration.
//!
//! A [`Config`] is built from one file with [`Config::parse`] and several
//! files are layered with [`Config::merge`]. Scalars are right-biased (the
//! overlay wins when it sets a value) and lists concatenate with the
//! overlay's entries first, so more specific files are evaluated first.

use std::path::Path;

use crate::util::errors::{LaunchError, LaunchResult};
use crate::util::host::Host;

use super::parse::{assignments, Token};

/// Effective launcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Schema version (`launchpad-version`)
    pub schema_version: Option<i64>,

    /// Program name shown in help output
    pub program_name: Option<String>,

    /// Tolerate unrecognized runtime arguments before the divider
    pub allow_unrecognized_args: Option<bool>,

    /// Launcher option declarations (`--flag,--alias=<value>|Help text`)
    pub supported_options: Vec<String>,

    /// Mode rules applied once after argument routing
    pub modes: Vec<String>,

    /// Directive rules; each value is a comma-separated directive list
    pub directives: Vec<String>,

    /// JVM runtime settings (`jvm.*`)
    pub jvm: RuntimeConfig,

    /// Python runtime settings (`python.*`)
    pub python: RuntimeConfig,
}

/// Settings for one runtime kind.
///
/// `class_path` and `max_heap` are only read by the JVM backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub enabled: Option<bool>,
    pub allow_weird_runtimes: Option<bool>,
    pub version_min: Option<String>,
    pub version_max: Option<String>,
    pub max_heap: Option<String>,
    pub recognized_args: Vec<String>,
    pub root_paths: Vec<String>,
    pub lib_suffixes: Vec<String>,
    pub distros_allowed: Vec<String>,
    pub distros_blocked: Vec<String>,
    pub os_aliases: Vec<String>,
    pub arch_aliases: Vec<String>,
    pub class_path: Vec<String>,
    pub runtime_args: Vec<String>,
    /// Main class (JVM) or script path (Python) candidates
    pub main_program: Vec<String>,
    pub main_args: Vec<String>,
}

/// Why an assignment could not be applied.
enum Rejection {
    UnknownKey,
    WrongType(&'static str),
}

impl Config {
    /// Parse config text. Never fails; problems are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = Config::default();
        for assignment in assignments(content) {
            let description = assignment.value.describe();
            match config.assign(&assignment.key, assignment.value) {
                Ok(()) => {}
                Err(Rejection::UnknownKey) => {
                    tracing::warn!("ignoring unknown config key `{}`", assignment.key)
                }
                Err(Rejection::WrongType(expected)) => tracing::warn!(
                    "ignoring `{}`: expected {}, found {}",
                    assignment.key,
                    expected,
                    description
                ),
            }
        }
        config
    }

    /// Load a config file; a missing file yields the default config.
    ///
    /// Something other than a readable file at `path` is warned about.
    pub fn load(host: &dyn Host, path: &Path) -> Self {
        if !host.exists(path) {
            return Config::default();
        }
        match host.read_lines(path) {
            Ok(lines) => {
                tracing::debug!("loading config {}", path.display());
                Config::parse(&lines.join("\n"))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Config::default()
            }
        }
    }

    /// Layer `overlay` on top of `base`.
    ///
    /// Fails when both declare a schema version and they differ.
    pub fn merge(base: Config, overlay: Config) -> LaunchResult<Config> {
        if let (Some(b), Some(o)) = (base.schema_version, overlay.schema_version) {
            if b != o {
                return Err(LaunchError::IncompatibleVersion { base: b, overlay: o });
            }
        }

        Ok(Config {
            schema_version: overlay.schema_version.or(base.schema_version),
            program_name: overlay.program_name.or(base.program_name),
            allow_unrecognized_args: overlay
                .allow_unrecognized_args
                .or(base.allow_unrecognized_args),
            supported_options: join(overlay.supported_options, base.supported_options),
            modes: join(overlay.modes, base.modes),
            directives: join(overlay.directives, base.directives),
            jvm: RuntimeConfig::merge(base.jvm, overlay.jvm),
            python: RuntimeConfig::merge(base.python, overlay.python),
        })
    }

    fn assign(&mut self, key: &str, value: Token) -> Result<(), Rejection> {
        if let Some((prefix, field)) = key.split_once('.') {
            return match prefix {
                "jvm" => self.jvm.assign(field, value, "libjvm-suffixes", "main-class", true),
                "python" => self.python.assign(
                    field,
                    value,
                    "libpython-suffixes",
                    "script-path",
                    false,
                ),
                _ => Err(Rejection::UnknownKey),
            };
        }

        match key {
            "launchpad-version" => self.schema_version = Some(int(value)?),
            "program-name" => self.program_name = Some(string(value)?),
            "allow-unrecognized-args" => self.allow_unrecognized_args = Some(boolean(value)?),
            "supported-options" => self.supported_options = list(value)?,
            "modes" => self.modes = list(value)?,
            "directives" => self.directives = list(value)?,
            _ => return Err(Rejection::UnknownKey),
        }
        Ok(())
    }
}

impl RuntimeConfig {
    fn assign(
        &mut self,
        field: &str,
        value: Token,
        suffix_key: &str,
        main_key: &str,
        jvm: bool,
    ) -> Result<(), Rejection> {
        match field {
            "enabled" => self.enabled = Some(boolean(value)?),
            "allow-weird-runtimes" => self.allow_weird_runtimes = Some(boolean(value)?),
            "version-min" => self.version_min = Some(version(value)?),
            "version-max" => self.version_max = Some(version(value)?),
            "recognized-args" => self.recognized_args = list(value)?,
            "root-paths" => self.root_paths = list(value)?,
            "distros-allowed" => self.distros_allowed = list(value)?,
            "distros-blocked" => self.distros_blocked = list(value)?,
            "os-aliases" => self.os_aliases = list(value)?,
            "arch-aliases" => self.arch_aliases = list(value)?,
            "runtime-args" => self.runtime_args = list(value)?,
            "main-args" => self.main_args = list(value)?,
            "max-heap" if jvm => self.max_heap = Some(string(value)?),
            "classpath" if jvm => self.class_path = list(value)?,
            f if f == suffix_key => self.lib_suffixes = list(value)?,
            f if f == main_key => self.main_program = list(value)?,
            _ => return Err(Rejection::UnknownKey),
        }
        Ok(())
    }

    fn merge(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            enabled: overlay.enabled.or(base.enabled),
            allow_weird_runtimes: overlay.allow_weird_runtimes.or(base.allow_weird_runtimes),
            version_min: overlay.version_min.or(base.version_min),
            version_max: overlay.version_max.or(base.version_max),
            max_heap: overlay.max_heap.or(base.max_heap),
            recognized_args: join(overlay.recognized_args, base.recognized_args),
            root_paths: join(overlay.root_paths, base.root_paths),
            lib_suffixes: join(overlay.lib_suffixes, base.lib_suffixes),
            distros_allowed: join(overlay.distros_allowed, base.distros_allowed),
            distros_blocked: join(overlay.distros_blocked, base.distros_blocked),
            os_aliases: join(overlay.os_aliases, base.os_aliases),
            arch_aliases: join(overlay.arch_aliases, base.arch_aliases),
            class_path: join(overlay.class_path, base.class_path),
            runtime_args: join(overlay.runtime_args, base.runtime_args),
            main_program: join(overlay.main_program, base.main_program),
            main_args: join(overlay.main_args, base.main_args),
        }
    }
}

fn join(mut first: Vec<String>, second: Vec<String>) -> Vec<String> {
    first.extend(second);
    first
}

fn string(value: Token) -> Result<String, Rejection> {
    match value {
        Token::Str(s) => Ok(s),
        _ => Err(Rejection::WrongType("a string")),
    }
}

fn int(value: Token) -> Result<i64, Rejection> {
    match value {
        Token::Int(i) => Ok(i),
        _ => Err(Rejection::WrongType("an integer")),
    }
}

fn boolean(value: Token) -> Result<bool, Rejection> {
    match value {
        Token::Bool(b) => Ok(b),
        _ => Err(Rejection::WrongType("true or false")),
    }
}

fn list(value: Token) -> Result<Vec<String>, Rejection> {
    match value {
        Token::List(items) => Ok(items),
        _ => Err(Rejection::WrongType("a list of strings")),
    }
}

/// Versions may be written as strings or bare integers.
fn version(value: Token) -> Result<String, Rejection> {
    match value {
        Token::Str(s) => Ok(s),
        Token::Int(i) => Ok(i.to_string()),
        _ => Err(Rejection::WrongType("a version")),
    }
}
