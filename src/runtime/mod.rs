//! Runtime backends.
//!
//! A backend turns the merged config, the resolved hints and the routed
//! arguments into a launch plan for one kind of managed runtime. The
//! router and the pipeline only ever talk to `dyn RuntimeBackend`.

pub mod heap;
pub mod jvm;
pub mod python;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::core::config::{Config, RuntimeConfig};
use crate::core::router::RoutedArgs;
use crate::core::rules::Context;
use crate::discovery::aliases::{AliasTable, DEFAULT_ARCH_ALIASES, DEFAULT_OS_ALIASES};
use crate::discovery::version::version_components;
use crate::discovery::{self, Constraints, Installation, Probe};
use crate::util::errors::{LaunchError, LaunchResult};
use crate::util::host::{is_glob, Host};

pub use jvm::JvmBackend;
pub use python::PythonBackend;

/// Highest number in a `<PREFIX>:<n>+` hint family.
pub const MAX_VERSION_HINT: u64 = 100;

/// Everything the caller needs to start the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Native library to load
    pub lib_path: String,
    pub runtime_args: Vec<String>,
    /// Entry point; may be empty when the runtime has none configured
    pub main_program: String,
    pub main_args: Vec<String>,
}

/// One kind of managed runtime.
pub trait RuntimeBackend {
    /// Config prefix and variable namespace (`jvm`, `python`).
    fn name(&self) -> &'static str;

    /// Declared recognized-argument patterns.
    fn recognized_patterns(&self) -> &[String];

    /// How many tokens `arg` consumes as a runtime argument, 0 if none.
    fn recognizes(&self, arg: &str) -> usize {
        self.recognized_patterns()
            .iter()
            .map(|pattern| pattern_arity(pattern, arg))
            .find(|&n| n > 0)
            .unwrap_or(0)
    }

    /// Discover an installation and compute the final argument lists.
    fn configure(
        &mut self,
        host: &dyn Host,
        config: &Config,
        ctx: &mut Context,
        routed: &RoutedArgs,
    ) -> LaunchResult<()>;

    /// Assemble the launch plan. Only valid after [`configure`](Self::configure).
    fn launch(&self) -> LaunchResult<LaunchPlan>;

    /// Run a diagnostic directive; `Ok(false)` if the name is not ours.
    fn try_directive(&self, name: &str, out: &mut dyn Write) -> LaunchResult<bool>;

    /// The discovered installation, once configured.
    fn installation(&self) -> Option<&InstallInfo>;
}

/// Match one pattern against one argument.
///
/// A pattern is one or more whitespace-separated tokens. The first token
/// is the flag, matched exactly or, when it ends in `*`, as a prefix. The
/// remaining tokens declare how many following arguments the flag takes:
/// a single numeric token gives the count, otherwise each token counts
/// as one.
pub fn pattern_arity(pattern: &str, arg: &str) -> usize {
    let mut tokens = pattern.split_whitespace();
    let Some(flag) = tokens.next() else {
        return 0;
    };

    let matched = match flag.strip_suffix('*') {
        Some(prefix) => arg.starts_with(prefix),
        None => arg == flag,
    };
    if !matched {
        return 0;
    }

    let rest: Vec<&str> = tokens.collect();
    let extra = match rest.as_slice() {
        [n] => n.parse().unwrap_or(1),
        other => other.len(),
    };
    1 + extra
}

/// Pick the backend for this config.
///
/// The first of `jvm`, `python` explicitly enabled wins; the JVM is the
/// default. Recognized-argument patterns are calculated against `ctx`.
pub fn select_backend(config: &Config, ctx: &Context) -> Box<dyn RuntimeBackend> {
    if config.jvm.enabled != Some(true) && config.python.enabled == Some(true) {
        let patterns = ctx.calculate(&config.python.recognized_args);
        tracing::debug!("selected python backend");
        return Box::new(PythonBackend::new(patterns));
    }
    let patterns = ctx.calculate(&config.jvm.recognized_args);
    tracing::debug!("selected jvm backend");
    Box::new(JvmBackend::new(patterns))
}

/// Snapshot of a discovered installation's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallInfo {
    pub root: PathBuf,
    pub lib_path: PathBuf,
    pub binary: Option<PathBuf>,
    pub version: Option<String>,
    pub distro: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl InstallInfo {
    fn from_installation(host: &dyn Host, inst: &Installation) -> Option<Self> {
        Some(InstallInfo {
            root: inst.root().to_path_buf(),
            lib_path: inst.lib_path(host)?.to_path_buf(),
            binary: inst.binary(host).map(Path::to_path_buf),
            version: inst.version(host).map(str::to_string),
            distro: inst.distro(host).map(str::to_string),
            os: inst.os_name(host).map(str::to_string),
            arch: inst.cpu_arch(host).map(str::to_string),
        })
    }

    /// Set `<prefix>.<field>` for every known field.
    pub fn inject(&self, prefix: &str, ctx: &mut Context) {
        let vars = &mut ctx.vars;
        vars.set(format!("{}.root", prefix), self.root.to_string_lossy());
        vars.set(format!("{}.lib-path", prefix), self.lib_path.to_string_lossy());
        if let Some(ref binary) = self.binary {
            vars.set(format!("{}.binary", prefix), binary.to_string_lossy());
        }
        let fields = [
            ("version", &self.version),
            ("distro", &self.distro),
            ("os", &self.os),
            ("arch", &self.arch),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                vars.set(format!("{}.{}", prefix, field), value.as_str());
            }
        }
    }

    /// Human-readable metadata dump.
    pub fn describe(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let unknown = "<unknown>";
        writeln!(out, "root: {}", self.root.display())?;
        writeln!(out, "library: {}", self.lib_path.display())?;
        match self.binary {
            Some(ref binary) => writeln!(out, "binary: {}", binary.display())?,
            None => writeln!(out, "binary: {}", unknown)?,
        }
        writeln!(out, "version: {}", self.version.as_deref().unwrap_or(unknown))?;
        writeln!(out, "distribution: {}", self.distro.as_deref().unwrap_or(unknown))?;
        writeln!(out, "os: {}", self.os.as_deref().unwrap_or(unknown))?;
        writeln!(out, "arch: {}", self.arch.as_deref().unwrap_or(unknown))
    }
}

/// Resolve root paths, build constraints and run discovery.
///
/// Injects the installation's variables into `ctx` on success.
pub(crate) fn discover_installation(
    host: &dyn Host,
    name: &str,
    rt: &RuntimeConfig,
    ctx: &mut Context,
    probe: &'static dyn Probe,
    default_suffixes: &[&str],
) -> LaunchResult<InstallInfo> {
    let roots = resolve_roots(host, &ctx.calculate(&rt.root_paths));
    let constraints = Rc::new(build_constraints(rt, ctx, default_suffixes));

    let found = discovery::discover(host, &roots, constraints, probe)
        .and_then(|inst| InstallInfo::from_installation(host, &inst));
    let Some(info) = found else {
        return Err(LaunchError::NoInstallation {
            runtime: name.to_string(),
            candidates: roots.len(),
        });
    };

    info.inject(name, ctx);
    Ok(info)
}

fn build_constraints(rt: &RuntimeConfig, ctx: &Context, default_suffixes: &[&str]) -> Constraints {
    let mut lib_suffixes = ctx.calculate(&rt.lib_suffixes);
    if lib_suffixes.is_empty() {
        lib_suffixes = default_suffixes.iter().map(|s| s.to_string()).collect();
    }

    let distros_allowed = AliasTable::parse(&ctx.calculate(&rt.distros_allowed));
    let distros_blocked = AliasTable::parse(&ctx.calculate(&rt.distros_blocked));
    let distro_aliases = distros_allowed.clone().chain(&distros_blocked);

    Constraints {
        lib_suffixes,
        allow_weird: rt.allow_weird_runtimes.unwrap_or(false),
        version_min: rt.version_min.as_deref().and_then(|v| ctx.evaluate(v)),
        version_max: rt.version_max.as_deref().and_then(|v| ctx.evaluate(v)),
        distros_allowed,
        distros_blocked,
        distro_aliases,
        os_aliases: AliasTable::parse_or_default(&ctx.calculate(&rt.os_aliases), DEFAULT_OS_ALIASES),
        arch_aliases: AliasTable::parse_or_default(
            &ctx.calculate(&rt.arch_aliases),
            DEFAULT_ARCH_ALIASES,
        ),
    }
}

/// Expand `~` and globs, keeping existing directories in order.
pub fn resolve_roots(host: &dyn Host, paths: &[String]) -> Vec<PathBuf> {
    let home = host.home_dir();
    let mut roots: Vec<PathBuf> = Vec::new();
    for path in paths {
        let expanded = expand_tilde(path, home.as_deref());
        let candidates = if is_glob(&expanded) {
            host.glob(&expanded)
        } else {
            vec![PathBuf::from(&expanded)]
        };
        for candidate in candidates {
            if host.is_dir(&candidate) && !roots.contains(&candidate) {
                roots.push(candidate);
            }
        }
    }
    roots
}

fn expand_tilde(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    if path == "~" {
        return home.to_string_lossy().into_owned();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest).to_string_lossy().into_owned(),
        None => path.to_string(),
    }
}

/// Expand glob entries, keeping literal entries as written.
pub fn expand_globs(host: &dyn Host, entries: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();
    for entry in entries {
        if is_glob(entry) {
            let matches = host.glob(entry);
            if matches.is_empty() {
                tracing::debug!("`{}` matched nothing", entry);
            }
            expanded.extend(matches.iter().map(|p| p.to_string_lossy().into_owned()));
        } else {
            expanded.push(entry.clone());
        }
    }
    expanded
}

/// `<prefix>:<major>` plus `<prefix>:0+` through `<prefix>:<major>+`.
pub fn major_version_hints(prefix: &str, version: &str) -> Vec<String> {
    let Some(&major) = version_components(version).first() else {
        return Vec::new();
    };
    let mut hints = vec![format!("{}:{}", prefix, major)];
    hints.extend((0..=major.min(MAX_VERSION_HINT)).map(|n| format!("{}:{}+", prefix, n)));
    hints
}

/// Run a directive from a backend's static table.
pub(crate) fn dispatch_directive<B>(
    backend: &B,
    table: &[(&str, fn(&B, &mut dyn Write) -> LaunchResult<()>)],
    name: &str,
    out: &mut dyn Write,
) -> LaunchResult<bool> {
    match table.iter().find(|(directive, _)| *directive == name) {
        Some((_, handler)) => {
            tracing::debug!("running directive {}", name);
            handler(backend, out)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// The installation a directive needs, or a directive failure.
pub(crate) fn require_install<'a>(
    install: Option<&'a InstallInfo>,
    directive: &str,
) -> LaunchResult<&'a InstallInfo> {
    install.ok_or_else(|| LaunchError::DirectiveFailed {
        directive: directive.to_string(),
        reason: "no installation has been discovered".to_string(),
    })
}

/// Render a command line the way a POSIX shell would accept it.
pub fn shell_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) || part.contains(['"', '\'']) {
                format!("'{}'", part.replace('\'', "'\\''"))
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
