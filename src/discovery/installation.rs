//! A candidate runtime installation and its derived metadata.
//!
//! Every derived field is computed on first access and cached. Evidence is
//! gathered cheapest first: the directory name, then the manifest side
//! file, then (only when both miss) the runtime binary's self-report.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::util::host::{is_glob, Host};

use super::version::version_out_of_bounds;
use super::{Constraints, Field, Probe};

/// One filesystem root believed to contain a runtime.
pub struct Installation {
    root: PathBuf,
    probe: &'static dyn Probe,
    constraints: Rc<Constraints>,
    lib_path: OnceCell<Option<PathBuf>>,
    binary: OnceCell<Option<PathBuf>>,
    manifest: OnceCell<Option<HashMap<String, String>>>,
    properties: OnceCell<Option<HashMap<String, String>>>,
    version: OnceCell<Option<String>>,
    distro: OnceCell<Option<String>>,
    os_name: OnceCell<Option<String>>,
    cpu_arch: OnceCell<Option<String>>,
    conforms: OnceCell<bool>,
}

impl std::fmt::Debug for Installation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installation")
            .field("runtime", &self.probe.name())
            .field("root", &self.root)
            .field("lib_path", &self.lib_path.get())
            .field("version", &self.version.get())
            .finish_non_exhaustive()
    }
}

impl Installation {
    pub fn new(root: PathBuf, probe: &'static dyn Probe, constraints: Rc<Constraints>) -> Self {
        Installation {
            root,
            probe,
            constraints,
            lib_path: OnceCell::new(),
            binary: OnceCell::new(),
            manifest: OnceCell::new(),
            properties: OnceCell::new(),
            version: OnceCell::new(),
            distro: OnceCell::new(),
            os_name: OnceCell::new(),
            cpu_arch: OnceCell::new(),
            conforms: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// First existing `root/<suffix>` among the configured suffixes.
    pub fn lib_path(&self, host: &dyn Host) -> Option<&Path> {
        self.lib_path
            .get_or_init(|| {
                let found = first_existing(host, &self.root, &self.constraints.lib_suffixes);
                match &found {
                    Some(path) => tracing::debug!("{}: library {}", self.root.display(), path.display()),
                    None => tracing::debug!("{}: no library found", self.root.display()),
                }
                found
            })
            .as_deref()
    }

    /// The runtime's executable beneath the root.
    pub fn binary(&self, host: &dyn Host) -> Option<&Path> {
        self.binary
            .get_or_init(|| {
                let candidates = self.probe.binary_candidates(host.platform());
                first_existing(host, &self.root, &candidates)
            })
            .as_deref()
    }

    /// Key/value pairs from the manifest side file.
    pub fn manifest(&self, host: &dyn Host) -> Option<&HashMap<String, String>> {
        self.manifest
            .get_or_init(|| {
                let path = self.root.join(self.probe.manifest_file());
                if !host.is_file(&path) {
                    return None;
                }
                match host.read_lines(&path) {
                    Ok(lines) => Some(parse_manifest(&lines)),
                    Err(e) => {
                        tracing::debug!("unreadable manifest {}: {:#}", path.display(), e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Properties reported by running the runtime binary.
    ///
    /// This is the expensive tier; it only runs when a cheaper one missed.
    pub fn properties(&self, host: &dyn Host) -> Option<&HashMap<String, String>> {
        self.properties
            .get_or_init(|| {
                let binary = self.binary(host)?.to_path_buf();
                tracing::debug!("probing {}", binary.display());
                match host.run(&binary, &self.probe.probe_args()) {
                    Ok(lines) => Some(self.probe.parse_properties(&lines)),
                    Err(e) => {
                        tracing::debug!("probe of {} failed: {:#}", binary.display(), e);
                        None
                    }
                }
            })
            .as_ref()
    }

    fn manifest_value(&self, host: &dyn Host, field: Field) -> Option<String> {
        let manifest = self.manifest(host)?;
        self.probe
            .manifest_keys(field)
            .iter()
            .find_map(|key| manifest.get(*key).filter(|v| !v.is_empty()).cloned())
    }

    fn property_values(&self, host: &dyn Host, field: Field) -> Vec<String> {
        let Some(props) = self.properties(host) else {
            return Vec::new();
        };
        self.probe
            .property_keys(field)
            .iter()
            .filter_map(|key| props.get(*key).filter(|v| !v.is_empty()).cloned())
            .collect()
    }

    /// Version: directory name, then manifest, then self-report.
    pub fn version(&self, host: &dyn Host) -> Option<&str> {
        self.version
            .get_or_init(|| {
                self.probe
                    .guess_version(&self.dir_name())
                    .or_else(|| self.manifest_value(host, Field::Version))
                    .or_else(|| self.property_values(host, Field::Version).into_iter().next())
            })
            .as_deref()
    }

    /// Distribution, resolved through the distro alias table.
    ///
    /// Falls back to the raw vendor property when no alias matches.
    pub fn distro(&self, host: &dyn Host) -> Option<&str> {
        self.distro
            .get_or_init(|| {
                let table = &self.constraints.distro_aliases;
                if let Some(name) = table.resolve(&self.dir_name()) {
                    return Some(name.to_string());
                }
                if let Some(manifest) = self.manifest(host) {
                    for key in self.probe.manifest_keys(Field::Distro) {
                        if let Some(name) = manifest.get(*key).and_then(|v| table.resolve(v)) {
                            return Some(name.to_string());
                        }
                    }
                }
                let values = self.property_values(host, Field::Distro);
                for value in &values {
                    if let Some(name) = table.resolve(value) {
                        return Some(name.to_string());
                    }
                }
                self.properties(host)
                    .and_then(|props| props.get(self.probe.vendor_property()))
                    .filter(|v| !v.is_empty())
                    .cloned()
            })
            .as_deref()
    }

    /// Canonical OS name.
    pub fn os_name(&self, host: &dyn Host) -> Option<&str> {
        self.os_name
            .get_or_init(|| self.resolve_alias(host, Field::Os))
            .as_deref()
    }

    /// Canonical CPU architecture.
    pub fn cpu_arch(&self, host: &dyn Host) -> Option<&str> {
        self.cpu_arch
            .get_or_init(|| self.resolve_alias(host, Field::Arch))
            .as_deref()
    }

    fn resolve_alias(&self, host: &dyn Host, field: Field) -> Option<String> {
        let table = match field {
            Field::Os => &self.constraints.os_aliases,
            _ => &self.constraints.arch_aliases,
        };
        if let Some(name) = table.resolve(&self.dir_name()) {
            return Some(name.to_string());
        }
        if let Some(name) = self
            .manifest_value(host, field)
            .and_then(|v| table.resolve(&v).map(str::to_string))
        {
            return Some(name);
        }
        self.property_values(host, field)
            .iter()
            .find_map(|v| table.resolve(v).map(str::to_string))
    }

    /// Whether this installation satisfies the constraints.
    pub fn conforms(&self, host: &dyn Host) -> bool {
        *self.conforms.get_or_init(|| self.check_constraints(host))
    }

    fn check_constraints(&self, host: &dyn Host) -> bool {
        let c = &self.constraints;
        let strict = !c.allow_weird;
        let root = self.root.display();
        let platform = host.platform();

        if self.lib_path(host).is_none() {
            tracing::debug!("{}: rejected, no library path", root);
            return false;
        }

        match self.os_name(host) {
            None if strict => {
                tracing::debug!("{}: rejected, unknown OS", root);
                return false;
            }
            Some(os) if os != platform.os.canonical() => {
                tracing::debug!("{}: rejected, OS {} does not match {}", root, os, platform.os.canonical());
                return false;
            }
            _ => {}
        }

        match self.cpu_arch(host) {
            None if strict => {
                tracing::debug!("{}: rejected, unknown architecture", root);
                return false;
            }
            Some(arch) if arch != platform.arch.canonical() => {
                tracing::debug!(
                    "{}: rejected, architecture {} does not match {}",
                    root,
                    arch,
                    platform.arch.canonical()
                );
                return false;
            }
            _ => {}
        }

        if c.version_min.is_some() || c.version_max.is_some() {
            match self.version(host) {
                None if strict => {
                    tracing::debug!("{}: rejected, unknown version", root);
                    return false;
                }
                Some(v) if version_out_of_bounds(v, c.version_min.as_deref(), c.version_max.as_deref()) => {
                    tracing::debug!(
                        "{}: rejected, version {} outside [{}, {}]",
                        root,
                        v,
                        c.version_min.as_deref().unwrap_or("*"),
                        c.version_max.as_deref().unwrap_or("*")
                    );
                    return false;
                }
                _ => {}
            }
        }

        if !c.distros_blocked.is_empty() {
            if let Some(distro) = self.distro(host) {
                if c.distros_blocked.matches(distro) {
                    tracing::debug!("{}: rejected, distribution {} is blocked", root, distro);
                    return false;
                }
            }
        }

        if strict && !c.distros_allowed.is_empty() {
            let allowed = self
                .distro(host)
                .is_some_and(|distro| c.distros_allowed.matches(distro));
            if !allowed {
                tracing::debug!(
                    "{}: rejected, distribution {} is not allowed",
                    root,
                    self.distro(host).unwrap_or("<unknown>")
                );
                return false;
            }
        }

        true
    }
}

/// Parse `KEY=value` manifest lines, stripping optional quotes.
pub fn parse_manifest(lines: &[String]) -> HashMap<String, String> {
    lines
        .iter()
        .filter(|l| !l.trim_start().starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// First `root/<suffix>` that exists as a file; suffixes may be globs.
fn first_existing<S: AsRef<str>>(host: &dyn Host, root: &Path, suffixes: &[S]) -> Option<PathBuf> {
    for suffix in suffixes {
        let suffix = suffix.as_ref();
        let candidate = root.join(suffix);
        if is_glob(suffix) {
            if let Some(found) = host
                .glob(&candidate.to_string_lossy())
                .into_iter()
                .find(|p| host.is_file(p))
            {
                return Some(found);
            }
        } else if host.is_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}
