//! Runtime installation discovery.
//!
//! [`discover`] walks candidate roots in order and returns the first
//! [`Installation`] that satisfies the [`Constraints`]. How a particular
//! runtime kind exposes its metadata (manifest file, property names, how
//! to ask the binary about itself) is described by a [`Probe`].

pub mod aliases;
pub mod installation;
pub mod version;

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::util::host::Host;
use crate::util::platform::Platform;

pub use aliases::AliasTable;
pub use installation::Installation;

/// A piece of installation metadata looked up by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Version,
    Distro,
    Os,
    Arch,
}

/// Where a runtime kind keeps its metadata.
pub trait Probe {
    /// Short runtime name, used in logs.
    fn name(&self) -> &'static str;

    /// Manifest side file relative to the root.
    fn manifest_file(&self) -> &'static str;

    /// Manifest keys holding `field`, most preferred first.
    fn manifest_keys(&self, field: Field) -> &'static [&'static str];

    /// Self-reported property names holding `field`, most preferred first.
    fn property_keys(&self, field: Field) -> &'static [&'static str];

    /// Property whose raw value is the distribution of last resort.
    fn vendor_property(&self) -> &'static str;

    /// Runtime executables relative to the root, in lookup order.
    fn binary_candidates(&self, platform: Platform) -> Vec<String>;

    /// Arguments that make the binary report its properties.
    fn probe_args(&self) -> Vec<String>;

    /// Parse the binary's report into properties.
    fn parse_properties(&self, lines: &[String]) -> HashMap<String, String>;

    /// Version guessed from the root's directory name.
    fn guess_version(&self, dir_name: &str) -> Option<String>;
}

/// Requirements a candidate must meet to be chosen.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Library path suffixes relative to the root; globs allowed
    pub lib_suffixes: Vec<String>,
    /// Accept installations whose OS, arch or version cannot be determined
    pub allow_weird: bool,
    pub version_min: Option<String>,
    pub version_max: Option<String>,
    pub distros_allowed: AliasTable,
    pub distros_blocked: AliasTable,
    /// Allowed and blocked entries together, for naming the distribution
    pub distro_aliases: AliasTable,
    pub os_aliases: AliasTable,
    pub arch_aliases: AliasTable,
}

/// Return the first conforming installation among `roots`.
///
/// Candidates after the first match are never examined.
pub fn discover(
    host: &dyn Host,
    roots: &[PathBuf],
    constraints: Rc<Constraints>,
    probe: &'static dyn Probe,
) -> Option<Installation> {
    for root in roots {
        tracing::debug!("checking {} candidate {}", probe.name(), root.display());
        let installation = Installation::new(root.clone(), probe, Rc::clone(&constraints));
        if installation.conforms(host) {
            tracing::info!(
                "using {} installation at {}",
                probe.name(),
                installation.root().display()
            );
            return Some(installation);
        }
    }
    tracing::debug!("no conforming {} installation among {} candidates", probe.name(), roots.len());
    None
}
