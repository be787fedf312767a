//! Locating and layering config files.
//!
//! Files live in a config directory next to the executable. They are
//! loaded from least to most specific and merged so that the more
//! specific file is always the overlay.

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::util::errors::LaunchResult;
use crate::util::host::Host;
use crate::util::platform::Platform;

/// Config directory names searched beneath the app directory, in order.
pub const CONFIG_DIR_CANDIDATES: &[&str] = &[
    "launchpad",
    ".launchpad",
    "config/launchpad",
    ".config/launchpad",
];

/// Base name shared by all config files.
pub const CONFIG_BASE_NAME: &str = "launchpad";

/// Where the launcher lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub executable: PathBuf,
    pub app_dir: PathBuf,
    pub config_dir: Option<PathBuf>,
}

impl AppPaths {
    /// Derive the app and config directories from the executable path.
    ///
    /// An executable inside `<Name>.app/Contents/MacOS/` belongs to the
    /// bundle, so the app directory is the `.app` itself.
    pub fn discover(host: &dyn Host, executable: &Path) -> Self {
        let exe_dir = executable
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let app_dir = bundle_root(exe_dir).unwrap_or(exe_dir).to_path_buf();

        let config_dir = CONFIG_DIR_CANDIDATES
            .iter()
            .map(|candidate| app_dir.join(candidate))
            .find(|dir| host.is_dir(dir));
        match config_dir {
            Some(ref dir) => tracing::debug!("config directory: {}", dir.display()),
            None => tracing::debug!("no config directory beneath {}", app_dir.display()),
        }

        AppPaths {
            executable: executable.to_path_buf(),
            app_dir,
            config_dir,
        }
    }

    /// Executable file name without a `.exe` extension.
    pub fn executable_stem(&self) -> String {
        let name = self
            .executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lowered = name.to_ascii_lowercase();
        match lowered.strip_suffix(".exe") {
            Some(stem) => name[..stem.len()].to_string(),
            None => name,
        }
    }
}

fn bundle_root(exe_dir: &Path) -> Option<&Path> {
    if exe_dir.file_name()? != "MacOS" {
        return None;
    }
    let contents = exe_dir.parent()?;
    if contents.file_name()? != "Contents" {
        return None;
    }
    let bundle = contents.parent()?;
    bundle
        .extension()
        .is_some_and(|ext| ext == "app")
        .then_some(bundle)
}

/// Config file names from least to most specific, without duplicates.
///
/// `fiji-linux-x64` yields `fiji.toml`, `fiji-linux.toml` and
/// `fiji-linux-x64.toml` after the `launchpad*.toml` platform files.
pub fn config_file_names(stem: &str, platform: Platform) -> Vec<String> {
    let os = platform.os.file_token();
    let arch = platform.arch.file_token();
    let mut names = vec![
        format!("{}.toml", CONFIG_BASE_NAME),
        format!("{}-{}.toml", CONFIG_BASE_NAME, os),
        format!("{}-{}-{}.toml", CONFIG_BASE_NAME, os, arch),
    ];

    let mut stems = vec![stem];
    let mut current = stem;
    while let Some((shorter, _)) = current.rsplit_once('-') {
        if shorter.is_empty() {
            break;
        }
        stems.push(shorter);
        current = shorter;
    }
    names.extend(stems.iter().rev().map(|s| format!("{}.toml", s)));

    let mut seen = Vec::new();
    names.retain(|name| {
        if seen.contains(name) {
            false
        } else {
            seen.push(name.clone());
            true
        }
    });
    names
}

/// Load and merge every config file that exists for this launcher.
pub fn load_config(host: &dyn Host, paths: &AppPaths) -> LaunchResult<Config> {
    let Some(ref dir) = paths.config_dir else {
        return Ok(Config::default());
    };

    let mut merged = Config::default();
    for name in config_file_names(&paths.executable_stem(), host.platform()) {
        let path = dir.join(&name);
        if !host.is_file(&path) {
            continue;
        }
        merged = Config::merge(merged, Config::load(host, &path))?;
    }
    Ok(merged)
}
