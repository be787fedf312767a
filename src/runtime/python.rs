//! Python interpreter backend.

use std::collections::HashMap;
use std::io::Write;

use crate::core::config::Config;
use crate::core::router::RoutedArgs;
use crate::core::rules::Context;
use crate::discovery::version::{guess_python_version, version_components};
use crate::discovery::{Field, Probe};
use crate::util::errors::{LaunchError, LaunchResult};
use crate::util::host::Host;
use crate::util::platform::{Os, Platform};

use super::{
    discover_installation, dispatch_directive, require_install, shell_join, InstallInfo,
    LaunchPlan, RuntimeBackend, MAX_VERSION_HINT,
};

/// One-line program printing the interpreter's metadata.
const PROBE_PROGRAM: &str = "import platform; \
print('version=' + platform.python_version()); \
print('implementation=' + platform.python_implementation()); \
print('os=' + platform.system()); \
print('arch=' + platform.machine())";

/// Metadata layout of a Python installation or virtual environment.
pub struct PythonProbe;

pub static PYTHON_PROBE: PythonProbe = PythonProbe;

impl Probe for PythonProbe {
    fn name(&self) -> &'static str {
        "python"
    }

    fn manifest_file(&self) -> &'static str {
        "pyvenv.cfg"
    }

    fn manifest_keys(&self, field: Field) -> &'static [&'static str] {
        match field {
            Field::Version => &["version", "version_info"],
            Field::Distro => &["implementation"],
            Field::Os | Field::Arch => &[],
        }
    }

    fn property_keys(&self, field: Field) -> &'static [&'static str] {
        match field {
            Field::Version => &["version"],
            Field::Distro => &["implementation"],
            Field::Os => &["os"],
            Field::Arch => &["arch"],
        }
    }

    fn vendor_property(&self) -> &'static str {
        "implementation"
    }

    /// Outside Windows `bin/` comes first: on case-insensitive filesystems
    /// a bare `python` can match a framework's `Python` library. Windows
    /// installations keep `python.exe` at the root.
    fn binary_candidates(&self, platform: Platform) -> Vec<String> {
        if platform.is_windows() {
            return ["python.exe", "python3.exe", "bin/python.exe", "bin/python3.exe"]
                .iter()
                .map(|name| name.to_string())
                .collect();
        }
        ["bin/python", "bin/python3", "python", "python3"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn probe_args(&self) -> Vec<String> {
        vec!["-c".to_string(), PROBE_PROGRAM.to_string()]
    }

    fn parse_properties(&self, lines: &[String]) -> HashMap<String, String> {
        lines
            .iter()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    fn guess_version(&self, dir_name: &str) -> Option<String> {
        guess_python_version(dir_name)
    }
}

/// Library locations relative to a Python root, per platform.
pub fn default_lib_suffixes(os: Os) -> &'static [&'static str] {
    match os {
        Os::Windows => &["python3?.dll", "python3??.dll", "python3.dll"],
        Os::MacOs => &["lib/libpython3.*.dylib", "Python", "Python3"],
        Os::Linux | Os::Other => &[
            "lib/libpython3.*.so*",
            "lib64/libpython3.*.so*",
            "lib/libpython3.so",
        ],
    }
}

/// `PYTHON:<major>`, `PYTHON:<major>.<minor>` and the `PYTHON:<major>.<n>+`
/// family up to the minor version.
pub fn python_version_hints(version: &str) -> Vec<String> {
    let components = version_components(version);
    let Some(&major) = components.first() else {
        return Vec::new();
    };
    let mut hints = vec![format!("PYTHON:{}", major)];
    if let Some(&minor) = components.get(1) {
        hints.push(format!("PYTHON:{}.{}", major, minor));
        hints.extend((0..=minor.min(MAX_VERSION_HINT)).map(|n| format!("PYTHON:{}.{}+", major, n)));
    }
    hints
}

type Directive = fn(&PythonBackend, &mut dyn Write) -> LaunchResult<()>;

/// Runs a script inside a discovered Python interpreter.
#[derive(Debug, Default)]
pub struct PythonBackend {
    recognized: Vec<String>,
    install: Option<InstallInfo>,
    runtime_args: Vec<String>,
    script: Option<String>,
    main_args: Vec<String>,
}

impl PythonBackend {
    const DIRECTIVES: &'static [(&'static str, Directive)] = &[
        ("dry-run", PythonBackend::dry_run),
        ("print-python-home", PythonBackend::print_python_home),
        ("print-python-info", PythonBackend::print_python_info),
    ];

    pub fn new(recognized: Vec<String>) -> Self {
        PythonBackend {
            recognized,
            ..PythonBackend::default()
        }
    }

    fn dry_run(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "dry-run")?;
        let interpreter = install
            .binary
            .as_ref()
            .map(|b| b.to_string_lossy().into_owned())
            .unwrap_or_else(|| "python".to_string());

        let parts = std::iter::once(interpreter.as_str())
            .chain(self.runtime_args.iter().map(String::as_str))
            .chain(self.script.as_deref())
            .chain(self.main_args.iter().map(String::as_str));
        writeln!(out, "{}", shell_join(parts))?;
        Ok(())
    }

    fn print_python_home(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "print-python-home")?;
        writeln!(out, "{}", install.root.display())?;
        Ok(())
    }

    fn print_python_info(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "print-python-info")?;
        install.describe(out)?;
        Ok(())
    }
}

impl RuntimeBackend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn recognized_patterns(&self) -> &[String] {
        &self.recognized
    }

    fn configure(
        &mut self,
        host: &dyn Host,
        config: &Config,
        ctx: &mut Context,
        routed: &RoutedArgs,
    ) -> LaunchResult<()> {
        let rt = &config.python;
        let install = discover_installation(
            host,
            self.name(),
            rt,
            ctx,
            &PYTHON_PROBE,
            default_lib_suffixes(host.platform().os),
        )?;

        if install.binary.is_none() {
            tracing::warn!("no python interpreter found beneath {}", install.root.display());
        }
        if let Some(ref version) = install.version {
            for hint in python_version_hints(version) {
                ctx.hints.insert(hint);
            }
        }

        self.runtime_args = ctx.calculate(&rt.runtime_args);
        self.runtime_args.extend(routed.runtime.iter().cloned());
        self.script = ctx.calculate(&rt.main_program).into_iter().next();
        self.main_args = ctx.calculate(&rt.main_args);
        self.main_args.extend(routed.main.iter().cloned());

        self.install = Some(install);
        Ok(())
    }

    fn launch(&self) -> LaunchResult<LaunchPlan> {
        let install = self.install.as_ref().ok_or_else(|| LaunchError::NoInstallation {
            runtime: self.name().to_string(),
            candidates: 0,
        })?;

        Ok(LaunchPlan {
            lib_path: install.lib_path.to_string_lossy().into_owned(),
            runtime_args: self.runtime_args.clone(),
            main_program: self.script.clone().unwrap_or_default(),
            main_args: self.main_args.clone(),
        })
    }

    fn try_directive(&self, name: &str, out: &mut dyn Write) -> LaunchResult<bool> {
        dispatch_directive(self, Self::DIRECTIVES, name, out)
    }

    fn installation(&self) -> Option<&InstallInfo> {
        self.install.as_ref()
    }
}
