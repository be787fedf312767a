//! Java virtual machine backend.

use std::collections::HashMap;
use std::io::Write;

use crate::core::config::Config;
use crate::core::router::RoutedArgs;
use crate::core::rules::Context;
use crate::discovery::version::guess_java_version;
use crate::discovery::{Field, Probe};
use crate::util::errors::{LaunchError, LaunchResult};
use crate::util::host::Host;
use crate::util::platform::{Os, Platform};

use super::heap::resolve_max_heap;
use super::{
    discover_installation, dispatch_directive, expand_globs, major_version_hints, require_install,
    shell_join, InstallInfo, LaunchPlan, RuntimeBackend,
};

const CLASS_PATH_PREFIX: &str = "-Djava.class.path=";

/// Metadata layout of a JDK or JRE.
pub struct JvmProbe;

pub static JVM_PROBE: JvmProbe = JvmProbe;

impl Probe for JvmProbe {
    fn name(&self) -> &'static str {
        "jvm"
    }

    fn manifest_file(&self) -> &'static str {
        "release"
    }

    fn manifest_keys(&self, field: Field) -> &'static [&'static str] {
        match field {
            Field::Version => &["JAVA_VERSION"],
            Field::Distro => &["IMPLEMENTOR_VERSION", "IMPLEMENTOR"],
            Field::Os => &["OS_NAME"],
            Field::Arch => &["OS_ARCH"],
        }
    }

    fn property_keys(&self, field: Field) -> &'static [&'static str] {
        match field {
            Field::Version => &["java.version"],
            Field::Distro => &["java.vendor.version", "java.vendor"],
            Field::Os => &["os.name"],
            Field::Arch => &["os.arch"],
        }
    }

    fn vendor_property(&self) -> &'static str {
        "java.vendor"
    }

    fn binary_candidates(&self, platform: Platform) -> Vec<String> {
        let exe = if platform.is_windows() { "java.exe" } else { "java" };
        vec![format!("bin/{}", exe), format!("jre/bin/{}", exe)]
    }

    fn probe_args(&self) -> Vec<String> {
        vec!["-XshowSettings:properties".to_string(), "-version".to_string()]
    }

    /// `-XshowSettings:properties` prints indented `key = value` lines;
    /// continuation lines of multi-valued properties carry no `=`.
    fn parse_properties(&self, lines: &[String]) -> HashMap<String, String> {
        lines
            .iter()
            .filter_map(|line| line.split_once(" = "))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty() && !key.contains(char::is_whitespace))
            .collect()
    }

    fn guess_version(&self, dir_name: &str) -> Option<String> {
        guess_java_version(dir_name)
    }
}

/// Library locations relative to a JVM root, per platform.
pub fn default_lib_suffixes(os: Os) -> &'static [&'static str] {
    match os {
        Os::Windows => &[
            "bin/server/jvm.dll",
            "bin/client/jvm.dll",
            "jre/bin/server/jvm.dll",
            "jre/bin/client/jvm.dll",
        ],
        Os::MacOs => &[
            "lib/server/libjvm.dylib",
            "jre/lib/server/libjvm.dylib",
            "Contents/Home/lib/server/libjvm.dylib",
            "Contents/Home/jre/lib/server/libjvm.dylib",
        ],
        Os::Linux | Os::Other => &[
            "lib/server/libjvm.so",
            "lib/client/libjvm.so",
            "jre/lib/server/libjvm.so",
            "jre/lib/*/server/libjvm.so",
            "jre/lib/*/client/libjvm.so",
        ],
    }
}

type Directive = fn(&JvmBackend, &mut dyn Write) -> LaunchResult<()>;

/// Launches a main class inside a discovered JVM.
#[derive(Debug, Default)]
pub struct JvmBackend {
    recognized: Vec<String>,
    install: Option<InstallInfo>,
    class_path: Vec<String>,
    runtime_args: Vec<String>,
    main_class: Option<String>,
    main_args: Vec<String>,
}

impl JvmBackend {
    const DIRECTIVES: &'static [(&'static str, Directive)] = &[
        ("dry-run", JvmBackend::dry_run),
        ("print-class-path", JvmBackend::print_class_path),
        ("print-java-home", JvmBackend::print_java_home),
        ("print-java-info", JvmBackend::print_java_info),
    ];

    pub fn new(recognized: Vec<String>) -> Self {
        JvmBackend {
            recognized,
            ..JvmBackend::default()
        }
    }

    fn dry_run(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "dry-run")?;
        let binary = install
            .binary
            .as_ref()
            .map(|b| b.to_string_lossy().into_owned())
            .unwrap_or_else(|| "java".to_string());
        let main = self.main_class.as_deref().unwrap_or_default();

        let parts = std::iter::once(binary.as_str())
            .chain(self.runtime_args.iter().map(String::as_str))
            .chain(std::iter::once(main).filter(|m| !m.is_empty()))
            .chain(self.main_args.iter().map(String::as_str));
        writeln!(out, "{}", shell_join(parts))?;
        Ok(())
    }

    fn print_class_path(&self, out: &mut dyn Write) -> LaunchResult<()> {
        if self.class_path.is_empty() {
            writeln!(out, "<empty class path>")?;
        }
        for entry in &self.class_path {
            writeln!(out, "{}", entry)?;
        }
        Ok(())
    }

    fn print_java_home(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "print-java-home")?;
        writeln!(out, "{}", install.root.display())?;
        Ok(())
    }

    fn print_java_info(&self, out: &mut dyn Write) -> LaunchResult<()> {
        let install = require_install(self.install.as_ref(), "print-java-info")?;
        install.describe(out)?;
        Ok(())
    }
}

impl RuntimeBackend for JvmBackend {
    fn name(&self) -> &'static str {
        "jvm"
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
        let rt = &config.jvm;
        let platform = host.platform();
        let install = discover_installation(
            host,
            self.name(),
            rt,
            ctx,
            &JVM_PROBE,
            default_lib_suffixes(platform.os),
        )?;

        if let Some(ref version) = install.version {
            for hint in major_version_hints("JAVA", version) {
                ctx.hints.insert(hint);
            }
        }

        self.class_path = expand_globs(host, &ctx.calculate(&rt.class_path));
        ctx.vars.set_list("jvm.class-path", self.class_path.clone());

        let mut runtime_args = ctx.calculate(&rt.runtime_args);
        runtime_args.extend(routed.runtime.iter().cloned());
        merge_class_path(&mut runtime_args, &self.class_path, platform.path_separator());

        if !runtime_args.iter().any(|a| a.starts_with("-Xmx")) {
            let setting = rt.max_heap.as_deref().and_then(|h| ctx.evaluate(h));
            if let Some(heap) = resolve_max_heap(setting.as_deref(), host.total_memory()) {
                runtime_args.push(format!("-Xmx{}", heap));
            }
        }
        self.runtime_args = runtime_args;

        self.main_class = ctx.calculate(&rt.main_program).into_iter().next();
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
        let main_class = self
            .main_class
            .as_ref()
            .ok_or_else(|| LaunchError::NoMainProgram(self.name().to_string()))?;

        Ok(LaunchPlan {
            lib_path: install.lib_path.to_string_lossy().into_owned(),
            runtime_args: self.runtime_args.clone(),
            main_program: main_class.replace('.', "/"),
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

/// Fold class path entries into a single `-Djava.class.path=` argument.
///
/// An existing argument is extended rather than duplicated.
fn merge_class_path(args: &mut Vec<String>, entries: &[String], separator: char) {
    if entries.is_empty() {
        return;
    }
    let joined = entries.join(&separator.to_string());
    match args.iter_mut().find(|a| a.starts_with(CLASS_PATH_PREFIX)) {
        Some(existing) => {
            if existing.len() > CLASS_PATH_PREFIX.len() {
                existing.push(separator);
            }
            existing.push_str(&joined);
        }
        None => args.push(format!("{}{}", CLASS_PATH_PREFIX, joined)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::{Hints, Vars};
    use crate::test_support::{JdkFixture, MockHost};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.jvm.root_paths = strings(&["/opt/java/*"]);
        config.jvm.main_program = strings(&["org.example.Main"]);
        config
    }

    fn host() -> MockHost {
        let mut host = MockHost::new();
        JdkFixture::new("/opt/java/jdk-17.0.2-linux-x64").install(&mut host);
        host
    }

    fn configure(config: &Config, host: &MockHost, routed: RoutedArgs) -> (JvmBackend, Context) {
        let mut ctx = Context::new(Hints::from_iter(host.platform().hints()), Vars::new());
        let mut backend = JvmBackend::new(Vec::new());
        backend.configure(host, config, &mut ctx, &routed).unwrap();
        (backend, ctx)
    }

    #[test]
    fn test_parse_show_settings() {
        let lines = strings(&[
            "Property settings:",
            "    java.home = /usr/lib/jvm/java-17",
            "    java.library.path = /usr/java/packages/lib",
            "        /usr/lib64",
            "    java.vendor = Eclipse Adoptium",
            "    java.version = 17.0.8",
            "",
            "openjdk version \"17.0.8\" 2023-07-18",
        ]);
        let props = JVM_PROBE.parse_properties(&lines);
        assert_eq!(props.get("java.version").map(String::as_str), Some("17.0.8"));
        assert_eq!(props.get("java.vendor").map(String::as_str), Some("Eclipse Adoptium"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_launch_plan() {
        let (backend, ctx) = configure(
            &config(),
            &host(),
            RoutedArgs {
                runtime: strings(&["-Dfoo=bar"]),
                main: strings(&["file.txt"]),
            },
        );
        let plan = backend.launch().unwrap();

        assert_eq!(plan.lib_path, "/opt/java/jdk-17.0.2-linux-x64/lib/server/libjvm.so");
        assert_eq!(plan.runtime_args, vec!["-Dfoo=bar"]);
        assert_eq!(plan.main_program, "org/example/Main");
        assert_eq!(plan.main_args, vec!["file.txt"]);

        assert!(ctx.hints.contains("JAVA:17"));
        assert!(ctx.hints.contains("JAVA:11+"));
        assert!(!ctx.hints.contains("JAVA:18+"));
        assert_eq!(ctx.vars.get("jvm.version"), Some("17.0.2"));
        assert_eq!(ctx.vars.get("jvm.root"), Some("/opt/java/jdk-17.0.2-linux-x64"));
    }

    #[test]
    fn test_config_args_precede_user_args() {
        let mut config = config();
        config.jvm.runtime_args = strings(&["-Xss4m", "JAVA:9+|--add-opens=java.base/java.lang=ALL-UNNAMED"]);
        config.jvm.main_args = strings(&["--from-config"]);

        let (backend, _) = configure(
            &config,
            &host(),
            RoutedArgs {
                runtime: strings(&["-Duser=1"]),
                main: strings(&["--from-user"]),
            },
        );
        let plan = backend.launch().unwrap();
        assert_eq!(
            plan.runtime_args,
            vec!["-Xss4m", "--add-opens=java.base/java.lang=ALL-UNNAMED", "-Duser=1"]
        );
        assert_eq!(plan.main_args, vec!["--from-config", "--from-user"]);
    }

    #[test]
    fn test_class_path_merges_into_existing_argument() {
        let mut host = host();
        host.add_file("/app/jars/a.jar", "");
        host.add_file("/app/jars/b.jar", "");

        let mut config = config();
        config.jvm.class_path = strings(&["/app/jars/*.jar", "/app/classes"]);
        config.jvm.runtime_args = strings(&["-Djava.class.path=/extra.jar"]);

        let (backend, ctx) = configure(&config, &host, RoutedArgs::default());
        let plan = backend.launch().unwrap();
        assert_eq!(
            plan.runtime_args,
            vec!["-Djava.class.path=/extra.jar:/app/jars/a.jar:/app/jars/b.jar:/app/classes"]
        );
        assert_eq!(ctx.vars.list("jvm.class-path").map(<[String]>::len), Some(3));
    }

    #[test]
    fn test_class_path_argument_added() {
        let mut config = config();
        config.jvm.class_path = strings(&["/app/classes"]);

        let (backend, _) = configure(&config, &host(), RoutedArgs::default());
        let plan = backend.launch().unwrap();
        assert_eq!(plan.runtime_args, vec!["-Djava.class.path=/app/classes"]);
    }

    #[test]
    fn test_max_heap_only_without_user_xmx() {
        let mut config = config();
        config.jvm.max_heap = Some("50%".to_string());
        let mut host = host();
        host.set_memory(8 * 1024 * 1024 * 1024);

        let (backend, _) = configure(&config, &host, RoutedArgs::default());
        assert_eq!(backend.launch().unwrap().runtime_args, vec!["-Xmx4194m"]);

        let (backend, _) = configure(
            &config,
            &host,
            RoutedArgs {
                runtime: strings(&["-Xmx1g"]),
                main: Vec::new(),
            },
        );
        assert_eq!(backend.launch().unwrap().runtime_args, vec!["-Xmx1g"]);
    }

    #[test]
    fn test_missing_main_class() {
        let mut config = config();
        config.jvm.main_program = strings(&["NEVER|org.example.Main"]);

        let (backend, _) = configure(&config, &host(), RoutedArgs::default());
        assert!(matches!(backend.launch(), Err(LaunchError::NoMainProgram(_))));
    }

    #[test]
    fn test_no_installation() {
        let host = MockHost::new();
        let mut ctx = Context::default();
        let mut backend = JvmBackend::new(Vec::new());
        let err = backend
            .configure(&host, &config(), &mut ctx, &RoutedArgs::default())
            .unwrap_err();
        assert!(matches!(err, LaunchError::NoInstallation { candidates: 0, .. }));
    }

    #[test]
    fn test_directives() {
        let mut config = config();
        config.jvm.class_path = strings(&["/app/classes"]);
        let (backend, _) = configure(
            &config,
            &host(),
            RoutedArgs {
                runtime: Vec::new(),
                main: strings(&["my file.txt"]),
            },
        );

        let mut out = Vec::new();
        assert!(backend.try_directive("print-java-home", &mut out).unwrap());
        assert!(backend.try_directive("print-class-path", &mut out).unwrap());
        assert!(backend.try_directive("dry-run", &mut out).unwrap());
        assert!(!backend.try_directive("print-python-home", &mut out).unwrap());

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "/opt/java/jdk-17.0.2-linux-x64");
        assert_eq!(lines[1], "/app/classes");
        assert_eq!(
            lines[2],
            "/opt/java/jdk-17.0.2-linux-x64/bin/java -Djava.class.path=/app/classes org.example.Main 'my file.txt'"
        );
    }

    #[test]
    fn test_directive_without_installation() {
        let backend = JvmBackend::new(Vec::new());
        let mut out = Vec::new();
        let err = backend.try_directive("print-java-info", &mut out).unwrap_err();
        assert!(matches!(err, LaunchError::DirectiveFailed { .. }));
    }
}
