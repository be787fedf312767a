//! The resolution pipeline.
//!
//! Config files are loaded and merged, arguments routed, modes applied,
//! and then either the requested directives run (and the launch is
//! cancelled) or the chosen backend produces a launch plan.

use std::io::Write;
use std::path::Path;

use crate::core::options::OptionTable;
use crate::core::router::ArgRouter;
use crate::core::rules::{Context, Hints, Vars};
use crate::runtime::select_backend;
use crate::util::errors::{LaunchError, LaunchResult};
use crate::util::host::Host;

use super::config_files::{load_config, AppPaths};
use super::emit::Decision;

/// Directives handled by the pipeline itself; they never need a runtime.
pub const GLOBAL_DIRECTIVES: &[&str] = &["help"];

/// Outcome of one resolution pass.
#[derive(Debug)]
pub struct Resolution {
    pub decision: Decision,
    /// Hints and variables as they stood at the end of the pass
    pub context: Context,
}

/// Resolve `argv` (executable path first) into a launch decision.
///
/// Help and directive output goes to `diag`. Nothing is written there for
/// a plain launch.
pub fn resolve(host: &dyn Host, argv: &[String], diag: &mut dyn Write) -> LaunchResult<Resolution> {
    let (executable, user_args) = argv
        .split_first()
        .ok_or_else(|| LaunchError::InvalidInput("empty argument vector".to_string()))?;

    let paths = AppPaths::discover(host, Path::new(executable));
    let config = load_config(host, &paths)?;
    let mut ctx = initial_context(host, &paths);

    let options = OptionTable::from_declarations(&config.supported_options);
    let mut backend = select_backend(&config, &ctx);
    let allow_unrecognized = config.allow_unrecognized_args.unwrap_or(false);
    let routed = ArgRouter::new(&options, backend.as_ref(), allow_unrecognized)
        .route(user_args, &mut ctx)?;
    tracing::debug!("runtime args: {:?}", routed.runtime);
    tracing::debug!("main args: {:?}", routed.main);

    ctx.apply_modes(&config.modes);
    tracing::debug!("hints: {:?}", ctx.hints.iter().collect::<Vec<_>>());

    let directives = requested_directives(&ctx, &config.directives);
    let needs_runtime = directives.is_empty()
        || directives
            .iter()
            .any(|d| !GLOBAL_DIRECTIVES.contains(&d.as_str()));
    if needs_runtime {
        backend.configure(host, &config, &mut ctx, &routed)?;
    }

    for directive in &directives {
        if directive == "help" {
            let program = config
                .program_name
                .clone()
                .unwrap_or_else(|| paths.executable_stem());
            diag.write_all(options.render_help(&program).as_bytes())?;
            continue;
        }
        if !backend.try_directive(directive, diag)? {
            tracing::warn!("ignoring unknown directive `{}`", directive);
        }
    }

    let decision = if directives.is_empty() {
        Decision::Launch(backend.launch()?)
    } else {
        Decision::Cancel
    };
    Ok(Resolution {
        decision,
        context: ctx,
    })
}

fn initial_context(host: &dyn Host, paths: &AppPaths) -> Context {
    let hints: Hints = host.platform().hints().into_iter().collect();
    let mut vars = Vars::with_env(host.env_vars());
    vars.set("app-dir", paths.app_dir.to_string_lossy());
    vars.set(
        "config-dir",
        paths
            .config_dir
            .as_ref()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    vars.set("executable", paths.executable.to_string_lossy());
    Context::new(hints, vars)
}

/// Effective directive names, in declaration order.
fn requested_directives(ctx: &Context, rules: &[String]) -> Vec<String> {
    ctx.calculate(rules)
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{AppFixture, JdkFixture, MockHost};

    const APP: &str = "/apps/fiji";

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once(format!("{}/fiji", APP))
            .chain(args.iter().map(|s| s.to_string()))
            .collect()
    }

    fn host_with_config(config: &str) -> MockHost {
        let mut host = MockHost::new();
        AppFixture::new(APP).file("launchpad.toml", config).install(&mut host);
        JdkFixture::new("/opt/java/jdk-17.0.2-linux-x64").install(&mut host);
        host
    }

    const BASE: &str = r#"
program-name = 'Fiji'
jvm.root-paths = ['/opt/java/*']
jvm.main-class = ['sc.fiji.Main']
jvm.recognized-args = ['-D*', '-Xmx*']
"#;

    fn launch_plan(resolution: &Resolution) -> &crate::runtime::LaunchPlan {
        match resolution.decision {
            Decision::Launch(ref plan) => plan,
            Decision::Cancel => panic!("expected a launch decision"),
        }
    }

    #[test]
    fn test_value_option_and_divider() {
        let config = format!(
            "{}supported-options = ['--heap,--mem=<max>|Heap size']\n",
            BASE
        );
        let host = host_with_config(&config);
        let mut diag = Vec::new();

        let resolution = resolve(&host, &argv(&["--mem", "2g", "--", "--foo"]), &mut diag).unwrap();
        let plan = launch_plan(&resolution);

        assert_eq!(resolution.context.vars.get("heap"), Some("2g"));
        assert!(plan.runtime_args.is_empty());
        assert_eq!(plan.main_args, vec!["--foo"]);
        assert_eq!(plan.main_program, "sc/fiji/Main");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_seeded_variables() {
        let host = host_with_config(BASE);
        let resolution = resolve(&host, &argv(&[]), &mut Vec::new()).unwrap();
        let vars = &resolution.context.vars;

        assert_eq!(vars.get("app-dir"), Some(APP));
        assert_eq!(vars.get("config-dir"), Some("/apps/fiji/launchpad"));
        assert_eq!(vars.get("executable"), Some("/apps/fiji/fiji"));
        assert!(resolution.context.hints.contains("OS:LINUX"));
        assert!(resolution.context.hints.contains("ARCH:X64"));
    }

    #[test]
    fn test_modes_drive_runtime_args() {
        let config = format!(
            "{}{}",
            BASE,
            r#"
supported-options = ['--headless|Run without a display']
modes = ['--headless|HEADLESS', '--headless|!OS:LINUX']
jvm.runtime-args = [
  'HEADLESS|-Djava.awt.headless=true',
  '-Dapp.dir=${app-dir}',
]
"#
        );
        let host = host_with_config(&config);
        let resolution = resolve(&host, &argv(&["--headless", "-Dx=1", "data.tif"]), &mut Vec::new()).unwrap();
        let plan = launch_plan(&resolution);

        assert_eq!(
            plan.runtime_args,
            vec!["-Djava.awt.headless=true", "-Dapp.dir=/apps/fiji", "-Dx=1"]
        );
        assert_eq!(plan.main_args, vec!["data.tif"]);
        assert!(!resolution.context.hints.contains("OS:LINUX"));
    }

    #[test]
    fn test_help_skips_discovery() {
        let mut host = MockHost::new();
        AppFixture::new(APP)
            .file(
                "launchpad.toml",
                "program-name = 'Fiji'\nsupported-options = ['--help,-h|Show help']\ndirectives = ['--help|help']\njvm.root-paths = ['/nowhere']\n",
            )
            .install(&mut host);

        let mut diag = Vec::new();
        let resolution = resolve(&host, &argv(&["--help"]), &mut diag).unwrap();
        assert_eq!(resolution.decision, Decision::Cancel);

        let help = String::from_utf8(diag).unwrap();
        assert!(help.starts_with("Usage: Fiji"));
        assert!(help.contains("--help, -h"));
    }

    #[test]
    fn test_runtime_directive_cancels_launch() {
        let config = format!(
            "{}supported-options = ['--print-java-home']\ndirectives = ['--print-java-home|print-java-home,bogus']\n",
            BASE
        );
        let host = host_with_config(&config);
        let mut diag = Vec::new();

        let resolution = resolve(&host, &argv(&["--print-java-home"]), &mut diag).unwrap();
        assert_eq!(resolution.decision, Decision::Cancel);
        assert_eq!(
            String::from_utf8(diag).unwrap(),
            "/opt/java/jdk-17.0.2-linux-x64\n"
        );
    }

    #[test]
    fn test_no_installation_is_fatal() {
        let mut host = MockHost::new();
        AppFixture::new(APP).file("launchpad.toml", BASE).install(&mut host);

        let err = resolve(&host, &argv(&[]), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, LaunchError::NoInstallation { .. }));
    }

    #[test]
    fn test_unrecognized_runtime_arg() {
        let host = host_with_config(BASE);
        let err = resolve(&host, &argv(&["-Xbogus", "--", "x"]), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, LaunchError::UnrecognizedRuntimeArg(ref a) if a == "-Xbogus"));

        let config = format!("{}allow-unrecognized-args = true\n", BASE);
        let host = host_with_config(&config);
        let resolution = resolve(&host, &argv(&["-Xbogus", "--", "x"]), &mut Vec::new()).unwrap();
        assert_eq!(launch_plan(&resolution).runtime_args, vec!["-Xbogus"]);
    }

    #[test]
    fn test_environment_fallback() {
        let config = format!("{}jvm.main-args = ['--user=${{USER}}', '${{UNSET}}']\n", BASE);
        let mut host = host_with_config(&config);
        host.set_env("USER", "curtis");

        let resolution = resolve(&host, &argv(&[]), &mut Vec::new()).unwrap();
        assert_eq!(
            launch_plan(&resolution).main_args,
            vec!["--user=curtis", "${UNSET}"]
        );
    }

    #[test]
    fn test_python_backend_selected() {
        let mut host = MockHost::new();
        AppFixture::new(APP)
            .file(
                "launchpad.toml",
                "python.enabled = true\npython.root-paths = ['/opt/python3.12-linux-x64']\npython.script-path = ['${app-dir}/app.py']\n",
            )
            .install(&mut host);
        host.add_file("/opt/python3.12-linux-x64/lib/libpython3.12.so.1.0", "");
        host.add_file("/opt/python3.12-linux-x64/bin/python", "");

        let resolution = resolve(&host, &argv(&["input.csv"]), &mut Vec::new()).unwrap();
        let plan = launch_plan(&resolution);
        assert_eq!(plan.lib_path, "/opt/python3.12-linux-x64/lib/libpython3.12.so.1.0");
        assert_eq!(plan.main_program, "/apps/fiji/app.py");
        assert_eq!(plan.main_args, vec!["input.csv"]);
        assert!(resolution.context.hints.contains("PYTHON:3.12"));
    }

    #[test]
    fn test_empty_argv() {
        let host = MockHost::new();
        assert!(matches!(
            resolve(&host, &[], &mut Vec::new()),
            Err(LaunchError::InvalidInput(_))
        ));
    }
}
