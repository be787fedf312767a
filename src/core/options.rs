//! Launcher option declarations.
//!
//! A declaration looks like `--heap,--mem=<max>|Maximum heap size`: the
//! text after `|` is help, a `=<...>` suffix marks a value-taking option,
//! and commas separate alias spellings. The first spelling is primary and
//! names the variable that receives the value.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

/// A declared launcher option with all its spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherOption {
    /// Flag spellings, primary first
    pub flags: Vec<String>,
    /// Value placeholder (e.g. `<max>`) if the option takes a value
    pub value: Option<String>,
    /// Help text
    pub help: String,
}

impl LauncherOption {
    /// Parse one declaration; `None` if it declares no flags.
    pub fn parse(declaration: &str) -> Option<Self> {
        let (head, help) = match declaration.split_once('|') {
            Some((head, help)) => (head, help.trim().to_string()),
            None => (declaration, String::new()),
        };
        let (flags, value) = match head.split_once('=') {
            Some((flags, value)) => (flags, Some(value.trim().to_string())),
            None => (head, None),
        };
        let flags: Vec<String> = flags
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        if flags.is_empty() {
            return None;
        }
        Some(LauncherOption { flags, value, help })
    }

    pub fn takes_value(&self) -> bool {
        self.value.is_some()
    }

    /// Variable name for the option's value: the primary flag without its
    /// leading dashes.
    pub fn var_name(&self) -> &str {
        self.flags[0].trim_start_matches('-')
    }

    fn usage(&self) -> String {
        let mut usage = self.flags.join(", ");
        if let Some(ref value) = self.value {
            usage.push(' ');
            usage.push_str(value);
        }
        usage
    }
}

/// Lookup from every flag spelling to its option.
#[derive(Debug, Clone, Default)]
pub struct OptionTable {
    options: Vec<Rc<LauncherOption>>,
    by_flag: HashMap<String, Rc<LauncherOption>>,
}

impl OptionTable {
    /// Build the table from declarations, in declaration order.
    pub fn from_declarations(declarations: &[String]) -> Self {
        let mut table = OptionTable::default();
        for declaration in declarations {
            let Some(option) = LauncherOption::parse(declaration) else {
                tracing::warn!("ignoring malformed option declaration `{}`", declaration);
                continue;
            };
            let option = Rc::new(option);
            for flag in &option.flags {
                if table.by_flag.contains_key(flag) {
                    tracing::debug!("option `{}` declared more than once; first wins", flag);
                    continue;
                }
                table.by_flag.insert(flag.clone(), Rc::clone(&option));
            }
            table.options.push(option);
        }
        table
    }

    pub fn get(&self, flag: &str) -> Option<&LauncherOption> {
        self.by_flag.get(flag).map(Rc::as_ref)
    }

    /// Distinct options reachable from the flag table, in declaration order.
    pub fn distinct(&self) -> Vec<&LauncherOption> {
        self.options
            .iter()
            .filter(|option| {
                option
                    .flags
                    .iter()
                    .any(|f| self.by_flag.get(f).is_some_and(|o| Rc::ptr_eq(o, option)))
            })
            .map(Rc::as_ref)
            .collect()
    }

    /// Render usage text for the `help` directive.
    pub fn render_help(&self, program: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Usage: {} [<runtime options>.. --] [<main arguments>..]",
            program
        );

        let options = self.distinct();
        if options.is_empty() {
            return out;
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{} options:", program);
        let usages: Vec<String> = options.iter().map(|o| o.usage()).collect();
        let width = usages.iter().map(String::len).max().unwrap_or(0);
        for (option, usage) in options.iter().zip(&usages) {
            if option.help.is_empty() {
                let _ = writeln!(out, "  {}", usage);
            } else {
                let _ = writeln!(out, "  {:width$}  {}", usage, option.help, width = width);
            }
        }
        out
    }
}
