//! Hints, variables and conditional config lines.
//!
//! Every list entry in a config file may carry leading rule clauses:
//! `rule1|!rule2|value`. The value survives only when every plain rule is
//! an active hint and every `!`-negated rule is not. Surviving values have
//! `${name}` references interpolated from the variable map, falling back
//! to the environment.

use std::collections::{BTreeSet, HashMap};

/// The set of active hints.
///
/// Iteration order is sorted so debug output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints(BTreeSet<String>);

impl Hints {
    pub fn new() -> Self {
        Hints(BTreeSet::new())
    }

    pub fn contains(&self, hint: &str) -> bool {
        self.0.contains(hint)
    }

    pub fn insert(&mut self, hint: impl Into<String>) {
        self.0.insert(hint.into());
    }

    pub fn remove(&mut self, hint: &str) {
        self.0.remove(hint);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

}

impl<S: Into<String>> FromIterator<S> for Hints {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Hints(iter.into_iter().map(Into::into).collect())
    }
}

/// Named string variables, list variables and the environment fallback.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
    env: HashMap<String, String>,
}

impl Vars {
    pub fn new() -> Self {
        Vars::default()
    }

    /// Variables backed by an environment snapshot.
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Vars {
            env,
            ..Vars::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    pub fn set_list(&mut self, name: impl Into<String>, items: Vec<String>) {
        self.lists.insert(name.into(), items);
    }

    /// Look up a name as a variable, then as an environment variable.
    fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name)
            .or_else(|| self.env.get(name).map(String::as_str))
    }

    /// Replace every `${name}` in `value`.
    ///
    /// Unknown names are left untouched, braces included. Scanning resumes
    /// right after each closing brace, so replacement text is never
    /// re-expanded.
    pub fn interpolate(&self, value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                result.push_str(&rest[start..]);
                return result;
            };

            let name = &after[..end];
            match self.resolve(name) {
                Some(v) => result.push_str(v),
                None => result.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }

        result.push_str(rest);
        result
    }
}

/// Evaluate one conditional line against the hints.
///
/// Returns `None` unless every rule clause holds; otherwise the
/// interpolated value.
pub fn evaluate(line: &str, hints: &Hints, vars: &Vars) -> Option<String> {
    let (rules, value) = split_rules(line);
    if rules.iter().all(|rule| rule_holds(rule, hints)) {
        Some(vars.interpolate(value))
    } else {
        None
    }
}

/// Evaluate a list of conditional lines into its effective values.
///
/// Order is preserved and empty results are dropped. A value that is
/// exactly `@{name}` expands to every element of the list variable `name`.
pub fn calculate(items: &[String], hints: &Hints, vars: &Vars) -> Vec<String> {
    let mut result = Vec::new();
    for item in items {
        let (rules, value) = split_rules(item);
        if !rules.iter().all(|rule| rule_holds(rule, hints)) {
            continue;
        }

        if let Some(list) = list_reference(value).and_then(|name| vars.list(name)) {
            result.extend(list.iter().filter(|s| !s.is_empty()).cloned());
            continue;
        }

        let value = vars.interpolate(value);
        if !value.is_empty() {
            result.push(value);
        }
    }
    result
}

fn split_rules(line: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = line.split('|').collect();
    let value = parts.pop().unwrap_or_default();
    (parts, value)
}

fn rule_holds(rule: &str, hints: &Hints) -> bool {
    match rule.strip_prefix('!') {
        Some(negated) => !hints.contains(negated),
        None => hints.contains(rule),
    }
}

fn list_reference(value: &str) -> Option<&str> {
    value.strip_prefix("@{")?.strip_suffix('}')
}

/// Mutable state owned by one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub hints: Hints,
    pub vars: Vars,
}

impl Context {
    pub fn new(hints: Hints, vars: Vars) -> Self {
        Context { hints, vars }
    }

    /// [`calculate`] against this context.
    pub fn calculate(&self, items: &[String]) -> Vec<String> {
        calculate(items, &self.hints, &self.vars)
    }

    /// [`evaluate`] against this context.
    pub fn evaluate(&self, line: &str) -> Option<String> {
        evaluate(line, &self.hints, &self.vars)
    }

    /// Apply mode rules in a single pass.
    ///
    /// The surviving tokens are computed once up front; `!token` removes a
    /// hint and anything else adds one. Hints changed here do not cause
    /// earlier mode lines to be re-evaluated.
    pub fn apply_modes(&mut self, modes: &[String]) {
        for mode in self.calculate(modes) {
            match mode.strip_prefix('!') {
                Some(hint) => {
                    tracing::debug!("mode removes hint {}", hint);
                    self.hints.remove(hint);
                }
                None => {
                    tracing::debug!("mode adds hint {}", mode);
                    self.hints.insert(mode);
                }
            }
        }
    }
}
