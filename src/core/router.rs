//! Argument classification.
//!
//! User arguments split three ways: launcher options declared in the
//! config (which become hints and variables), runtime arguments, and
//! main-program arguments. A single `--` divider makes the split explicit;
//! without one, the runtime backend decides which arguments it owns.

use crate::runtime::RuntimeBackend;
use crate::util::errors::{LaunchError, LaunchResult};

use super::options::OptionTable;
use super::rules::Context;

/// Token separating runtime arguments from main arguments.
pub const DIVIDER: &str = "--";

/// Arguments after routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedArgs {
    pub runtime: Vec<String>,
    pub main: Vec<String>,
}

/// Routes raw arguments (without the executable path).
pub struct ArgRouter<'a> {
    options: &'a OptionTable,
    backend: &'a dyn RuntimeBackend,
    allow_unrecognized: bool,
}

impl<'a> ArgRouter<'a> {
    pub fn new(
        options: &'a OptionTable,
        backend: &'a dyn RuntimeBackend,
        allow_unrecognized: bool,
    ) -> Self {
        ArgRouter {
            options,
            backend,
            allow_unrecognized,
        }
    }

    /// Classify `args`, recording launcher options in `ctx`.
    pub fn route(&self, args: &[String], ctx: &mut Context) -> LaunchResult<RoutedArgs> {
        let divider = find_divider(args)?;
        let before_divider = |i: usize| divider.map_or(true, |d| i < d);

        let mut routed = RoutedArgs::default();
        let mut i = 0;
        while i < args.len() {
            if Some(i) == divider {
                i += 1;
                continue;
            }

            let arg = &args[i];
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (arg.as_str(), None),
            };

            if before_divider(i) {
                if let Some(option) = self.options.get(flag) {
                    if option.takes_value() {
                        let value = match inline_value {
                            Some(value) => value.to_string(),
                            None => {
                                let next = i + 1;
                                if next >= args.len() || Some(next) == divider {
                                    return Err(LaunchError::MissingOptionValue(flag.to_string()));
                                }
                                i = next;
                                args[next].clone()
                            }
                        };
                        tracing::debug!("option {} sets {} = {}", flag, option.var_name(), value);
                        ctx.vars.set(option.var_name(), value);
                    }
                    ctx.hints.insert(flag);
                    i += 1;
                    continue;
                }
            }

            match divider {
                None => {
                    let count = self.backend.recognizes(arg);
                    if count > 0 {
                        i = self.take_runtime(args, i, count, args.len(), &mut routed);
                        continue;
                    }
                    routed.main.push(arg.clone());
                }
                Some(d) if i < d => {
                    let count = self.backend.recognizes(arg);
                    if count == 0 {
                        if !self.allow_unrecognized {
                            return Err(LaunchError::UnrecognizedRuntimeArg(arg.clone()));
                        }
                        tracing::debug!("passing unrecognized runtime argument {}", arg);
                    }
                    i = self.take_runtime(args, i, count.max(1), d, &mut routed);
                    continue;
                }
                Some(_) => routed.main.push(arg.clone()),
            }
            i += 1;
        }

        Ok(routed)
    }

    /// Move `count` tokens starting at `start` (stopping at `limit`) into
    /// the runtime list; returns the next index.
    fn take_runtime(
        &self,
        args: &[String],
        start: usize,
        count: usize,
        limit: usize,
        routed: &mut RoutedArgs,
    ) -> usize {
        let end = (start + count).min(limit);
        routed.runtime.extend(args[start..end].iter().cloned());
        end
    }
}

fn find_divider(args: &[String]) -> LaunchResult<Option<usize>> {
    let mut positions = args.iter().enumerate().filter(|(_, a)| *a == DIVIDER);
    let first = positions.next().map(|(i, _)| i);
    if positions.next().is_some() {
        return Err(LaunchError::DividerRepeated);
    }
    Ok(first)
}
