//! Core configuration model.
//!
//! This module contains the pieces every resolution pass is built from:
//! - The config tokenizer and the layered [`Config`] record
//! - Hints, variables and conditional-line evaluation
//! - Launcher option declarations and argument routing

pub mod config;
pub mod options;
pub mod parse;
pub mod router;
pub mod rules;

pub use config::{Config, RuntimeConfig};
pub use options::{LauncherOption, OptionTable};
pub use router::{ArgRouter, RoutedArgs, DIVIDER};
pub use rules::{calculate, evaluate, Context, Hints, Vars};
