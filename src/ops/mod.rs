//! High-level operations.
//!
//! This module contains the resolution pipeline and the pieces around it:
//! config file discovery and the output protocol.

pub mod config_files;
pub mod emit;
pub mod launch;

pub use config_files::{config_file_names, load_config, AppPaths};
pub use emit::Decision;
pub use launch::{resolve, Resolution};
