//! The line protocol read by the native launcher.
//!
//! ```text
//! LAUNCH
//! <library path>
//! <N>
//! <runtime arg 1>
//! ...
//! <runtime arg N>
//! <main program>
//! <M>
//! <main arg 1>
//! ...
//! ```
//!
//! or a single `CANCEL` line.

use std::io::{self, Write};

use crate::runtime::LaunchPlan;

/// What the native launcher should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Launch(LaunchPlan),
    Cancel,
}

impl Decision {
    /// Write the decision in protocol form.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Decision::Cancel => writeln!(out, "CANCEL")?,
            Decision::Launch(plan) => {
                writeln!(out, "LAUNCH")?;
                writeln!(out, "{}", plan.lib_path)?;
                write_counted(out, &plan.runtime_args)?;
                writeln!(out, "{}", plan.main_program)?;
                write_counted(out, &plan.main_args)?;
            }
        }
        out.flush()
    }
}

fn write_counted(out: &mut dyn Write, items: &[String]) -> io::Result<()> {
    writeln!(out, "{}", items.len())?;
    for item in items {
        writeln!(out, "{}", item)?;
    }
    Ok(())
}
