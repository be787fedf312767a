//! Fatal error taxonomy.
//!
//! Parse-level problems never show up here: they are logged and the
//! offending token is dropped. Everything in [`LaunchError`] aborts the run
//! before any protocol output is written.

use thiserror::Error;

/// Result alias for engine operations.
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

/// An error that aborts the resolution pass.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("incompatible config versions: {base} vs {overlay}")]
    IncompatibleVersion { base: i64, overlay: i64 },

    #[error("no suitable {runtime} installation found ({candidates} candidate roots checked)")]
    NoInstallation { runtime: String, candidates: usize },

    #[error("unrecognized runtime argument: {0}")]
    UnrecognizedRuntimeArg(String),

    #[error("divider `--` may only be given once")]
    DividerRepeated,

    #[error("option `{0}` requires a value")]
    MissingOptionValue(String),

    #[error("no main program configured for {0}")]
    NoMainProgram(String),

    #[error("directive `{directive}` failed: {reason}")]
    DirectiveFailed { directive: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_single_line() {
        let errors = [
            LaunchError::IncompatibleVersion { base: 1, overlay: 2 },
            LaunchError::NoInstallation {
                runtime: "jvm".to_string(),
                candidates: 3,
            },
            LaunchError::UnrecognizedRuntimeArg("--bogus".to_string()),
            LaunchError::DividerRepeated,
        ];
        for err in errors {
            assert!(!err.to_string().contains('\n'));
        }
    }

    #[test]
    fn test_unrecognized_names_token() {
        let err = LaunchError::UnrecognizedRuntimeArg("-Xfoo".to_string());
        assert_eq!(err.to_string(), "unrecognized runtime argument: -Xfoo");
    }
}
