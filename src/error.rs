//! Error type shared by every selector operation.

use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while running a selection.
///
/// A user cancelling the selector is *not* an error: it comes back as an
/// empty [`Selection`](crate::selector::Selection).
#[derive(Error, Debug)]
pub enum Error {
    /// The selector binary could not be found on `PATH`.
    #[error("selector `{program}` was not found on PATH")]
    ExternalToolNotFound { program: String },

    /// The selector exited with a status that is not a cancellation.
    #[error("selector `{program}` failed ({})", exit_label(.code))]
    ExternalToolFailed { program: String, code: Option<i32> },

    /// The chosen line is the display text of more than one candidate.
    #[error("line {line:?} is shared by candidates {indices:?}")]
    AmbiguousDisplay { line: String, indices: Vec<usize> },

    /// A display string contained a newline.
    #[error("display text of candidate #{index} spans several lines")]
    InvalidDisplay { index: usize },

    /// The selector printed a line that matches no candidate.
    #[error("selector printed a line that matches no candidate: {line:?}")]
    UnknownLine { line: String },

    /// The selector was killed after running past its deadline.
    #[error("selector did not finish within {0:?}")]
    TimedOut(Duration),

    /// `--version` output without a `MAJOR.MINOR.PATCH` prefix.
    #[error("can't parse a version out of {0:?}")]
    VersionParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".into(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_message_names_status_or_signal() {
        let err = Error::ExternalToolFailed {
            program: "fzf".into(),
            code: Some(2),
        };
        assert_eq!(err.to_string(), "selector `fzf` failed (exit status 2)");

        let err = Error::ExternalToolFailed {
            program: "fzf".into(),
            code: None,
        };
        assert_eq!(err.to_string(), "selector `fzf` failed (terminated by signal)");
    }
}
