//! Error types for the `git-branches` application.

use std::{io, path::PathBuf, process::ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BranchesError {
    /// No `.git` directory was found in the starting directory or any of its parents.
    #[error("`{}` is not inside a git repository.", .0.display())]
    NotARepository(PathBuf),
    /// The `git` executable could not be spawned.
    #[error("failed to run `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: io::Error,
    },
    /// A `git` invocation exited unsuccessfully.
    #[error("`git {args}` failed ({status}): {stderr}")]
    GitCommand {
        args: String,
        status: ExitStatus,
        stderr: String,
    },
    /// `git rev-list --left-right --count` printed something other than two counts.
    #[error("unexpected `git rev-list` output: {0:?}")]
    MalformedCounts(String),
    /// Writing formatted output failed.
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

pub type BranchesResult<T> = Result<T, BranchesError>;
