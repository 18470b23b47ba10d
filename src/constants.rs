//! Constants for the `git-branches` application.

/// The directory whose presence marks a repository root.
pub(crate) const GIT_DIR: &str = ".git";

/// The base branch for local comparisons when none is given.
pub(crate) const DEFAULT_BASE: &str = "master";

/// Branches whose name starts with this prefix are hidden by default.
pub(crate) const TRASH_PREFIX: &str = "trash/";

/// Branches whose last commit is at least this many days old are hidden by default.
pub(crate) const STALE_AFTER_DAYS: i64 = 14;

/// Separator between the fields of a `for-each-ref` line.
pub(crate) const FIELD_SEPARATOR: char = '\t';

pub(crate) const STRONG_MARKER: &str = "**";
pub(crate) const STRIKE_MARKER: &str = "~~";

/// Cell rendered in place of a count that could not be computed.
pub(crate) const UNKNOWN_COUNT: &str = "?";
