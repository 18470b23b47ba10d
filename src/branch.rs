//! Branch records, parsed from the line-oriented output of `git for-each-ref`.

use crate::constants::FIELD_SEPARATOR;
use chrono::{DateTime, FixedOffset};
use std::fmt::{self, Display};

/// Which comparison a branch listing feeds, and therefore which fields it carries.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ListingMode {
    /// Branches compared against the configured base branch.
    Local,
    /// Branches compared against their upstream tracking branch.
    Remote,
}

impl ListingMode {
    /// The `--format` argument handed to `git for-each-ref`.
    pub fn ref_format(self) -> &'static str {
        match self {
            Self::Local => "--format=%(refname:short)\t%(committerdate:iso8601-strict)",
            Self::Remote => {
                "--format=%(refname:short)\t%(upstream:short)\t%(committerdate:iso8601-strict)"
            }
        }
    }

    /// The minimum number of tab-separated fields in a well-formed line.
    pub fn field_count(self) -> usize {
        match self {
            Self::Local => 2,
            Self::Remote => 3,
        }
    }
}

/// A local branch, as reported by `git for-each-ref`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BranchRecord {
    /// The short name of the branch, e.g. `feature-x`.
    pub name: String,
    /// The short name of the upstream tracking branch, e.g. `origin/feature-x`.
    ///
    /// Always [None] for [ListingMode::Local] listings.
    pub upstream: Option<String>,
    /// The committer date of the branch tip.
    pub committed_at: DateTime<FixedOffset>,
}

/// A listing line that could not be turned into a [BranchRecord].
///
/// The message is shown inline in the rendered table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MalformedLine(pub String);

impl Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a branch listing, parsed.
pub type ListedBranch = Result<BranchRecord, MalformedLine>;

/// Parses one line of `git for-each-ref` output produced with [ListingMode::ref_format].
///
/// Fields beyond the ones the mode needs are ignored.
pub fn parse_branch_line(mode: ListingMode, line: &str) -> ListedBranch {
    let fields = line
        .trim_end_matches(['\r', '\n'])
        .split(FIELD_SEPARATOR)
        .collect::<Vec<_>>();

    let expected = mode.field_count();
    if fields.len() < expected {
        return Err(MalformedLine(format!(
            "error: expected {} tab-separated fields, found {}",
            expected,
            fields.len()
        )));
    }

    let (name, upstream, date) = match mode {
        ListingMode::Local => (fields[0], None, fields[1]),
        ListingMode::Remote => (
            fields[0],
            Some(fields[1]).filter(|upstream| !upstream.is_empty()),
            fields[2],
        ),
    };

    let committed_at = DateTime::parse_from_rfc3339(date.trim()).map_err(|e| {
        MalformedLine(format!(
            "error: invalid committer date {:?} on `{}`: {}",
            date, name, e
        ))
    })?;

    Ok(BranchRecord {
        name: name.to_string(),
        upstream: upstream.map(ToOwned::to_owned),
        committed_at,
    })
}

/// Commit counts between a branch and its comparison reference.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct AheadBehind {
    /// Commits reachable from the reference but not from the branch.
    pub behind: u64,
    /// Commits reachable from the branch but not from the reference.
    pub ahead: u64,
}

/// Parses the `behind\tahead` line printed by `git rev-list --count --left-right <ref>...<branch>`.
pub fn parse_left_right(output: &str) -> Option<AheadBehind> {
    let (behind, ahead) = output.trim_end().split_once(FIELD_SEPARATOR)?;
    Some(AheadBehind {
        behind: behind.trim().parse().ok()?,
        ahead: ahead.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod test {
    use super::{parse_branch_line, parse_left_right, AheadBehind, ListingMode, MalformedLine};

    #[test]
    fn parses_local_line() {
        let record =
            parse_branch_line(ListingMode::Local, "master\t2016-03-03T15:01:11-08:00\n").unwrap();

        assert_eq!(record.name, "master");
        assert_eq!(record.upstream, None);
        assert_eq!(record.committed_at.to_rfc3339(), "2016-03-03T15:01:11-08:00");
    }

    #[test]
    fn parses_remote_line() {
        let record = parse_branch_line(
            ListingMode::Remote,
            "feature-x\torigin/feature-x\t2016-03-03T15:01:11+00:00",
        )
        .unwrap();

        assert_eq!(record.name, "feature-x");
        assert_eq!(record.upstream.as_deref(), Some("origin/feature-x"));
    }

    #[test]
    fn empty_upstream_is_none() {
        let record =
            parse_branch_line(ListingMode::Remote, "wip\t\t2016-03-03T15:01:11+00:00").unwrap();
        assert_eq!(record.upstream, None);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record =
            parse_branch_line(ListingMode::Local, "master\t2016-03-03T15:01:11Z\textra").unwrap();
        assert_eq!(record.name, "master");
    }

    #[test]
    fn too_few_fields_is_malformed() {
        assert_eq!(
            parse_branch_line(ListingMode::Local, "master"),
            Err(MalformedLine(
                "error: expected 2 tab-separated fields, found 1".to_string()
            ))
        );
        assert_eq!(
            parse_branch_line(ListingMode::Remote, "master\t2016-03-03T15:01:11Z"),
            Err(MalformedLine(
                "error: expected 3 tab-separated fields, found 2".to_string()
            ))
        );
    }

    #[test]
    fn bad_date_is_malformed() {
        let err = parse_branch_line(ListingMode::Local, "master\tyesterday").unwrap_err();
        assert!(err.0.starts_with("error: invalid committer date"));
    }

    #[test]
    fn parses_counts() {
        assert_eq!(
            parse_left_right("2\t10\n"),
            Some(AheadBehind {
                behind: 2,
                ahead: 10
            })
        );
        assert_eq!(parse_left_right("2 10"), None);
        assert_eq!(parse_left_right("x\t1"), None);
        assert_eq!(parse_left_right(""), None);
    }
}
