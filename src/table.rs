//! Comparison of branches against a reference, rendered as Markdown tables.

use crate::{
    branch::{AheadBehind, ListedBranch, ListingMode, MalformedLine},
    constants::{STRIKE_MARKER, STRONG_MARKER, UNKNOWN_COUNT},
    git::RevisionCounter,
    policy::{RenderPolicy, StaleFilter},
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, warn};

/// Whether a table shows the comparison reference in its own column.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReferenceColumn {
    Hidden,
    Shown,
}

/// The reference a branch was compared against, as shown in the reference column.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Reference {
    /// The branch has no reference, e.g. no upstream is configured.
    Absent,
    /// The reference resolved.
    Present(String),
    /// The reference no longer resolves, e.g. the upstream branch was deleted.
    Gone(String),
}

/// The ahead/behind cells of a row.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Counts {
    Known(AheadBehind),
    /// The comparison failed.
    Unknown,
    /// No comparison was attempted, or its failure is shown in the reference column.
    Blank,
}

/// One branch compared against one reference.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Comparison {
    /// The name of the branch.
    pub branch: String,
    /// Whether the branch is checked out.
    pub current: bool,
    /// The reference column, [None] when the table does not have one.
    pub reference: Option<Reference>,
    pub counts: Counts,
}

/// Compares `subject` against `reference`.
///
/// A failed count never fails the comparison. It degrades to a placeholder: a struck through
/// reference when the reference column is shown, and unknown counts otherwise.
///
/// ## Takes
/// - `counter` - Computes the ahead/behind counts.
/// - `subject` - The branch to compare.
/// - `reference` - The ref to compare against, if any.
/// - `column` - Whether the reference is displayed in its own column.
pub async fn compare<C: RevisionCounter>(
    counter: &C,
    subject: &str,
    reference: Option<&str>,
    column: ReferenceColumn,
) -> Comparison {
    let shown = |reference: Reference| (column == ReferenceColumn::Shown).then_some(reference);

    let Some(reference) = reference else {
        return Comparison {
            branch: subject.to_string(),
            current: false,
            reference: shown(Reference::Absent),
            counts: Counts::Blank,
        };
    };

    let (reference, counts) = match counter.count(reference, subject).await {
        Ok(counts) => (Reference::Present(reference.to_string()), Counts::Known(counts)),
        Err(e) => match column {
            ReferenceColumn::Shown => {
                debug!(branch = subject, reference, "reference is gone: {}", e);
                (Reference::Gone(reference.to_string()), Counts::Blank)
            }
            ReferenceColumn::Hidden => {
                warn!(branch = subject, reference, "failed to compare: {}", e);
                (Reference::Present(reference.to_string()), Counts::Unknown)
            }
        },
    };

    Comparison {
        branch: subject.to_string(),
        current: false,
        reference: shown(reference),
        counts,
    }
}

/// A row of a [Table].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Row {
    Branch(Comparison),
    /// A listing line that could not be parsed, shown as-is.
    Malformed(MalformedLine),
}

/// The comparison of every shown branch for one [ListingMode].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Table {
    pub mode: ListingMode,
    pub rows: Vec<Row>,
    /// The number of branches hidden as stale or trashed.
    pub hidden: usize,
}

impl Table {
    /// Filters and compares a branch listing, one branch at a time, in listing order.
    ///
    /// [ListingMode::Local] compares every branch against the policy's base branch.
    /// [ListingMode::Remote] compares every branch against its upstream.
    pub async fn build<C: RevisionCounter>(
        mode: ListingMode,
        listed: Vec<ListedBranch>,
        policy: &RenderPolicy,
        current: Option<&str>,
        now: DateTime<Utc>,
        counter: &C,
    ) -> Self {
        let mut filter = StaleFilter::new(policy, current, now);
        let mut rows = Vec::with_capacity(listed.len());

        for entry in listed {
            let record = match entry {
                Ok(record) => record,
                Err(malformed) => {
                    warn!("malformed branch listing line: {}", malformed);
                    rows.push(Row::Malformed(malformed));
                    continue;
                }
            };
            if !filter.admit(&record) {
                continue;
            }

            let (reference, column) = match mode {
                ListingMode::Local => (Some(policy.base.as_str()), ReferenceColumn::Hidden),
                ListingMode::Remote => (record.upstream.as_deref(), ReferenceColumn::Shown),
            };
            let comparison = compare(counter, &record.name, reference, column).await;
            rows.push(Row::Branch(Comparison {
                current: current == Some(record.name.as_str()),
                ..comparison
            }));
        }

        Self {
            mode,
            rows,
            hidden: filter.hidden(),
        }
    }

    /// Renders the table as Markdown, one line per row.
    pub fn to_markdown(&self) -> String {
        let (header, separator, columns) = match self.mode {
            ListingMode::Local => ("Branch | Behind | Ahead", "-------|-------:|:-----", 3),
            ListingMode::Remote => (
                "Branch | Remote | Behind | Ahead",
                "-------|--------|-------:|:-----",
                4,
            ),
        };

        let mut out = format!("{}\n{}\n", header, separator);
        for row in &self.rows {
            let cells = match row {
                Row::Branch(comparison) => comparison_cells(comparison),
                Row::Malformed(malformed) => std::iter::once(escape_cell(&malformed.0))
                    .chain(std::iter::repeat(String::new()).take(columns - 1))
                    .collect(),
            };
            out.push_str(cells.iter().join(" | ").trim_end());
            out.push('\n');
        }
        out
    }
}

/// Escapes `|`, which git allows in branch names, so it does not split the cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn comparison_cells(comparison: &Comparison) -> Vec<String> {
    let mut cells = Vec::with_capacity(4);

    let branch = escape_cell(&comparison.branch);
    cells.push(if comparison.current {
        format!("{0}{1}{0}", STRONG_MARKER, branch)
    } else {
        branch
    });

    if let Some(reference) = &comparison.reference {
        cells.push(match reference {
            Reference::Absent => String::new(),
            Reference::Present(name) => escape_cell(name),
            Reference::Gone(name) => format!("{0}{1}{0}", STRIKE_MARKER, escape_cell(name)),
        });
    }

    match comparison.counts {
        Counts::Known(AheadBehind { behind, ahead }) => {
            cells.push(behind.to_string());
            cells.push(ahead.to_string());
        }
        Counts::Unknown => {
            cells.push(UNKNOWN_COUNT.to_string());
            cells.push(UNKNOWN_COUNT.to_string());
        }
        Counts::Blank => {
            cells.push(String::new());
            cells.push(String::new());
        }
    }

    cells
}

/// The summary line for branches hidden across `tables`.
///
/// When the tables disagree on the number of hidden branches, each count is reported.
pub fn stale_summary(tables: &[Table]) -> Option<String> {
    if tables.iter().all(|table| table.hidden == 0) {
        return None;
    }

    if tables.iter().map(|table| table.hidden).all_equal() {
        return tables
            .first()
            .map(|table| format!("({} stale branches not shown.)", table.hidden));
    }

    let counts = tables
        .iter()
        .map(|table| {
            let kind = match table.mode {
                ListingMode::Local => "local",
                ListingMode::Remote => "remote",
            };
            format!("{} stale {} branches", table.hidden, kind)
        })
        .join(" and ");
    Some(format!("({} not shown.)", counts))
}

/// The complete output of a run: every rendered table and the stale summary.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Report {
    pub tables: Vec<Table>,
}

impl Report {
    /// Renders the tables, separated by blank lines, followed by the stale summary.
    pub fn to_markdown(&self) -> String {
        let mut out = self.tables.iter().map(Table::to_markdown).join("\n");
        if let Some(summary) = stale_summary(&self.tables) {
            out.push('\n');
            out.push_str(&summary);
            out.push('\n');
        }
        out
    }
}
