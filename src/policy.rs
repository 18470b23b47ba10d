//! The display policy for a run, and the filter that hides stale and trashed branches.

use crate::{
    branch::BranchRecord,
    constants::{DEFAULT_BASE, STALE_AFTER_DAYS, TRASH_PREFIX},
};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Immutable settings shared by every stage of a run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderPolicy {
    /// The branch local branches are compared against.
    pub base: String,
    /// Disables hiding of stale and trashed branches.
    pub show_all: bool,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            show_all: false,
        }
    }
}

/// Decides which branches are shown, counting the ones it hides.
#[derive(Debug)]
pub struct StaleFilter<'a> {
    policy: &'a RenderPolicy,
    current: Option<&'a str>,
    now: DateTime<Utc>,
    hidden: usize,
}

impl<'a> StaleFilter<'a> {
    /// Creates a [StaleFilter].
    ///
    /// ## Takes
    /// - `policy` - The policy for the run.
    /// - `current` - The checked out branch, which is never hidden.
    /// - `now` - The instant branch ages are measured against.
    pub fn new(policy: &'a RenderPolicy, current: Option<&'a str>, now: DateTime<Utc>) -> Self {
        Self {
            policy,
            current,
            now,
            hidden: 0,
        }
    }

    /// Returns `true` if `record` should be shown. Hidden records are counted.
    pub fn admit(&mut self, record: &BranchRecord) -> bool {
        if self.policy.show_all
            || self.current == Some(record.name.as_str())
            || record.name == self.policy.base
        {
            return true;
        }

        let trashed = record.name.starts_with(TRASH_PREFIX);
        let stale = self
            .now
            .signed_duration_since(record.committed_at.with_timezone(&Utc))
            >= Duration::days(STALE_AFTER_DAYS);
        if trashed || stale {
            debug!(branch = %record.name, trashed, stale, "hiding branch");
            self.hidden += 1;
            return false;
        }

        true
    }

    /// The number of branches hidden so far.
    pub fn hidden(&self) -> usize {
        self.hidden
    }
}

#[cfg(test)]
mod test {
    use super::{RenderPolicy, StaleFilter};
    use crate::branch::BranchRecord;
    use chrono::{DateTime, Duration, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(name: &str, age: Duration) -> BranchRecord {
        BranchRecord {
            name: name.to_string(),
            upstream: None,
            committed_at: (now() - age).into(),
        }
    }

    #[test]
    fn two_week_boundary_is_stale() {
        let policy = RenderPolicy::default();
        let mut filter = StaleFilter::new(&policy, None, now());

        assert!(!filter.admit(&record("old", Duration::days(14))));
        assert!(filter.admit(&record("fresh", Duration::days(14) - Duration::seconds(1))));
        assert_eq!(filter.hidden(), 1);
    }

    #[test]
    fn trashed_branches_are_hidden() {
        let policy = RenderPolicy::default();
        let mut filter = StaleFilter::new(&policy, None, now());

        assert!(!filter.admit(&record("trash/old", Duration::hours(1))));
        assert!(filter.admit(&record("trashy", Duration::hours(1))));
        assert_eq!(filter.hidden(), 1);
    }

    #[test]
    fn current_and_base_are_never_hidden() {
        let policy = RenderPolicy {
            base: "trash/base".to_string(),
            show_all: false,
        };
        let mut filter = StaleFilter::new(&policy, Some("trash/current"), now());

        assert!(filter.admit(&record("trash/current", Duration::days(365))));
        assert!(filter.admit(&record("trash/base", Duration::days(365))));
        assert_eq!(filter.hidden(), 0);
    }

    #[test]
    fn show_all_hides_nothing() {
        let policy = RenderPolicy {
            show_all: true,
            ..Default::default()
        };
        let mut filter = StaleFilter::new(&policy, None, now());

        assert!(filter.admit(&record("trash/old", Duration::days(30))));
        assert!(filter.admit(&record("ancient", Duration::days(3650))));
        assert_eq!(filter.hidden(), 0);
    }
}
