//! Utilities for interacting with `git` repositories for the `git-branches` application.
//!
//! All repository data comes from the text output of the `git` executable.

use crate::{
    branch::{parse_branch_line, parse_left_right, AheadBehind, ListedBranch, ListingMode},
    errors::{BranchesError, BranchesResult},
};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, trace};

mod locate;
pub use locate::locate_repository;

/// The order in which `git for-each-ref` lists branches.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum BranchSort {
    /// `git`'s default order, by refname.
    #[default]
    Refname,
    /// Most recently committed first.
    Recent,
}

/// Computes ahead/behind counts between two refs.
pub trait RevisionCounter {
    /// Counts the commits that separate `branch` from `reference`.
    ///
    /// ## Takes
    /// - `reference` - The ref to compare against (the left side).
    /// - `branch` - The branch being compared (the right side).
    ///
    /// ## Returns
    /// - `Result<AheadBehind>` - The counts, or an error if either ref does not resolve.
    async fn count(&self, reference: &str, branch: &str) -> BranchesResult<AheadBehind>;
}

/// A handle on a repository that runs `git` with the repository root as its working directory.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Creates a [Git] handle for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs `git` with the given arguments and returns its standard output.
    pub async fn run(&self, args: &[&str]) -> BranchesResult<String> {
        let joined = args.join(" ");
        debug!(root = %self.root.display(), "running `git {}`", joined);

        let output = Command::new("git")
            .current_dir(&self.root)
            .args(args)
            .output()
            .await
            .map_err(|source| BranchesError::Spawn {
                args: joined.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BranchesError::GitCommand {
                args: joined,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!("`git {}` printed {} bytes", joined, stdout.len());
        Ok(stdout)
    }

    /// Fetches from every remote and prunes remote-tracking branches that no longer exist.
    pub async fn update_remotes(&self) -> BranchesResult<()> {
        self.run(&["remote", "update", "--prune"]).await.map(|_| ())
    }

    /// Returns the name of the checked out branch, or [None] when `HEAD` is detached.
    pub async fn current_branch(&self) -> BranchesResult<Option<String>> {
        match self
            .run(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await
        {
            Ok(name) => Ok(Some(name.trim().to_string())),
            // `--quiet` makes a detached HEAD a silent exit with status 1.
            Err(BranchesError::GitCommand { status, .. }) if status.code() == Some(1) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Lists the local branches of the repository.
    ///
    /// ## Takes
    /// - `mode` - Selects the fields requested from `git for-each-ref`.
    /// - `sort` - The listing order, which is preserved in the result.
    ///
    /// ## Returns
    /// - `Result<Vec<ListedBranch>>` - One entry per line. Lines that fail to parse are kept as
    ///   [MalformedLine](crate::branch::MalformedLine)s rather than failing the listing.
    pub async fn list_branches(
        &self,
        mode: ListingMode,
        sort: BranchSort,
    ) -> BranchesResult<Vec<ListedBranch>> {
        let mut args = vec!["for-each-ref", mode.ref_format()];
        if sort == BranchSort::Recent {
            args.push("--sort=-committerdate");
        }
        args.push("refs/heads");

        let output = self.run(&args).await?;
        Ok(output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_branch_line(mode, line))
            .collect())
    }
}

impl RevisionCounter for Git {
    async fn count(&self, reference: &str, branch: &str) -> BranchesResult<AheadBehind> {
        let range = format!("{}...{}", reference, branch);
        let output = self
            .run(&["rev-list", "--count", "--left-right", range.as_str()])
            .await?;
        parse_left_right(&output).ok_or(BranchesError::MalformedCounts(output))
    }
}
