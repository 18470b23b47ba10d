//! The CLI for `git-branches`.

use crate::{
    branch::ListingMode,
    constants::DEFAULT_BASE,
    git::{locate_repository, BranchSort, Git},
    markdown,
    policy::RenderPolicy,
    table::{Report, Table},
};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    parser::ValueSource,
    ArgAction, CommandFactory, FromArgMatches, Parser,
};
use std::{
    env,
    ffi::OsString,
    io::{self, IsTerminal, Write},
};
use tracing::{debug, info, warn, Level};

/// Long flags that are also accepted with a single dash, e.g. `-base main`.
const SINGLE_DASH_LONGS: [&str; 2] = ["base", "all"];

const ABOUT: &str =
    "git-branches prints how far each branch is behind and ahead of the base branch and of its upstream.";

/// The CLI application for `git-branches`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(name = "git-branches", about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-3)
    #[arg(short, action = ArgAction::Count)]
    pub v: u8,
    /// The branch to compare local branches against [default: master]
    #[arg(short, long, env = "GIT_BRANCHES_BASE")]
    pub base: Option<String>,
    /// Show stale and trashed branches
    #[arg(short, long)]
    pub all: bool,
    /// Only compare branches against the base branch
    #[arg(long, conflicts_with = "remote")]
    pub local: bool,
    /// Only compare branches against their upstream
    #[arg(long)]
    pub remote: bool,
    /// List the most recently committed branches first
    #[arg(long)]
    pub recent: bool,
    /// Do not run `git remote update --prune` before comparing against upstreams
    #[arg(long)]
    pub no_update: bool,
    /// Whether `--base` was given on the command line, rather than through the environment.
    #[arg(skip)]
    pub base_given: bool,
}

impl Cli {
    /// Parses the CLI arguments, accepting single-dash spellings of `--base` and `--all`.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = Self::command().try_get_matches_from(normalize_args(args))?;
        let mut cli = Self::from_arg_matches(&matches)?;
        cli.base_given = matches.value_source("base") == Some(ValueSource::CommandLine);
        Ok(cli)
    }

    /// Run the CLI application with the given arguments.
    pub async fn run(self) -> Result<()> {
        let cwd = env::current_dir().context("Failed to read the current directory.")?;
        let git = Git::new(locate_repository(&cwd)?);
        debug!(root = %git.root().display(), "found repository");

        if self.remote && self.base_given {
            warn!("--base is ignored when --remote is given");
        }

        let modes = self.modes();
        if modes.contains(&ListingMode::Remote) && !self.no_update {
            info!("updating remotes");
            if let Err(e) = git.update_remotes().await {
                warn!("git remote update failed: {}", e);
            }
        }

        let policy = self.policy();
        let current = git.current_branch().await?;
        let now = Utc::now();

        let mut report = Report {
            tables: Vec::with_capacity(modes.len()),
        };
        for mode in modes {
            let listed = git.list_branches(mode, self.sort()).await?;
            debug!(?mode, branches = listed.len(), "listed branches");
            report
                .tables
                .push(Table::build(mode, listed, &policy, current.as_deref(), now, &git).await);
        }

        let mut stdout = io::stdout().lock();
        let formatted = markdown::format(&report.to_markdown(), stdout.is_terminal())?;
        stdout
            .write_all(formatted.as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write to stdout.")?;

        Ok(())
    }

    /// The tables to render, in order.
    fn modes(&self) -> Vec<ListingMode> {
        match (self.local, self.remote) {
            (true, _) => vec![ListingMode::Local],
            (_, true) => vec![ListingMode::Remote],
            _ => vec![ListingMode::Local, ListingMode::Remote],
        }
    }

    fn sort(&self) -> BranchSort {
        if self.recent {
            BranchSort::Recent
        } else {
            BranchSort::Refname
        }
    }

    /// Builds the [RenderPolicy] for the run.
    fn policy(&self) -> RenderPolicy {
        RenderPolicy {
            base: self
                .base
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE.to_string()),
            show_all: self.all,
        }
    }

    /// Initializes the tracing subscriber. Logs go to stderr, keeping stdout for the report.
    ///
    /// # Returns
    /// - `Result<()>` - Ok if successful, Err otherwise.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(match self.v {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }
}

/// Rewrites `-base`, `-base=<name>` and `-all` to their double-dash forms, so they are not
/// read as bundled short flags (`-b ase`).
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(flag) = arg.to_str().and_then(|a| a.strip_prefix('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if SINGLE_DASH_LONGS.contains(&name) {
                OsString::from(format!("-{}", arg.to_string_lossy()))
            } else {
                arg
            }
        })
        .collect()
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    let accent = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    clap::builder::Styles::styled()
        .usage(accent)
        .header(accent)
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
}
