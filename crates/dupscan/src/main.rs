//! Dupscan CLI - duplicate issue detection pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dupscan::{DupscanPipeline, LabelFilter, MarkdownReport, RangeSpec, ScanConfig};
use oracle::AnthropicOracle;
use tracker::{GitHubTracker, IssueState, IssueTracker};

/// Dupscan CLI - detect near-duplicate issue reports with an AI oracle.
#[derive(Parser)]
#[command(name = "dupscan")]
#[command(about = "Detect near-duplicate issue reports")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan issues for duplicates and emit a markdown report
    Scan {
        /// Repository in owner/repo form
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,

        /// Issue range: current, all, N-M, or N
        #[arg(long, default_value = "current")]
        range: String,

        /// Subject issue number for the current range
        #[arg(long, env = "GITHUB_ISSUE_NUMBER")]
        issue: Option<u64>,

        /// Explicit range start (overrides --range together with --end-issue)
        #[arg(long, requires = "end_issue")]
        start_issue: Option<u64>,

        /// Explicit range end
        #[arg(long, requires = "start_issue")]
        end_issue: Option<u64>,

        /// Cap for the all range
        #[arg(long, default_value = "50")]
        max_issues: usize,

        /// Candidates fetched per label pass
        #[arg(long, default_value = "30")]
        count: u32,

        /// Only consider candidates updated at or after this ISO timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Label filter: auto, none, or a comma-separated list
        #[arg(long, default_value = "auto")]
        labels: LabelFilter,

        /// Candidate issue state: open, closed, or all
        #[arg(long, default_value = "all")]
        state: IssueState,

        /// Stop batching once this many duplicates are accepted
        #[arg(long, default_value = "3")]
        max_duplicates: usize,

        /// Per-candidate token budget (clamped to 100-5000)
        #[arg(long, default_value = "1000")]
        tokens_per_issue: u32,

        /// Skip the large-model confirmation stage
        #[arg(long)]
        no_confirm: bool,

        /// Apply the duplicate label to subjects with confirmed findings
        #[arg(long)]
        label_as_duplicate: bool,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when new duplicates are found (for CI gating)
        #[arg(long)]
        fail_on_duplicates: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("dupscan=debug,oracle=debug,tracker=debug,info")
    } else {
        EnvFilter::new("dupscan=info,warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Scan {
            repo,
            range,
            issue,
            start_issue,
            end_issue,
            max_issues,
            count,
            since,
            labels,
            state,
            max_duplicates,
            tokens_per_issue,
            no_confirm,
            label_as_duplicate,
            output,
            fail_on_duplicates,
        } => {
            let spec = match (start_issue, end_issue) {
                (Some(start), Some(end)) => RangeSpec::bounded(start, end)?,
                _ => RangeSpec::parse(&range, max_issues)?,
            };

            let config = ScanConfig {
                count,
                since,
                labels,
                state,
                max_duplicates,
                tokens_per_issue,
                confirm_duplicates: !no_confirm,
                label_as_duplicate,
                max_issues,
            };

            let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN is not set")?;
            let tracker = Arc::new(GitHubTracker::new(&token, &repo)?);
            let oracle = Arc::new(AnthropicOracle::from_env()?);

            // The current range needs the run's bound issue as context.
            let context = match (&spec, issue) {
                (RangeSpec::Current, Some(number)) => tracker.get_issue(number).await?,
                _ => None,
            };

            let pipeline = DupscanPipeline::new(tracker, oracle, config)?;
            let report = pipeline.run(&spec, context.as_ref()).await?;

            let mut sink = MarkdownReport::new();
            report.render(&mut sink);
            let markdown = sink.into_string();

            match output {
                Some(path) => {
                    std::fs::write(&path, &markdown)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Wrote report");
                }
                None => print!("{markdown}"),
            }

            if fail_on_duplicates && report.newly_found() > 0 {
                bail!("found {} new duplicate issue(s)", report.newly_found());
            }
            Ok(())
        }
    }
}
