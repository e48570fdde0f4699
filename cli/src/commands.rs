pub mod cli;
pub mod configure;
pub mod get;
pub mod inventory;
pub mod run;

use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Instrument;

use fleetr_common::models::Getter;
use fleetr_common::{error, warn};
use fleetr_core::{FieldFilter, Fleet, Selection, TaskSpec};

use crate::terminal::{print, progress::RunProgress, results};

#[derive(Parser)]
#[command(name = "fleetr", version)]
#[command(about = "Run tasks against a fleet of network devices.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file [default: ./fleetr.toml when present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Select devices by FIELD=VALUE[,VALUE] (name, hostname, platform, group, data.KEY); repeat to narrow
    #[arg(short = 'f', long = "filter", global = true)]
    pub filters: Vec<FieldFilter>,

    /// Fail when the filters match no device
    #[arg(long, global = true)]
    pub strict: bool,

    /// Report configuration changes without committing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Devices handled at the same time
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Print the results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Less output, repeat for even less
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the selected devices
    #[command(alias = "inv")]
    Inventory,
    /// Retrieve structured state from the selected devices
    #[command(alias = "g")]
    Get {
        /// Getters to run (facts, interfaces)
        #[arg(value_delimiter = ',', default_value = "facts")]
        getters: Vec<Getter>,
    },
    /// Send raw commands to the selected devices
    #[command(alias = "c")]
    Cli {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Push configuration to the selected devices (merged by default)
    #[command(alias = "conf")]
    Configure {
        /// Configuration text
        #[arg(required_unless_present = "file")]
        configuration: Option<String>,
        /// Read the configuration from a file
        #[arg(long, conflicts_with = "configuration")]
        file: Option<PathBuf>,
        /// Replace the whole configuration instead of merging
        #[arg(long)]
        replace: bool,
        /// Commit even when the run defaults to dry run
        #[arg(long, conflicts_with = "check")]
        commit: bool,
        /// Only show the diff
        #[arg(long)]
        check: bool,
    },
    /// Run a plan file
    #[command(alias = "r")]
    Run { plan: PathBuf },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// How results are reported once a run is over.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: u8,
    pub raise_on_error: bool,
}

/// Runs `spec` over `subset`, then presents or serializes the results.
pub async fn execute(
    fleet: &Fleet,
    subset: &Selection<'_>,
    spec: &TaskSpec,
    out: Output,
) -> anyhow::Result<()> {
    if subset.is_empty() {
        print::header("no devices selected", out.quiet);
        if out.quiet == 0 {
            print::no_results();
        }
        return Ok(());
    }

    let progress = RunProgress::start(subset.len(), spec.name(), !out.json && out.quiet < 2);
    let started = Instant::now();
    let results = fleet
        .run_with_progress(subset, spec, |finished| progress.advance(finished))
        .instrument(progress.span().clone())
        .await;
    drop(progress);

    if out.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        results::present(&results, started.elapsed(), out.quiet);
        let failed = results.failed_devices();
        match (failed.is_empty(), out.raise_on_error) {
            (true, _) => {}
            (false, true) => error!("{} device(s) failed: {}", failed.len(), failed.join(", ")),
            (false, false) => warn!("{} device(s) failed: {}", failed.len(), failed.join(", ")),
        }
    }

    if out.raise_on_error {
        results.raise_on_error()?;
    }
    Ok(())
}
