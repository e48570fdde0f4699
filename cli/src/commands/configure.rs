use std::path::PathBuf;

use anyhow::Context;

use fleetr_core::{Fleet, Selection, TaskSpec};
use fleetr_plugins::Configure;

use crate::commands::{Output, execute};

pub struct ConfigureArgs {
    pub configuration: Option<String>,
    pub file: Option<PathBuf>,
    pub replace: bool,
    pub commit: bool,
    pub check: bool,
}

pub async fn configure(fleet: &Fleet, subset: &Selection<'_>, args: ConfigureArgs, out: Output) -> anyhow::Result<()> {
    let configuration = match (args.configuration, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading configuration from {}", path.display()))?,
        (None, None) => anyhow::bail!("no configuration given, pass TEXT or --file"),
    };

    let task = Configure {
        configuration,
        replace: args.replace,
        dry_run: dry_run_override(args.commit, args.check),
    };
    let spec = TaskSpec::new("configure").then(task);
    execute(fleet, subset, &spec, out).await
}

/// `--commit` forces a commit, `--check` forces a dry run, neither keeps the run default.
fn dry_run_override(commit: bool, check: bool) -> Option<bool> {
    match (commit, check) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
