mod commands;
mod terminal;

use anyhow::Context;

use commands::{CommandLine, Commands, Output, cli, configure, get, inventory, run};
use fleetr_common::config::Config;
use fleetr_common::info;
use fleetr_core::{Filter, Fleet};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();
    let cfg = load_config(&commands)?;

    logging::init_logging(&cfg.logging.level)?;
    print::banner(cfg.output.no_banner || commands.json, cfg.output.quiet);

    let out = Output {
        json: commands.json,
        quiet: cfg.output.quiet,
        raise_on_error: cfg.raise_on_error,
    };

    if out.quiet == 0 && !out.json {
        print_settings(&cfg);
    }

    let fleet = Fleet::from_config(cfg).context("loading inventory")?;
    let filter = Filter::from(commands.filters);
    let mut subset = fleet.filter(&filter);
    if commands.strict {
        subset = subset.require_non_empty()?;
    }
    if out.quiet == 0 && !out.json {
        info!("{} of {} devices selected ({})", subset.len(), fleet.inventory().len(), filter);
    }

    match commands.command {
        Commands::Inventory => inventory::inventory(&subset, out),
        Commands::Get { getters } => get::get(&fleet, &subset, getters, out).await,
        Commands::Cli { commands } => cli::cli(&fleet, &subset, commands, out).await,
        Commands::Configure {
            configuration,
            file,
            replace,
            commit,
            check,
        } => {
            let args = configure::ConfigureArgs {
                configuration,
                file,
                replace,
                commit,
                check,
            };
            configure::configure(&fleet, &subset, args, out).await
        }
        Commands::Run { plan } => run::run(&fleet, &subset, &plan, out).await,
    }
}

/// File and environment first, then command line flags on top.
fn load_config(commands: &CommandLine) -> anyhow::Result<Config> {
    let mut cfg = Config::load_or_default(commands.config.as_deref()).context("loading configuration")?;

    if commands.dry_run {
        cfg.dry_run = true;
    }
    if let Some(workers) = commands.workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        cfg.runner.num_workers = workers;
    }
    if commands.quiet > 0 {
        cfg.output.quiet = commands.quiet;
    }
    if commands.no_banner {
        cfg.output.no_banner = true;
    }
    Ok(cfg)
}

fn print_settings(cfg: &Config) {
    const KEY_WIDTH: usize = 9;
    print::header("settings", cfg.output.quiet);
    print::aligned_line("Inventory", cfg.inventory.path.display().to_string(), KEY_WIDTH);
    print::aligned_line("Workers", cfg.runner.num_workers.to_string(), KEY_WIDTH);
    print::aligned_line("Dry run", if cfg.dry_run { "yes" } else { "no" }, KEY_WIDTH);
}
