//! Thin command-line surface over the orchestrator.
//!
//! Exit status is 0 on completion even when zero results were found;
//! non-zero only for unrecoverable setup failures (config, definitions
//! directory, storage location).

use clap::{Parser, Subcommand};
use jobtrail_core::{AppConfig, ProviderId};
use jobtrail_engine::{render_candidates, Orchestrator, ProviderRunReport};
use jobtrail_provider::{ProviderLoader, ProviderRegistry};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "jobtrail",
    about = "Track job postings across careers sites and reconcile applications",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape current listings and merge them into the store
    Scrape {
        /// Only this provider (default: all configured providers)
        #[arg(long)]
        provider: Option<String>,
        /// Stop after this many postings per provider
        #[arg(long)]
        max: Option<usize>,
    },
    /// Reconcile applied status, deep-probing candidates unless skipped
    Update {
        /// Only this provider (default: all configured providers)
        #[arg(long)]
        provider: Option<String>,
        /// Skip the slow per-job status probe
        #[arg(long)]
        skip_probe: bool,
    },
    /// Filter the store and print the candidate table
    Report {
        /// Only this provider (default: all configured providers)
        #[arg(long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // a missing .env file is fine; anything else is worth mentioning
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {e}");
        }
    }

    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env()?;
    let data_dir = config.resolve_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let loader = match &config.storage.definitions_dir {
        Some(dir) => ProviderLoader::new(dir)?,
        None => ProviderLoader::with_default_dir()?,
    };
    let registry = ProviderRegistry::load_from(&loader)?;

    let orchestrator = Orchestrator::new(
        registry,
        data_dir,
        config.browser.clone(),
        config.reconcile.clone(),
    );

    match cli.command {
        Command::Scrape { provider, max } => {
            let provider = parse_provider(provider)?;
            let reports = orchestrator.scrape(provider.as_ref(), max).await?;
            print_reports(&reports);
        }
        Command::Update {
            provider,
            skip_probe,
        } => {
            let provider = parse_provider(provider)?;
            let reports = orchestrator.update(provider.as_ref(), skip_probe).await?;
            print_reports(&reports);
        }
        Command::Report { provider } => {
            let provider = parse_provider(provider)?;
            for (definition, rows) in orchestrator.candidates(provider.as_ref())? {
                println!("{}", render_candidates(definition.name(), &rows));
            }
        }
    }

    Ok(())
}

fn parse_provider(arg: Option<String>) -> Result<Option<ProviderId>, Box<dyn std::error::Error>> {
    Ok(arg.map(ProviderId::new).transpose()?)
}

fn print_reports(reports: &[ProviderRunReport]) {
    for report in reports {
        info!(
            provider = %report.provider,
            fetched = report.fetched,
            added = report.added,
            newly_applied = report.newly_applied,
            probed = report.probed,
            backfilled = report.backfilled,
            "run finished"
        );

        if report.auth_skipped {
            println!(
                "{}: authentication unavailable; applied sync and probes were skipped",
                report.provider
            );
        }
        for error in &report.errors {
            println!("{}: degraded: {error}", report.provider);
        }
        println!(
            "{}: {} fetched, {} new, {} newly applied, {} backfilled",
            report.provider, report.fetched, report.added, report.newly_applied, report.backfilled
        );
    }
}
