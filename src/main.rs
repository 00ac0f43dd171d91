use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use remotify::cli::{load_config, Args, Command};
use remotify::logging::{init_logging, LoggingConfig};
use remotify::orchestrator::Orchestrator;
use remotify::platform::HttpPlatform;
use remotify::pool::AbortSignal;
use remotify::report::RunReport;

const FATAL_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(LoggingConfig::resolve(
        args.log_level.as_deref(),
        args.json_logs,
    ));

    debug!("Arguments: {:?}", args);

    let exit_code = match run(&args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            FATAL_EXIT_CODE
        }
    };

    process::exit(exit_code);
}

async fn run(args: &Args) -> Result<i32> {
    let config = load_config(&args.config)?;
    info!(version = %config.version, account = %config.account, "configuration loaded");

    let platform = HttpPlatform::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.account.clone(),
        config.request_timeout,
    )
    .context("could not build platform client")?;

    let abort = AbortSignal::new();
    spawn_abort_listener(abort.clone());

    let orchestrator = Orchestrator::new(Arc::new(platform), config, abort);
    let report = RunReport::new();

    match args.command {
        Command::Migrate => orchestrator.migrate(&report).await?,
        Command::Manifests => orchestrator.update_manifests(&report).await?,
        Command::Mirror => orchestrator.mirror(&report).await?,
        Command::Inventory => {
            for inventory in orchestrator.inventory(&report).await {
                println!(
                    "{}: {} pipelines, {} templates, {} services, {} environments, {} service overrides",
                    inventory.scope,
                    inventory.pipelines,
                    inventory.templates,
                    inventory.services,
                    inventory.environments,
                    inventory.service_overrides
                );
            }
        }
    }

    print_report(&report);

    if let Some(path) = &args.report {
        let json = report.to_json().context("could not serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("could not write report to `{:?}`", path))?;
        info!(path = ?path, "report written");
    }

    Ok(report.exit_code())
}

fn spawn_abort_listener(abort: AbortSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight calls");
            abort.abort();
        }
    });
}

fn print_report(report: &RunReport) {
    for outcome in report.outcomes() {
        match &outcome.detail {
            Some(detail) => println!("{}: {:?} ({})", outcome.entity, outcome.status, detail),
            None => println!("{}: {:?}", outcome.entity, outcome.status),
        }
    }

    for failure in report.scope_failures() {
        println!(
            "scope {} could not list {}: {}",
            failure.scope, failure.resource, failure.detail
        );
    }

    let summary = report.summary();
    println!(
        "moved: {}, updated: {}, already remote: {}, downloaded: {}, folders skipped: {}, failed: {}, not attempted: {}, scope failures: {}",
        summary.moved,
        summary.updated,
        summary.already_skipped,
        summary.downloaded,
        summary.folder_skipped,
        summary.failed,
        summary.not_attempted,
        summary.scope_failures
    );

    if report.is_interrupted() {
        warn!(
            not_attempted = summary.not_attempted,
            "run was interrupted; rerun to process the remaining entities"
        );
    }
}
