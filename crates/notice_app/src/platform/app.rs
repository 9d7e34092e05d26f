use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use notice_engine::{
    run_schedule, FileStore, ReqwestFetcher, Watcher, WatcherParts, WatcherRequest,
    WatcherResponse,
};
use notice_logging::{notice_info, notice_warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::cli::{Cli, Command};
use super::config::{self, AppConfig};
use super::logging;
use super::notifier::{BrowserOpener, TerminalNotifier};
use super::render;

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::resolve(&cli)?;
    logging::init(&cli.command, &config.log_file, config.verbose);
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let result = runtime.block_on(run_command(cli.command, config));
    // a pending stdin read must not hold up exit
    runtime.shutdown_background();
    result
}

async fn run_command(command: Command, config: AppConfig) -> anyhow::Result<()> {
    let watcher = Arc::new(build_watcher(&config)?);
    match command {
        Command::Watch => watch(watcher, &config).await,
        Command::Check => respond(&watcher, WatcherRequest::ManualCheck).await,
        Command::Open { id } => respond(&watcher, WatcherRequest::NotificationClicked { id }).await,
        Command::List { html, limit } => {
            let records = watcher.cached_records()?;
            let output = if html {
                render::render_html(&records, limit)
            } else {
                render::render_text(&records, limit)
            };
            println!("{output}");
            Ok(())
        }
    }
}

fn build_watcher(config: &AppConfig) -> anyhow::Result<Watcher> {
    let store = FileStore::open(config.state_dir.clone())
        .with_context(|| format!("preparing state dir {}", config.state_dir.display()))?;
    notice_info!("State file: {}", store.path().display());
    let fetcher = ReqwestFetcher::new(config.watcher.fetch.clone())?;
    Ok(Watcher::new(
        config.watcher.clone(),
        WatcherParts {
            fetcher: Arc::new(fetcher),
            store: Arc::new(store),
            notifier: Arc::new(TerminalNotifier),
            opener: Arc::new(BrowserOpener),
        },
    ))
}

async fn respond(watcher: &Watcher, request: WatcherRequest) -> anyhow::Result<()> {
    let response = watcher.handle(request).await;
    println!("{}", serde_json::to_string(&response)?);
    if let Some(error) = response.error {
        anyhow::bail!(error);
    }
    Ok(())
}

async fn watch(watcher: Arc<Watcher>, config: &AppConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let schedule = tokio::spawn(run_schedule(
        watcher.clone(),
        config.watcher.poll_interval,
        cancel.clone(),
    ));
    let requests = tokio::spawn(serve_requests(watcher, cancel.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    notice_info!("Shutting down");
    cancel.cancel();
    schedule.await.context("scheduler task")?;
    requests.abort();
    Ok(())
}

/// Answers JSON requests written to stdin, one per line.
async fn serve_requests(watcher: Arc<Watcher>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                notice_warn!("Reading requests from stdin failed: {}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<WatcherRequest>(&line) {
            Ok(request) => watcher.handle(request).await,
            Err(err) => WatcherResponse::failed(format!("invalid request: {err}")),
        };
        match serde_json::to_string(&response) {
            Ok(json) => println!("{json}"),
            Err(err) => notice_warn!("Could not encode response: {}", err),
        }
    }
}
