use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use notice_engine::WatcherSettings;
use notice_logging::{notice_info, DEFAULT_LOG_FILE};
use serde::Deserialize;

use super::cli::Cli;

const DEFAULT_STATE_DIR: &str = "./.notice_watch";

/// Contents of the optional RON configuration file. Every field may be
/// left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub watcher: WatcherSettings,
    pub state_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// Settings after defaults, the config file and CLI flags are layered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub watcher: WatcherSettings,
    pub state_dir: PathBuf,
    pub log_file: PathBuf,
    pub verbose: bool,
}

pub fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn resolve(cli: &Cli) -> anyhow::Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => load_file(path)?,
        None => FileConfig::default(),
    };
    Ok(layer(file, cli))
}

fn layer(file: FileConfig, cli: &Cli) -> AppConfig {
    let mut watcher = file.watcher;
    if let Some(url) = &cli.list_url {
        watcher.list_url = url.clone();
    }
    AppConfig {
        watcher,
        state_dir: cli
            .state_dir
            .clone()
            .or(file.state_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        log_file: cli
            .log_file
            .clone()
            .or(file.log_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        verbose: cli.verbose,
    }
}

impl AppConfig {
    pub fn log_summary(&self) {
        notice_info!(
            "Watching {} every {:?}; state in {}",
            self.watcher.list_url,
            self.watcher.poll_interval,
            self.state_dir.display()
        );
    }
}
