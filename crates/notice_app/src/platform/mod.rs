//! Host process: command line, configuration, logging and user-facing output.
mod app;
mod cli;
mod config;
mod logging;
mod notifier;
mod render;

pub use app::run_app;
