//! Logger setup for the host process.
//!
//! Long-running commands log to the terminal and the log file. Commands whose
//! stdout is the product (`list`, `open`, `check`) log to the file only.

use std::path::Path;

use log::LevelFilter;
use notice_logging::LogDestination;

use super::cli::Command;

pub fn init(command: &Command, log_file: &Path, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    notice_logging::initialize(destination(command, log_file), level);
}

fn destination(command: &Command, log_file: &Path) -> LogDestination {
    match command {
        Command::Watch => LogDestination::Both(log_file.to_path_buf()),
        Command::Check | Command::List { .. } | Command::Open { .. } => {
            LogDestination::File(log_file.to_path_buf())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_watch_logs_to_the_terminal() {
        let path = Path::new("watch.log");
        assert_eq!(
            destination(&Command::Watch, path),
            LogDestination::Both(path.to_path_buf())
        );
        assert_eq!(
            destination(&Command::Open { id: "A".into() }, path),
            LogDestination::File(path.to_path_buf())
        );
    }
}
