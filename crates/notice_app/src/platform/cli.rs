use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "notice_watch")]
#[command(about = "Watch the bizinfo.go.kr announcement board and summarize new postings")]
#[command(version)]
pub struct Cli {
    /// RON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted state document
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Listing page to watch
    #[arg(long, global = true)]
    pub list_url: Option<String>,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll now and on every interval until Ctrl-C
    ///
    /// JSON requests such as {"type":"manual-check"} may also be written to
    /// stdin, one per line; each gets a JSON response line.
    Watch,

    /// Run a single manual check
    Check,

    /// Show the most recent stored announcements
    List {
        /// Emit an HTML fragment instead of plain text
        #[arg(long)]
        html: bool,

        /// Number of announcements to show
        #[arg(long, default_value_t = notice_core::DISPLAY_LIMIT)]
        limit: usize,
    },

    /// Open a stored announcement in the browser
    Open {
        /// Announcement id (pblancId)
        id: String,
    },
}
