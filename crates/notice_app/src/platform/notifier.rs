use std::io;

use notice_core::{Indicator, Notification};
use notice_engine::{Notifier, UrlOpener};
use notice_logging::{notice_info, notice_warn};

/// Prints notifications and indicator changes to stdout.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        notice_info!("Notifying about {}", notification.id);
        println!("{}", format_notification(notification));
    }

    fn set_indicator(&self, indicator: Indicator) {
        match badge_text(indicator) {
            Some(text) => println!("[{text}]"),
            None => notice_info!("Indicator cleared"),
        }
        if indicator == Indicator::Error {
            notice_warn!("Last poll failed; see log for details");
        }
    }
}

pub fn badge_text(indicator: Indicator) -> Option<String> {
    match indicator {
        Indicator::Count(n) => Some(n.to_string()),
        Indicator::Error => Some("ERR".to_string()),
        Indicator::Clear => None,
    }
}

fn format_notification(notification: &Notification) -> String {
    let body = notification
        .message
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("== {} ({})\n{}", notification.title, notification.id, body)
}

/// Opens URLs with the system's default browser.
#[derive(Debug, Default)]
pub struct BrowserOpener;

impl UrlOpener for BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        webbrowser::open(url)
    }
}
