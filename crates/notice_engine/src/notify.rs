use std::io;

use notice_core::{Indicator, Notification};
use notice_logging::{notice_info, notice_warn};

/// Surfaces new announcements and the badge-style indicator to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
    fn set_indicator(&self, indicator: Indicator);
}

/// Opens a record's page when its notification is clicked.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        notice_info!(
            "New announcement {}: {} | {}",
            notification.id,
            notification.title,
            notification.message.replace('\n', " ")
        );
    }

    fn set_indicator(&self, indicator: Indicator) {
        match indicator {
            Indicator::Count(n) => notice_info!("Indicator: {} new", n),
            Indicator::Error => notice_warn!("Indicator: ERR"),
            Indicator::Clear => notice_info!("Indicator cleared"),
        }
    }
}
