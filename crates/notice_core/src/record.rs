use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::markup::prefix_chars;

/// Identifiers remembered from the last listing snapshot.
pub const KNOWN_IDS_CAP: usize = 100;
/// Announcement records retained for display.
pub const CACHE_CAP: usize = 50;
pub const NOTIFICATION_MAX_CHARS: usize = 900;
const PERIOD_LABEL: &str = "[기간]";

/// One announcement link found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    /// `YYYY-MM-DD` or empty.
    pub date: String,
}

/// What the detail page contributes to a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailSummary {
    pub title: String,
    pub summary: String,
    /// `"<start> ~ <end>"` or empty.
    pub period: String,
}

/// Persisted, immutable history entry for one announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub summary: String,
    pub created_at_epoch_ms: i64,
}

impl AnnouncementRecord {
    /// List-derived title and date win; the detail page fills the gaps.
    pub fn new(entry: &ListEntry, detail: DetailSummary, created_at_epoch_ms: i64) -> Self {
        let title = if entry.title.is_empty() {
            detail.title
        } else {
            entry.title.clone()
        };
        Self {
            id: entry.id.clone(),
            title,
            url: entry.url.clone(),
            date: entry.date.clone(),
            period: detail.period,
            summary: detail.summary,
            created_at_epoch_ms,
        }
    }

    pub fn notification(&self) -> Notification {
        let mut message = String::new();
        if !self.period.is_empty() {
            message.push_str(&format!("{PERIOD_LABEL} {}\n", self.period));
        }
        message.push_str(&self.summary);
        Notification {
            id: self.id.clone(),
            title: self.title.clone(),
            message: prefix_chars(&message, NOTIFICATION_MAX_CHARS).to_string(),
        }
    }
}

/// A user-visible alert for one new announcement. `id` matches the record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
}

/// Badge-style status shown next to the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// New announcements found by the last poll.
    Count(usize),
    /// The last poll failed.
    Error,
    Clear,
}

/// Entries of `snapshot` not present in `known_ids`, in listing order.
pub fn fresh_entries(snapshot: &[ListEntry], known_ids: &[String]) -> Vec<ListEntry> {
    let known: HashSet<&str> = known_ids.iter().map(String::as_str).collect();
    snapshot
        .iter()
        .filter(|entry| !known.contains(entry.id.as_str()))
        .cloned()
        .collect()
}

/// The identifiers to remember after a poll: the latest snapshot only, never
/// merged with what was known before.
pub fn next_known_ids(snapshot: &[ListEntry]) -> Vec<String> {
    snapshot
        .iter()
        .take(KNOWN_IDS_CAP)
        .map(|entry| entry.id.clone())
        .collect()
}

/// Prepend `record` (most recent first) without exceeding [`CACHE_CAP`].
pub fn prepend_record(cache: &mut Vec<AnnouncementRecord>, record: AnnouncementRecord) {
    cache.insert(0, record);
    cache.truncate(CACHE_CAP);
}
