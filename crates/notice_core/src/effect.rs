use crate::{AnnouncementRecord, Indicator, Notification, PollFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchListing { url: String },
    LoadState,
    FetchDetail { id: String, url: String },
    Commit(Commit),
    Notify(Notification),
    SetIndicator(Indicator),
    /// Always the last effect of a poll.
    Finished(Result<PollReport, PollFailure>),
}

/// Everything a successful poll writes, in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Revision read by `LoadState`; the write must be rejected if the store
    /// has moved on since.
    pub expected_revision: u64,
    pub known_ids: Vec<String>,
    pub cache_records: Vec<AnnouncementRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReport {
    NoUpdates,
    Updated { new_items: usize },
}
