use std::collections::VecDeque;

use crate::{AnnouncementRecord, ListEntry, Notification};

/// Where a single poll currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FetchingList,
    Diffing,
    FetchingDetails,
    Committing,
    Done,
    Failed,
}

/// The two persisted records plus the revision they were read at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredState {
    pub known_ids: Vec<String>,
    pub cache_records: Vec<AnnouncementRecord>,
    pub revision: u64,
}

/// In-memory state of one poll. Nothing here outlives the poll; only the
/// [`crate::Commit`] effect reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    pub(crate) phase: Phase,
    pub(crate) list_url: String,
    pub(crate) notify_if_empty: bool,
    pub(crate) snapshot: Vec<ListEntry>,
    pub(crate) pending: VecDeque<ListEntry>,
    pub(crate) in_flight: Option<ListEntry>,
    pub(crate) base_revision: u64,
    pub(crate) cache: Vec<AnnouncementRecord>,
    pub(crate) queued: Vec<Notification>,
    pub(crate) fresh_count: usize,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(list_url: String, notify_if_empty: bool) -> Self {
        Self {
            phase: Phase::FetchingList,
            list_url,
            notify_if_empty,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A poll is between its request and its `Finished` effect.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Done | Phase::Failed)
    }

    /// Entries of the latest listing snapshot, in document order.
    pub fn snapshot(&self) -> &[ListEntry] {
        &self.snapshot
    }

    pub fn fresh_count(&self) -> usize {
        self.fresh_count
    }

    /// Id of the entry whose detail page is being fetched.
    pub fn in_flight_id(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|entry| entry.id.as_str())
    }
}
