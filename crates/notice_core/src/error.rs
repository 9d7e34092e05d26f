/// Why a poll was abandoned. Every variant leaves the persisted state as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollFailure {
    #[error("listing fetch failed: {0}")]
    ListingFetch(String),
    /// The listing downloaded but yielded no announcement links.
    #[error("no announcements could be extracted from the listing")]
    EmptyListing,
    #[error("detail fetch failed for {id}: {message}")]
    DetailFetch { id: String, message: String },
    #[error("state store failed: {0}")]
    Store(String),
    #[error("state changed during the poll (expected revision {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
    #[error("poll stopped before reaching a result")]
    Stalled,
}
