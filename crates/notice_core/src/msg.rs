use crate::{PollFailure, StoredState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A timer tick or a manual check asked for a poll.
    PollRequested {
        list_url: String,
        notify_if_empty: bool,
    },
    /// Listing markup, or why it could not be fetched.
    ListingFetched(Result<String, PollFailure>),
    /// Persisted records as of the start of the diff.
    StateLoaded(Result<StoredState, PollFailure>),
    /// Detail markup for the entry currently in flight.
    DetailFetched {
        id: String,
        result: Result<String, PollFailure>,
        fetched_at_ms: i64,
    },
    /// Outcome of writing the new records.
    Committed(Result<(), PollFailure>),
}
