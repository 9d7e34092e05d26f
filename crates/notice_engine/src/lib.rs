//! Notice engine: fetching, persistence and effect execution for the watcher.
mod decode;
mod fetch;
mod notify;
mod persist;
mod scheduler;
mod settings;
mod store;
mod types;
mod watcher;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use notify::{LogNotifier, Notifier, UrlOpener};
pub use persist::{AtomicFile, PersistError};
pub use scheduler::run_schedule;
pub use settings::{WatcherSettings, DEFAULT_LIST_URL, DEFAULT_POLL_INTERVAL};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, StateRepository, StoreError, CACHE_RECORDS_KEY,
    KNOWN_IDS_KEY, REVISION_KEY, STATE_FILE_NAME,
};
pub use types::{FailureKind, FetchError, PollOutcome};
pub use watcher::{
    system_clock, Clock, OpenError, Watcher, WatcherParts, WatcherRequest, WatcherResponse,
};
