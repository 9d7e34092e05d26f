use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use notice_core::{
    update, AnnouncementRecord, Effect, Msg, PollFailure, PollReport, PollState,
};
use notice_logging::{notice_debug, notice_error, notice_info, notice_warn};
use serde::{Deserialize, Serialize};

use crate::fetch::Fetcher;
use crate::notify::{Notifier, UrlOpener};
use crate::store::{conflicting_revision, KeyValueStore, StateRepository, StoreError};
use crate::{PollOutcome, WatcherSettings};

/// Milliseconds since the Unix epoch, stamped on each new record.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    })
}

/// Requests a host forwards to the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WatcherRequest {
    ManualCheck,
    NotificationClicked { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WatcherResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
        }
    }
}

/// Collaborators the watcher drives. Everything with side effects lives here.
#[derive(Clone)]
pub struct WatcherParts {
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
    pub opener: Arc<dyn UrlOpener>,
}

/// Runs polls by feeding [`notice_core::update`] and executing its effects.
pub struct Watcher {
    settings: WatcherSettings,
    fetcher: Arc<dyn Fetcher>,
    repository: StateRepository,
    notifier: Arc<dyn Notifier>,
    opener: Arc<dyn UrlOpener>,
    clock: Clock,
    gate: tokio::sync::Mutex<()>,
}

impl Watcher {
    pub fn new(settings: WatcherSettings, parts: WatcherParts) -> Self {
        Self {
            settings,
            fetcher: parts.fetcher,
            repository: StateRepository::new(parts.store),
            notifier: parts.notifier,
            opener: parts.opener,
            clock: system_clock(),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch the listing, summarize unseen announcements and commit them.
    ///
    /// `notify_if_empty` clears the indicator when nothing is new, which is
    /// what a manual check wants. A call made while another poll is running
    /// returns [`PollOutcome::AlreadyRunning`] without doing anything.
    pub async fn poll(&self, notify_if_empty: bool) -> Result<PollOutcome, PollFailure> {
        let Ok(_running) = self.gate.try_lock() else {
            notice_info!("Poll requested while another is running; skipping");
            return Ok(PollOutcome::AlreadyRunning);
        };

        notice_info!("Polling {}", self.settings.list_url);
        let mut state = PollState::new();
        let mut inbox = VecDeque::from([Msg::PollRequested {
            list_url: self.settings.list_url.clone(),
            notify_if_empty,
        }]);

        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                if let Effect::Finished(result) = effect {
                    return finish(result);
                }
                if let Some(reply) = self.run_effect(effect, &state).await {
                    inbox.push_back(reply);
                }
            }
        }

        notice_error!("Poll stalled in phase {:?}", state.phase());
        Err(PollFailure::Stalled)
    }

    async fn run_effect(&self, effect: Effect, state: &PollState) -> Option<Msg> {
        match effect {
            Effect::FetchListing { url } => {
                let result = self.fetcher.fetch_text(&url).await.map_err(|err| {
                    notice_warn!("Listing fetch failed for {}: {}", url, err);
                    PollFailure::ListingFetch(err.to_string())
                });
                Some(Msg::ListingFetched(result))
            }
            Effect::LoadState => {
                notice_info!("Listing has {} announcement(s)", state.snapshot().len());
                Some(Msg::StateLoaded(self.repository.load().map_err(store_failure)))
            }
            Effect::FetchDetail { id, url } => {
                notice_info!(
                    "Fetching detail {} ({} unseen this poll) from {}",
                    id,
                    state.fresh_count(),
                    url
                );
                let result = self.fetcher.fetch_text(&url).await.map_err(|err| {
                    notice_warn!("Detail fetch failed for {}: {}", id, err);
                    PollFailure::DetailFetch {
                        id: id.clone(),
                        message: err.to_string(),
                    }
                });
                Some(Msg::DetailFetched {
                    id,
                    result,
                    fetched_at_ms: (self.clock)(),
                })
            }
            Effect::Commit(commit) => {
                let result = match self.repository.commit(&commit) {
                    Ok(revision) => {
                        notice_info!(
                            "Committed {} known id(s) and {} cached record(s) at revision {}",
                            commit.known_ids.len(),
                            commit.cache_records.len(),
                            revision
                        );
                        Ok(())
                    }
                    Err(err) => Err(match conflicting_revision(&err) {
                        Some(found) => PollFailure::Conflict {
                            expected: commit.expected_revision,
                            found,
                        },
                        None => store_failure(err),
                    }),
                };
                Some(Msg::Committed(result))
            }
            Effect::Notify(notification) => {
                self.notifier.notify(&notification);
                None
            }
            Effect::SetIndicator(indicator) => {
                self.notifier.set_indicator(indicator);
                None
            }
            Effect::Finished(_) => None,
        }
    }

    /// Answer a host request. Failures are reported in the response, never
    /// raised.
    pub async fn handle(&self, request: WatcherRequest) -> WatcherResponse {
        match request {
            WatcherRequest::ManualCheck => match self.poll(true).await {
                Ok(_) => WatcherResponse::ok(),
                Err(failure) => WatcherResponse::failed(failure),
            },
            WatcherRequest::NotificationClicked { id } => match self.open_notification(&id) {
                Ok(_) => WatcherResponse::ok(),
                Err(err) => WatcherResponse::failed(err),
            },
        }
    }

    /// Open the cached record with `id` in the browser. Returns whether a
    /// record was found.
    pub fn open_notification(&self, id: &str) -> Result<bool, OpenError> {
        let records = self.repository.cache_records()?;
        let Some(record) = records.iter().find(|record| record.id == id) else {
            notice_debug!("Clicked notification {} has no cached record", id);
            return Ok(false);
        };
        notice_info!("Opening {}", record.url);
        self.opener.open(&record.url).map_err(OpenError::Open)?;
        Ok(true)
    }

    pub fn cached_records(&self) -> Result<Vec<AnnouncementRecord>, StoreError> {
        self.repository.cache_records()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not open browser: {0}")]
    Open(std::io::Error),
}

fn store_failure(err: StoreError) -> PollFailure {
    PollFailure::Store(err.to_string())
}

fn finish(result: Result<PollReport, PollFailure>) -> Result<PollOutcome, PollFailure> {
    match result {
        Ok(PollReport::NoUpdates) => {
            notice_info!("No new announcements");
            Ok(PollOutcome::NoUpdates)
        }
        Ok(PollReport::Updated { new_items }) => {
            notice_info!("{} new announcement(s) stored", new_items);
            Ok(PollOutcome::Updated { new_items })
        }
        Err(failure) => {
            notice_error!("Poll failed: {}", failure);
            Err(failure)
        }
    }
}
