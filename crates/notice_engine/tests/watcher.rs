use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};

use notice_core::{AnnouncementRecord, Commit, Indicator, Notification, PollFailure};
use notice_engine::{
    FailureKind, FetchError, Fetcher, KeyValueStore, MemoryStore, Notifier, PollOutcome,
    StateRepository, StoreError, UrlOpener, Watcher, WatcherParts, WatcherRequest,
    WatcherResponse, WatcherSettings, REVISION_KEY,
};
use serde_json::Value;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Notify;

const LIST_URL: &str = "https://example.go.kr/web/list.do";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(notice_logging::initialize_for_tests);
}

fn detail_url(id: &str) -> String {
    format!("https://example.go.kr/web/view.do?pblancId={id}")
}

fn listing(ids: &[&str]) -> String {
    ids.iter()
        .map(|id| format!(r#"<li><a href="view.do?pblancId={id}">공고 {id}</a> 2024.05.01</li>"#))
        .collect()
}

fn detail(id: &str) -> String {
    format!(
        "<title>{id}</title><p>사업개요 지원 대상은 중소기업 {id} 입니다. \
         모집 기간은 2024.05.01 ~ 2024.05.31 입니다.</p><p>문의처 02-000-0000</p>"
    )
}

type Hook = Box<dyn Fn(&str) + Send + Sync>;

/// Serves canned pages by URL; anything unscripted is a network error.
#[derive(Default)]
struct ScriptedFetcher {
    pages: Mutex<HashMap<String, Result<String, FetchError>>>,
    requests: Mutex<Vec<String>>,
    on_fetch: Option<Hook>,
}

impl ScriptedFetcher {
    fn with_listing(ids: &[&str]) -> Self {
        let fetcher = Self::default();
        fetcher.set_listing(ids);
        fetcher
    }

    fn set_listing(&self, ids: &[&str]) {
        self.serve(LIST_URL, Ok(listing(ids)));
        for id in ids {
            self.pages
                .lock()
                .unwrap()
                .entry(detail_url(id))
                .or_insert_with(|| Ok(detail(id)));
        }
    }

    fn serve(&self, url: &str, page: Result<String, FetchError>) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(hook) = &self.on_fetch {
            hook(url);
        }
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(error(FailureKind::Network, "unscripted")))
    }
}

fn error(kind: FailureKind, message: &str) -> FetchError {
    FetchError {
        kind,
        message: message.to_string(),
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    indicators: Mutex<Vec<Indicator>>,
}

impl RecordingNotifier {
    fn notified_ids(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }

    fn last_indicator(&self) -> Option<Indicator> {
        self.indicators.lock().unwrap().last().copied()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }

    fn set_indicator(&self, indicator: Indicator) {
        self.indicators.lock().unwrap().push(indicator);
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
    broken: bool,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no browser"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct Harness {
    watcher: Arc<Watcher>,
    fetcher: Arc<ScriptedFetcher>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    opener: Arc<RecordingOpener>,
}

impl Harness {
    fn new(fetcher: ScriptedFetcher) -> Self {
        Self::build(fetcher, Arc::new(MemoryStore::new()), RecordingOpener::default())
    }

    fn build(fetcher: ScriptedFetcher, store: Arc<MemoryStore>, opener: RecordingOpener) -> Self {
        init_logging();
        let fetcher = Arc::new(fetcher);
        let notifier = Arc::new(RecordingNotifier::default());
        let opener = Arc::new(opener);
        let ticks = Arc::new(AtomicI64::new(1_000));
        let settings = WatcherSettings {
            list_url: LIST_URL.to_string(),
            ..WatcherSettings::default()
        };
        let watcher = Watcher::new(
            settings,
            WatcherParts {
                fetcher: fetcher.clone(),
                store: store.clone(),
                notifier: notifier.clone(),
                opener: opener.clone(),
            },
        )
        .with_clock(Arc::new(move || ticks.fetch_add(1, Ordering::SeqCst)));
        Self {
            watcher: Arc::new(watcher),
            fetcher,
            store,
            notifier,
            opener,
        }
    }

    fn stored(&self) -> notice_core::StoredState {
        StateRepository::new(self.store.clone()).load().unwrap()
    }
}

#[tokio::test]
async fn first_poll_stores_and_notifies_every_entry() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A", "B"]));

    let outcome = harness.watcher.poll(false).await.unwrap();

    assert_eq!(outcome, PollOutcome::Updated { new_items: 2 });
    assert_eq!(harness.notifier.notified_ids(), vec!["A", "B"]);
    assert_eq!(harness.notifier.last_indicator(), Some(Indicator::Count(2)));

    let stored = harness.stored();
    assert_eq!(stored.known_ids, vec!["A", "B"]);
    let cached: Vec<_> = stored.cache_records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(cached, vec!["B", "A"]);
    assert_eq!(stored.cache_records[1].created_at_epoch_ms, 1_000);
    assert_eq!(stored.cache_records[1].period, "2024-05-01 ~ 2024-05-31");
    assert_eq!(stored.revision, 1);

    let message = &harness.notifier.notifications.lock().unwrap()[0].message;
    assert!(message.starts_with("[기간] 2024-05-01 ~ 2024-05-31\n• "), "{message}");
}

#[tokio::test]
async fn only_new_ids_are_fetched_on_later_polls() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A", "B"]));
    harness.watcher.poll(false).await.unwrap();

    harness.fetcher.set_listing(&["B", "C", "A"]);
    let outcome = harness.watcher.poll(false).await.unwrap();

    assert_eq!(outcome, PollOutcome::Updated { new_items: 1 });
    assert_eq!(harness.notifier.notified_ids(), vec!["A", "B", "C"]);
    let detail_requests = harness
        .fetcher
        .requests()
        .into_iter()
        .filter(|url| url.contains("view.do"))
        .count();
    assert_eq!(detail_requests, 3);
    assert_eq!(harness.stored().known_ids, vec!["B", "C", "A"]);
}

#[tokio::test]
async fn unchanged_listing_reports_no_updates() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A"]));
    harness.watcher.poll(false).await.unwrap();
    let before = harness.store.snapshot().unwrap();

    let outcome = harness.watcher.poll(false).await.unwrap();

    assert_eq!(outcome, PollOutcome::NoUpdates);
    assert_eq!(harness.notifier.notified_ids(), vec!["A"]);
    assert_eq!(harness.store.snapshot().unwrap(), before);
    // a timer poll leaves the badge as it was
    assert_eq!(harness.notifier.last_indicator(), Some(Indicator::Count(1)));
}

#[tokio::test]
async fn listing_timeout_leaves_state_unchanged() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A"]));
    harness.watcher.poll(false).await.unwrap();
    let before = harness.store.snapshot().unwrap();

    harness.fetcher.set_listing(&["A", "B"]);
    harness
        .fetcher
        .serve(LIST_URL, Err(error(FailureKind::Timeout, "20s elapsed")));
    let failure = harness.watcher.poll(false).await.unwrap_err();

    assert!(matches!(failure, PollFailure::ListingFetch(_)), "{failure:?}");
    assert_eq!(harness.store.snapshot().unwrap(), before);
    assert_eq!(harness.notifier.last_indicator(), Some(Indicator::Error));
}

#[tokio::test]
async fn failed_detail_commits_nothing() {
    let fetcher = ScriptedFetcher::with_listing(&["A", "B"]);
    fetcher.serve(
        &detail_url("B"),
        Err(error(FailureKind::HttpStatus(500), "500 Internal Server Error")),
    );
    let harness = Harness::new(fetcher);

    let failure = harness.watcher.poll(false).await.unwrap_err();

    assert_eq!(
        failure,
        PollFailure::DetailFetch {
            id: "B".to_string(),
            message: "http status 500: 500 Internal Server Error".to_string(),
        }
    );
    assert!(harness.notifier.notified_ids().is_empty());
    assert!(harness.store.snapshot().unwrap().is_empty());
}

#[tokio::test]
async fn empty_listing_is_a_failure() {
    let fetcher = ScriptedFetcher::default();
    fetcher.serve(LIST_URL, Ok("<p>시스템 점검 중</p>".to_string()));
    let harness = Harness::new(fetcher);

    let failure = harness.watcher.poll(true).await.unwrap_err();
    assert_eq!(failure, PollFailure::EmptyListing);
    assert!(harness.store.snapshot().unwrap().is_empty());
}

#[tokio::test]
async fn ids_that_leave_and_return_are_notified_again() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A", "B"]));
    harness.watcher.poll(false).await.unwrap();

    // A drops out of the window when the next commit replaces knownIds
    harness.fetcher.set_listing(&["C", "B"]);
    harness.watcher.poll(false).await.unwrap();
    assert_eq!(harness.stored().known_ids, vec!["C", "B"]);

    harness.fetcher.set_listing(&["A", "C", "B"]);
    assert_eq!(
        harness.watcher.poll(false).await.unwrap(),
        PollOutcome::Updated { new_items: 1 }
    );
    assert_eq!(harness.notifier.notified_ids(), vec!["A", "B", "C", "A"]);
}

#[tokio::test]
async fn large_listings_keep_both_windows_bounded() {
    let ids: Vec<String> = (0..130).map(|i| format!("N{i:03}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let harness = Harness::new(ScriptedFetcher::with_listing(&id_refs));

    let outcome = harness.watcher.poll(false).await.unwrap();

    assert_eq!(outcome, PollOutcome::Updated { new_items: 130 });
    let stored = harness.stored();
    assert_eq!(stored.known_ids.len(), 100);
    assert_eq!(stored.known_ids[99], "N099");
    assert_eq!(stored.cache_records.len(), 50);
    assert_eq!(stored.cache_records[0].id, "N129");
}

#[tokio::test]
async fn concurrent_writer_makes_the_commit_fail() {
    let store = Arc::new(MemoryStore::new());
    let intruder = store.clone();
    let fetcher = ScriptedFetcher {
        on_fetch: Some(Box::new(move |url: &str| {
            if url.contains("view.do") {
                intruder
                    .set(vec![(REVISION_KEY.to_string(), json!(5))])
                    .unwrap();
            }
        })),
        ..ScriptedFetcher::default()
    };
    fetcher.set_listing(&["A"]);
    let harness = Harness::build(fetcher, store, RecordingOpener::default());

    let failure = harness.watcher.poll(false).await.unwrap_err();

    assert_eq!(
        failure,
        PollFailure::Conflict {
            expected: 0,
            found: 5
        }
    );
    assert!(harness.notifier.notified_ids().is_empty());
    assert!(harness.stored().known_ids.is_empty());
}

/// Lets another writer commit right after the first read of a poll's load.
struct InterleavingStore {
    inner: Arc<MemoryStore>,
    fired: Mutex<bool>,
}

impl InterleavingStore {
    fn commit_other_writer(&self) {
        let other = AnnouncementRecord {
            id: "OTHER".to_string(),
            title: "다른 프로세스".to_string(),
            url: detail_url("OTHER"),
            date: String::new(),
            period: String::new(),
            summary: String::new(),
            created_at_epoch_ms: 7,
        };
        StateRepository::new(self.inner.clone())
            .commit(&Commit {
                expected_revision: 0,
                known_ids: vec!["OTHER".to_string()],
                cache_records: vec![other],
            })
            .unwrap();
    }
}

impl KeyValueStore for InterleavingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value = self.inner.get(key)?;
        let mut fired = self.fired.lock().unwrap();
        if !*fired {
            *fired = true;
            self.commit_other_writer();
        }
        Ok(value)
    }

    fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.inner.set(entries)
    }

    fn compare_and_set(
        &self,
        guard_key: &str,
        expected: Option<&Value>,
        entries: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        self.inner.compare_and_set(guard_key, expected, entries)
    }
}

#[tokio::test]
async fn commit_landing_during_the_load_is_not_overwritten() {
    init_logging();
    let inner = Arc::new(MemoryStore::new());
    let store = Arc::new(InterleavingStore {
        inner: inner.clone(),
        fired: Mutex::new(false),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let watcher = Watcher::new(
        WatcherSettings {
            list_url: LIST_URL.to_string(),
            ..WatcherSettings::default()
        },
        WatcherParts {
            fetcher: Arc::new(ScriptedFetcher::with_listing(&["A"])),
            store,
            notifier: notifier.clone(),
            opener: Arc::new(RecordingOpener::default()),
        },
    );

    let failure = watcher.poll(false).await.unwrap_err();

    assert_eq!(
        failure,
        PollFailure::Conflict {
            expected: 0,
            found: 1
        }
    );
    assert!(notifier.notified_ids().is_empty());
    let stored = StateRepository::new(inner).load().unwrap();
    assert_eq!(stored.known_ids, vec!["OTHER"]);
    let cached: Vec<_> = stored.cache_records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(cached, vec!["OTHER"]);
    assert_eq!(stored.revision, 1);
}

#[tokio::test]
async fn manual_check_reports_ok_and_clears_the_indicator() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A"]));
    harness.watcher.poll(false).await.unwrap();

    let response = harness.watcher.handle(WatcherRequest::ManualCheck).await;

    assert_eq!(response, WatcherResponse::ok());
    assert_eq!(harness.notifier.last_indicator(), Some(Indicator::Clear));
}

#[tokio::test]
async fn manual_check_reports_the_failure_message() {
    let fetcher = ScriptedFetcher::default();
    fetcher.serve(LIST_URL, Err(error(FailureKind::Timeout, "deadline")));
    let harness = Harness::new(fetcher);

    let response = harness.watcher.handle(WatcherRequest::ManualCheck).await;

    assert!(!response.ok);
    assert_eq!(
        response.error.as_deref(),
        Some("listing fetch failed: timeout: deadline")
    );
}

#[tokio::test]
async fn clicking_a_notification_opens_its_record() {
    let harness = Harness::new(ScriptedFetcher::with_listing(&["A", "B"]));
    harness.watcher.poll(false).await.unwrap();

    let response = harness
        .watcher
        .handle(WatcherRequest::NotificationClicked { id: "B".into() })
        .await;
    assert_eq!(response, WatcherResponse::ok());
    assert_eq!(*harness.opener.opened.lock().unwrap(), vec![detail_url("B")]);

    let unknown = harness
        .watcher
        .handle(WatcherRequest::NotificationClicked { id: "ZZ".into() })
        .await;
    assert_eq!(unknown, WatcherResponse::ok());
    assert_eq!(harness.opener.opened.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn browser_failure_is_reported_in_the_response() {
    let harness = Harness::build(
        ScriptedFetcher::with_listing(&["A"]),
        Arc::new(MemoryStore::new()),
        RecordingOpener {
            broken: true,
            ..RecordingOpener::default()
        },
    );
    harness.watcher.poll(false).await.unwrap();

    let response = harness
        .watcher
        .handle(WatcherRequest::NotificationClicked { id: "A".into() })
        .await;
    assert!(!response.ok);
    assert!(harness.opener.opened.lock().unwrap().is_empty());
}

/// Holds the listing request open until released.
struct GatedFetcher {
    inner: ScriptedFetcher,
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if url == LIST_URL {
            self.started.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_text(url).await
    }
}

#[tokio::test]
async fn overlapping_polls_coalesce() {
    init_logging();
    let fetcher = Arc::new(GatedFetcher {
        inner: ScriptedFetcher::with_listing(&["A"]),
        started: Notify::new(),
        release: Notify::new(),
    });
    let store = Arc::new(MemoryStore::new());
    let watcher = Arc::new(Watcher::new(
        WatcherSettings {
            list_url: LIST_URL.to_string(),
            ..WatcherSettings::default()
        },
        WatcherParts {
            fetcher: fetcher.clone(),
            store: store.clone(),
            notifier: Arc::new(RecordingNotifier::default()),
            opener: Arc::new(RecordingOpener::default()),
        },
    ));

    let first = tokio::spawn({
        let watcher = watcher.clone();
        async move { watcher.poll(false).await }
    });
    fetcher.started.notified().await;

    assert_eq!(watcher.poll(true).await.unwrap(), PollOutcome::AlreadyRunning);

    fetcher.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, PollOutcome::Updated { new_items: 1 });
    assert_eq!(fetcher.inner.requests().len(), 2);
}
