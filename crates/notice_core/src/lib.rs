//! Notice core: markup extraction, summarization and the pure poll state machine.
mod dates;
mod detail;
mod effect;
mod error;
mod listing;
mod markup;
mod msg;
mod record;
mod state;
mod summarize;
mod update;
mod view_model;

pub use dates::{first_date, first_period};
pub use detail::{detail_title, summarize_detail, FALLBACK_TITLE};
pub use effect::{Commit, Effect, PollReport};
pub use error::PollFailure;
pub use listing::{extract_id, extract_list_items, DATE_WINDOW_CHARS, ID_PARAM};
pub use markup::{first_element_inner, normalize, prefix_chars, Tag, TagScanner};
pub use msg::Msg;
pub use record::{
    fresh_entries, next_known_ids, prepend_record, AnnouncementRecord, DetailSummary, Indicator,
    ListEntry, Notification, CACHE_CAP, KNOWN_IDS_CAP, NOTIFICATION_MAX_CHARS,
};
pub use state::{Phase, PollState, StoredState};
pub use summarize::{
    candidate_text, score, split_sentences, summarize_text, FALLBACK_CHARS, KEYWORDS,
    MAX_SENTENCES, MAX_SENTENCE_CHARS, OVERVIEW_MARKER, PSEUDO_SENTENCE_CHARS, STOP_MARKERS,
    SUMMARY_MAX_CHARS,
};
pub use update::update;
pub use view_model::{build_rows, RecordRow, DISPLAY_LIMIT, EMPTY_HINT};
