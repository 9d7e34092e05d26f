use crate::record::{fresh_entries, next_known_ids, prepend_record};
use crate::{
    extract_list_items, summarize_detail, AnnouncementRecord, Commit, Effect, Indicator, Msg,
    Phase, PollFailure, PollReport, PollState, StoredState,
};

/// Pure update function: applies a message to the poll state and returns the
/// effects to run. Messages that do not fit the current phase are ignored.
pub fn update(mut state: PollState, msg: Msg) -> (PollState, Vec<Effect>) {
    let effects = match msg {
        Msg::PollRequested {
            list_url,
            notify_if_empty,
        } => {
            if state.is_busy() {
                return (state, Vec::new());
            }
            state = PollState::start(list_url, notify_if_empty);
            vec![Effect::FetchListing {
                url: state.list_url.clone(),
            }]
        }
        Msg::ListingFetched(result) => {
            if state.phase != Phase::FetchingList {
                return (state, Vec::new());
            }
            match result {
                Ok(markup) => on_listing(&mut state, &markup),
                Err(failure) => fail(&mut state, failure),
            }
        }
        Msg::StateLoaded(result) => {
            if state.phase != Phase::Diffing {
                return (state, Vec::new());
            }
            match result {
                Ok(stored) => on_state_loaded(&mut state, stored),
                Err(failure) => fail(&mut state, failure),
            }
        }
        Msg::DetailFetched {
            id,
            result,
            fetched_at_ms,
        } => {
            if state.phase != Phase::FetchingDetails || state.in_flight_id() != Some(id.as_str()) {
                return (state, Vec::new());
            }
            match result {
                Ok(markup) => on_detail(&mut state, &markup, fetched_at_ms),
                Err(failure) => fail(&mut state, failure),
            }
        }
        Msg::Committed(result) => {
            if state.phase != Phase::Committing {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => on_committed(&mut state),
                Err(failure) => fail(&mut state, failure),
            }
        }
    };

    (state, effects)
}

fn on_listing(state: &mut PollState, markup: &str) -> Vec<Effect> {
    let items = extract_list_items(markup, &state.list_url);
    if items.is_empty() {
        return fail(state, PollFailure::EmptyListing);
    }
    state.snapshot = items;
    state.phase = Phase::Diffing;
    vec![Effect::LoadState]
}

fn on_state_loaded(state: &mut PollState, stored: StoredState) -> Vec<Effect> {
    let fresh = fresh_entries(&state.snapshot, &stored.known_ids);
    if fresh.is_empty() {
        state.phase = Phase::Done;
        let mut effects = Vec::with_capacity(2);
        if state.notify_if_empty {
            effects.push(Effect::SetIndicator(Indicator::Clear));
        }
        effects.push(Effect::Finished(Ok(PollReport::NoUpdates)));
        return effects;
    }

    state.base_revision = stored.revision;
    state.cache = stored.cache_records;
    state.fresh_count = fresh.len();
    state.pending = fresh.into();
    state.phase = Phase::FetchingDetails;
    request_next_detail(state)
}

fn on_detail(state: &mut PollState, markup: &str, fetched_at_ms: i64) -> Vec<Effect> {
    let Some(entry) = state.in_flight.take() else {
        return Vec::new();
    };
    let record = AnnouncementRecord::new(&entry, summarize_detail(markup), fetched_at_ms);
    state.queued.push(record.notification());
    prepend_record(&mut state.cache, record);
    request_next_detail(state)
}

/// One detail at a time, in listing order; commit once the queue is empty.
fn request_next_detail(state: &mut PollState) -> Vec<Effect> {
    match state.pending.pop_front() {
        Some(entry) => {
            let effect = Effect::FetchDetail {
                id: entry.id.clone(),
                url: entry.url.clone(),
            };
            state.in_flight = Some(entry);
            vec![effect]
        }
        None => {
            state.phase = Phase::Committing;
            vec![Effect::Commit(Commit {
                expected_revision: state.base_revision,
                known_ids: next_known_ids(&state.snapshot),
                cache_records: state.cache.clone(),
            })]
        }
    }
}

fn on_committed(state: &mut PollState) -> Vec<Effect> {
    state.phase = Phase::Done;
    let new_items = state.fresh_count;
    let mut effects: Vec<Effect> = state.queued.drain(..).map(Effect::Notify).collect();
    effects.push(Effect::SetIndicator(Indicator::Count(new_items)));
    effects.push(Effect::Finished(Ok(PollReport::Updated { new_items })));
    effects
}

fn fail(state: &mut PollState, failure: PollFailure) -> Vec<Effect> {
    state.phase = Phase::Failed;
    state.pending.clear();
    state.in_flight = None;
    state.queued.clear();
    vec![
        Effect::SetIndicator(Indicator::Error),
        Effect::Finished(Err(failure)),
    ]
}
