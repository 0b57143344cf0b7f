use std::{sync::Arc, time::Duration};

use shared::domain::{Car, CarId, CarListItem, CarPatch, SortBy, SortOrder, SortPreset};
use storage::KeyValueStore;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::CarApi,
    debounce::{DebounceTimer, DEFAULT_SEARCH_DEBOUNCE},
    error::{ApiFailure, SubmitError},
    form::CarForm,
    options_cache::{OptionsCache, Vocabulary},
    state::{PendingDelete, QueryState, ResultState, SessionSnapshot, View},
    Notice, NoticeSource, SessionEvent,
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub search_debounce: Duration,
    pub event_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchTrigger {
    DebouncedSearch,
    SubmittedSearch,
    Filters,
    Sort,
    Refetch,
}

impl FetchTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::DebouncedSearch => "debounced_search",
            Self::SubmittedSearch => "submitted_search",
            Self::Filters => "filters",
            Self::Sort => "sort",
            Self::Refetch => "refetch",
        }
    }
}

#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
    task: Option<JoinHandle<()>>,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// `false` when the session was already shut down and nothing was sent.
    pub fn is_live(&self) -> bool {
        self.task.is_some()
    }

    pub async fn settled(self) {
        if let Some(task) = self.task {
            let _ = task.await;
        }
    }
}

#[derive(Debug)]
pub struct MountHandle {
    pub listing: FetchTicket,
    vocabulary: JoinHandle<()>,
}

impl MountHandle {
    pub async fn settled(self) {
        self.listing.settled().await;
        let _ = self.vocabulary.await;
    }
}

struct SessionState {
    query: QueryState,
    results: ResultState,
    vocabulary: Vocabulary,
    view: View,
    details: Option<Car>,
    pending_delete: Option<PendingDelete>,
    search_timer: DebounceTimer,
    latest_fetch: u64,
    latest_details: u64,
    details_target: Option<CarId>,
    torn_down: bool,
}

impl SessionState {
    fn inert_ticket(&self) -> FetchTicket {
        FetchTicket {
            seq: self.latest_fetch,
            task: None,
        }
    }

    fn drop_details(&mut self) -> bool {
        self.latest_details += 1;
        self.details_target = None;
        self.details.take().is_some()
    }
}

pub struct CatalogSession {
    api: Arc<dyn CarApi>,
    options_cache: OptionsCache,
    search_debounce: Duration,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl CatalogSession {
    pub fn new(api: Arc<dyn CarApi>, store: Arc<dyn KeyValueStore>) -> Arc<Self> {
        Self::new_with_options(api, store, SessionOptions::default())
    }

    pub fn new_with_options(
        api: Arc<dyn CarApi>,
        store: Arc<dyn KeyValueStore>,
        options: SessionOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Arc::new(Self {
            api,
            options_cache: OptionsCache::new(store),
            search_debounce: options.search_debounce,
            inner: Mutex::new(SessionState {
                query: QueryState::default(),
                results: ResultState::default(),
                vocabulary: Vocabulary::default(),
                view: View::List,
                details: None,
                pending_delete: None,
                search_timer: DebounceTimer::new(),
                latest_fetch: 0,
                latest_details: 0,
                details_target: None,
                torn_down: false,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.inner.lock().await;
        SessionSnapshot {
            query: guard.query.clone(),
            results: guard.results.clone(),
            vocabulary: guard.vocabulary.clone(),
            view: guard.view,
            details: guard.details.clone(),
            pending_delete: guard.pending_delete.clone(),
        }
    }

    pub async fn query(&self) -> QueryState {
        self.inner.lock().await.query.clone()
    }

    pub async fn results(&self) -> ResultState {
        self.inner.lock().await.results.clone()
    }

    pub async fn vocabulary(&self) -> Vocabulary {
        self.inner.lock().await.vocabulary.clone()
    }

    pub async fn mount(self: &Arc<Self>) -> MountHandle {
        let listing = self.refetch().await;
        let session = Arc::clone(self);
        let vocabulary = tokio::spawn(async move {
            let _ = session.load_vocabulary().await;
        });
        MountHandle {
            listing,
            vocabulary,
        }
    }

    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        guard.torn_down = true;
        guard.search_timer.cancel();
        guard.latest_fetch += 1;
        guard.latest_details += 1;
        debug!("catalog: session shut down");
    }

    pub async fn set_search_text(self: &Arc<Self>, text: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return;
        }
        guard.query = guard.query.with_search(text);
        self.emit(SessionEvent::QueryChanged(guard.query.clone()));

        let session = Arc::clone(self);
        guard
            .search_timer
            .arm(self.search_debounce, move |token| async move {
                session.fire_debounced_search(token).await;
            });
    }

    pub async fn submit_search(self: &Arc<Self>, text: impl Into<String>) -> FetchTicket {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return guard.inert_ticket();
        }
        guard.query = guard.query.with_search(text);
        self.emit(SessionEvent::QueryChanged(guard.query.clone()));
        self.start_fetch(&mut guard, FetchTrigger::SubmittedSearch)
    }

    pub async fn clear_search(self: &Arc<Self>) -> FetchTicket {
        self.submit_search(String::new()).await
    }

    pub async fn set_type_and_tags(
        self: &Arc<Self>,
        car_type: Option<String>,
        tags: Vec<String>,
    ) -> FetchTicket {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return guard.inert_ticket();
        }
        guard.query = guard.query.with_type_and_tags(car_type, tags);
        self.emit(SessionEvent::QueryChanged(guard.query.clone()));
        self.start_fetch(&mut guard, FetchTrigger::Filters)
    }

    pub async fn set_sort(self: &Arc<Self>, sort_by: SortBy, sort_order: SortOrder) -> FetchTicket {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return guard.inert_ticket();
        }
        guard.query = guard.query.with_sort(sort_by, sort_order);
        self.emit(SessionEvent::QueryChanged(guard.query.clone()));
        self.start_fetch(&mut guard, FetchTrigger::Sort)
    }

    pub async fn apply_sort_preset(self: &Arc<Self>, preset: SortPreset) -> FetchTicket {
        let options = preset.options();
        self.set_sort(options.sort_by, options.sort_order).await
    }

    pub async fn refetch(self: &Arc<Self>) -> FetchTicket {
        let mut guard = self.inner.lock().await;
        self.start_fetch(&mut guard, FetchTrigger::Refetch)
    }

    pub async fn load_vocabulary(&self) -> Result<Vocabulary, ApiFailure> {
        if let Some(cached) = self.options_cache.load().await {
            debug!(
                car_types = cached.car_types.len(),
                tags = cached.tags.len(),
                "catalog: using cached vocabulary"
            );
            self.publish_vocabulary(cached).await;
        }

        let fetched = futures::try_join!(self.api.car_types(), self.api.car_tags());
        let (car_types, tags) = match fetched {
            Ok(fetched) => fetched,
            Err(failure) => {
                self.notify(NoticeSource::Vocabulary, &failure);
                return Err(failure);
            }
        };

        let vocabulary = Vocabulary::new(car_types, tags);
        if !self.publish_vocabulary(vocabulary.clone()).await {
            return Ok(vocabulary);
        }
        if let Err(err) = self.options_cache.save(&vocabulary).await {
            warn!("catalog: failed to persist vocabulary: {err:#}");
        }
        Ok(vocabulary)
    }

    pub async fn navigate(&self, view: View) {
        let mut guard = self.inner.lock().await;
        if guard.view != view {
            guard.view = view;
            self.emit(SessionEvent::ViewChanged(view));
        }
    }

    /// A load overtaken by a later open, a close or a delete still returns the
    /// record but leaves the view alone.
    pub async fn open_details(&self, id: CarId) -> Result<Car, ApiFailure> {
        let token = {
            let mut guard = self.inner.lock().await;
            guard.latest_details += 1;
            guard.details_target = Some(id);
            guard.latest_details
        };

        let outcome = self.api.get_car(id).await;

        let mut guard = self.inner.lock().await;
        if token != guard.latest_details {
            debug!(id = id.0, token, "catalog: discarding superseded details");
            return outcome;
        }
        match outcome {
            Ok(car) => {
                guard.details = Some(car.clone());
                self.emit(SessionEvent::DetailsChanged(Some(car.clone())));
                Ok(car)
            }
            Err(failure) => {
                guard.details_target = guard.details.as_ref().map(|car| car.id);
                self.notify(NoticeSource::Details, &failure);
                Err(failure)
            }
        }
    }

    pub async fn close_details(&self) {
        let mut guard = self.inner.lock().await;
        if guard.drop_details() {
            self.emit(SessionEvent::DetailsChanged(None));
        }
    }

    pub async fn request_delete(&self, id: CarId, name: impl Into<String>) {
        let pending = PendingDelete {
            id,
            name: name.into(),
        };
        let mut guard = self.inner.lock().await;
        guard.pending_delete = Some(pending.clone());
        self.emit(SessionEvent::DeletePromptChanged(Some(pending)));
    }

    pub async fn cancel_delete(&self) {
        let mut guard = self.inner.lock().await;
        if guard.pending_delete.take().is_some() {
            self.emit(SessionEvent::DeletePromptChanged(None));
        }
    }

    /// `Ok(None)` when nothing was awaiting confirmation.
    pub async fn confirm_delete(self: &Arc<Self>) -> Result<Option<FetchTicket>, ApiFailure> {
        let target = {
            let guard = self.inner.lock().await;
            guard.pending_delete.clone()
        };
        let Some(target) = target else {
            return Ok(None);
        };

        if let Err(failure) = self.api.delete_car(target.id).await {
            self.notify(NoticeSource::Delete, &failure);
            return Err(failure);
        }
        info!(id = target.id.0, "catalog: car deleted");

        let mut guard = self.inner.lock().await;
        if guard
            .pending_delete
            .as_ref()
            .is_some_and(|pending| pending.id == target.id)
        {
            guard.pending_delete = None;
            self.emit(SessionEvent::DeletePromptChanged(None));
        }
        let shown = guard
            .details
            .as_ref()
            .is_some_and(|car| car.id == target.id);
        if guard.details_target == Some(target.id) {
            // Also stops a load of the deleted car that is still in flight.
            if guard.drop_details() {
                self.emit(SessionEvent::DetailsChanged(None));
            }
        } else if shown {
            guard.details = None;
            self.emit(SessionEvent::DetailsChanged(None));
        }
        Ok(Some(self.start_fetch(&mut guard, FetchTrigger::Refetch)))
    }

    pub async fn submit_new_car(
        self: &Arc<Self>,
        form: &CarForm,
    ) -> Result<(Car, FetchTicket), SubmitError> {
        let new_car = form.validate()?;

        let created = match self.api.create_car(&new_car).await {
            Ok(created) => created,
            Err(failure) => {
                self.notify(NoticeSource::Create, &failure);
                return Err(failure.into());
            }
        };
        info!(id = created.id.0, name = %created.name, "catalog: car created");

        let mut guard = self.inner.lock().await;
        if guard.view != View::List {
            guard.view = View::List;
            self.emit(SessionEvent::ViewChanged(View::List));
        }
        let ticket = self.start_fetch(&mut guard, FetchTrigger::Refetch);
        Ok((created, ticket))
    }

    pub async fn update_car(
        self: &Arc<Self>,
        id: CarId,
        patch: &CarPatch,
    ) -> Result<(Car, FetchTicket), ApiFailure> {
        let updated = match self.api.update_car(id, patch).await {
            Ok(updated) => updated,
            Err(failure) => {
                self.notify(NoticeSource::Update, &failure);
                return Err(failure);
            }
        };

        let mut guard = self.inner.lock().await;
        if guard.details.as_ref().is_some_and(|car| car.id == id) {
            guard.details = Some(updated.clone());
            self.emit(SessionEvent::DetailsChanged(Some(updated.clone())));
        }
        let ticket = self.start_fetch(&mut guard, FetchTrigger::Refetch);
        Ok((updated, ticket))
    }

    async fn fire_debounced_search(self: &Arc<Self>, token: u64) {
        let mut guard = self.inner.lock().await;
        if !guard.search_timer.disarm_if_current(token) {
            return;
        }
        let _ = self.start_fetch(&mut guard, FetchTrigger::DebouncedSearch);
    }

    fn start_fetch(self: &Arc<Self>, state: &mut SessionState, trigger: FetchTrigger) -> FetchTicket {
        if trigger != FetchTrigger::DebouncedSearch {
            // Any immediate fetch already carries the latest search text.
            state.search_timer.cancel();
        }
        if state.torn_down {
            debug!(trigger = trigger.as_str(), "catalog: fetch skipped after shutdown");
            return state.inert_ticket();
        }

        state.latest_fetch += 1;
        let seq = state.latest_fetch;
        state.results.begin_loading();
        self.emit(SessionEvent::ResultsChanged(state.results.clone()));

        let query = state.query.to_list_query();
        debug!(
            seq,
            trigger = trigger.as_str(),
            params = ?query.to_pairs(),
            "catalog: issuing list fetch"
        );

        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = session.api.list_cars(&query).await;
            session.commit_fetch(seq, outcome).await;
        });
        FetchTicket {
            seq,
            task: Some(task),
        }
    }

    async fn commit_fetch(&self, seq: u64, outcome: Result<Vec<CarListItem>, ApiFailure>) {
        let mut guard = self.inner.lock().await;
        if seq != guard.latest_fetch {
            debug!(
                seq,
                latest = guard.latest_fetch,
                "catalog: discarding superseded list result"
            );
            return;
        }

        match outcome {
            Ok(items) => {
                debug!(seq, count = items.len(), "catalog: list fetch committed");
                guard.results.commit_items(items);
            }
            Err(failure) => {
                guard.results.commit_failure(&failure);
                self.notify(NoticeSource::ListFetch, &failure);
            }
        }
        self.emit(SessionEvent::ResultsChanged(guard.results.clone()));
    }

    async fn publish_vocabulary(&self, vocabulary: Vocabulary) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return false;
        }
        guard.vocabulary = vocabulary.clone();
        self.emit(SessionEvent::VocabularyChanged(vocabulary));
        true
    }

    fn notify(&self, source: NoticeSource, failure: &ApiFailure) {
        warn!(
            source = source.as_str(),
            detail = failure.detail(),
            "catalog: {failure}"
        );
        self.emit(SessionEvent::Notice(Notice::from_failure(source, failure)));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
