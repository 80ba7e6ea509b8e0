//! Page controller: turns form submissions into API calls and store writes.
//!
//! Every action follows the same cycle. The API call resolves first, then the
//! result is written into the [`DataStore`], which redraws every mounted table
//! before the handler continues. Mutations end with a dependent refresh of the
//! listings table. A failed call leaves the store untouched and reports a
//! [`PageEvent::Error`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use shared::{
    domain::{Listing, ListingNumber},
    protocol::{ListingCreateRequest, ListingQuery, ListingUpdateRequest},
};
use tracing::{debug, error, info, warn};

use crate::{
    api::{ClientError, ListingApi},
    events::{PageEvent, UiError, UiErrorCategory, UiErrorContext},
    forms::{
        read_create_form, read_delete_form, read_search_form, read_update_price_form,
        read_update_status_form, FieldPatch, FormAction, SubmitEvent,
    },
    page::{MissingRecordPolicy, PageConfig, LISTINGS, NEW_HOMES, SEARCHED_HOMES},
    render::{ListingTableRenderer, RenderSurface, TableFormat},
    store::DataStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    List,
    Search,
    Create,
    UpdatePrice,
    UpdateStatus,
    Delete,
}

impl ActionKind {
    fn error_context(self) -> UiErrorContext {
        match self {
            ActionKind::List => UiErrorContext::List,
            ActionKind::Search => UiErrorContext::Search,
            ActionKind::Create => UiErrorContext::Create,
            ActionKind::UpdatePrice => UiErrorContext::UpdatePrice,
            ActionKind::UpdateStatus => UiErrorContext::UpdateStatus,
            ActionKind::Delete => UiErrorContext::Delete,
        }
    }
}

/// `Idle -> Submitting -> {Succeeded -> Refreshing -> Idle, Failed -> Idle}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Refreshing,
    Failed,
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Completed,
    /// The search succeeded but matched nothing.
    NoMatch,
    Failed(UiError),
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }

    pub fn error(&self) -> Option<&UiError> {
        match self {
            ActionOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub struct PageController<A> {
    api: A,
    config: PageConfig,
    store: Arc<DataStore>,
    events: Sender<PageEvent>,
    // create/update/delete run one at a time; list and search do not wait
    mutations: tokio::sync::Mutex<()>,
    states: Mutex<HashMap<ActionKind, ActionState>>,
}

impl<A: ListingApi> PageController<A> {
    pub fn new(api: A, config: PageConfig) -> (Self, Receiver<PageEvent>) {
        let (events, rx) = unbounded();
        let controller = Self {
            api,
            config,
            store: Arc::new(DataStore::new()),
            events,
            mutations: tokio::sync::Mutex::new(()),
            states: Mutex::new(HashMap::new()),
        };
        (controller, rx)
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn config(&self) -> PageConfig {
        self.config
    }

    /// Registers one table renderer per region of the current page.
    pub fn mount(&self, surface: Arc<dyn RenderSurface>, format: TableFormat) {
        for (region, key) in self.config.variant.regions() {
            self.store.add_change_listener(ListingTableRenderer::new(
                region,
                key,
                format,
                surface.clone(),
            ));
        }
        info!(
            page = %self.config.variant,
            listeners = self.store.listener_count(),
            "page mounted"
        );
    }

    pub fn action_state(&self, kind: ActionKind) -> ActionState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Routes a form submission to its handler.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> ActionOutcome {
        event.prevent_default();

        let Some(action) = FormAction::from_form_id(&event.form_id) else {
            warn!(form_id = %event.form_id, "submission from unknown form");
            let err = UiError::new(
                UiErrorCategory::Validation,
                UiErrorContext::Submit,
                format!("Unrecognized form '{}'", event.form_id),
            );
            self.emit(PageEvent::Error(err.clone()));
            return ActionOutcome::Failed(err);
        };

        match action {
            FormAction::Create => self.on_create(read_create_form(&*event)).await,
            FormAction::Search => self.on_search(read_search_form(&*event)).await,
            FormAction::GetListings => self.on_get_listings().await,
            FormAction::UpdatePrice => self.on_update_price(read_update_price_form(&*event)).await,
            FormAction::UpdateStatus => {
                self.on_update_status(read_update_status_form(&*event)).await
            }
            FormAction::Delete => self.on_delete_listing(read_delete_form(&*event)).await,
        }
    }

    pub async fn on_get_listings(&self) -> ActionOutcome {
        let kind = ActionKind::List;
        self.transition(kind, ActionState::Submitting);

        let listings = match self.fetch_listings().await {
            Ok(listings) => listings,
            Err(err) => return self.fail(kind, UiError::from_client(kind.error_context(), &err)),
        };
        info!(count = listings.len(), "listings loaded");

        if let Err(err) = self.store.set(&LISTINGS, listings) {
            return self.fail(kind, UiError::from_store(kind.error_context(), &err));
        }
        self.emit(PageEvent::Info("Here you go!".to_string()));
        self.finish(kind);
        ActionOutcome::Completed
    }

    pub async fn on_search(&self, query: ListingQuery) -> ActionOutcome {
        let kind = ActionKind::Search;
        self.transition(kind, ActionState::Submitting);
        debug!(?query, "searching listings");

        let found = match self.api.get_parameterized_listings(&query).await {
            Ok(found) => found,
            Err(err) => return self.fail(kind, UiError::from_client(kind.error_context(), &err)),
        };

        if found.is_empty() && !self.config.variant.soft_no_match() {
            return self.fail(
                kind,
                UiError::new(
                    UiErrorCategory::NotFound,
                    kind.error_context(),
                    "Error searching!  Try again...",
                ),
            );
        }

        let matched = found.len();
        if let Err(err) = self.store.set(&SEARCHED_HOMES, found) {
            return self.fail(kind, UiError::from_store(kind.error_context(), &err));
        }
        self.finish(kind);

        if matched == 0 {
            info!("search matched no listings");
            self.emit(PageEvent::NoMatch(
                "No homes match your search.".to_string(),
            ));
            ActionOutcome::NoMatch
        } else {
            info!(matched, "search complete");
            self.emit(PageEvent::Info("Search successful!".to_string()));
            ActionOutcome::Completed
        }
    }

    pub async fn on_create(&self, request: ListingCreateRequest) -> ActionOutcome {
        let kind = ActionKind::Create;
        let _guard = self.mutations.lock().await;
        self.transition(kind, ActionState::Submitting);

        let created = match self.api.create_listing(&request).await {
            Ok(created) => created,
            Err(err) => return self.fail(kind, UiError::from_client(kind.error_context(), &err)),
        };
        info!(listing_number = %created.listing_number, "listing created");

        if self.config.variant.tracks_new_homes() {
            let mut new_homes = self.store.get(&NEW_HOMES).unwrap_or_default();
            new_homes.push(created);
            if let Err(err) = self.store.set(&NEW_HOMES, new_homes) {
                return self.fail(kind, UiError::from_store(kind.error_context(), &err));
            }
        }
        self.emit(PageEvent::Info("Created Listing!".to_string()));

        self.refresh_after(kind).await
    }

    pub async fn on_update_price(&self, patch: FieldPatch) -> ActionOutcome {
        self.update_listing(ActionKind::UpdatePrice, patch).await
    }

    pub async fn on_update_status(&self, patch: FieldPatch) -> ActionOutcome {
        self.update_listing(ActionKind::UpdateStatus, patch).await
    }

    pub async fn on_delete_listing(&self, listing_number: ListingNumber) -> ActionOutcome {
        let kind = ActionKind::Delete;
        let _guard = self.mutations.lock().await;
        self.transition(kind, ActionState::Submitting);

        if let Err(err) = self.api.delete_listing_by_id(&listing_number).await {
            return self.fail(kind, UiError::from_client(kind.error_context(), &err));
        }
        info!(%listing_number, "listing deleted");
        self.emit(PageEvent::Info("Deleted Listing!".to_string()));

        self.refresh_after(kind).await
    }

    async fn update_listing(&self, kind: ActionKind, patch: FieldPatch) -> ActionOutcome {
        let _guard = self.mutations.lock().await;
        self.transition(kind, ActionState::Submitting);

        let mut request = match self.base_record(kind, &patch.listing_number).await {
            Ok(request) => request,
            Err(err) => return self.fail(kind, err),
        };

        let sent = match kind {
            ActionKind::UpdatePrice => {
                request.price = patch.value;
                self.api.update_price(&request).await
            }
            _ => {
                request.listing_status = patch.value;
                self.api.update_status(&request).await
            }
        };
        if let Err(err) = sent {
            return self.fail(kind, UiError::from_client(kind.error_context(), &err));
        }
        info!(listing_number = %request.listing_number, ?kind, "listing updated");

        let message = match kind {
            ActionKind::UpdatePrice => "Updated Price!",
            _ => "Updated Status!",
        };
        self.emit(PageEvent::Info(message.to_string()));

        self.refresh_after(kind).await
    }

    /// Full record an update starts from: the cached listing when present,
    /// otherwise whatever the missing-record policy allows.
    async fn base_record(
        &self,
        kind: ActionKind,
        listing_number: &ListingNumber,
    ) -> Result<ListingUpdateRequest, UiError> {
        let cached = self
            .store
            .get(&LISTINGS)
            .and_then(|listings| find_listing(listings, listing_number));
        if let Some(listing) = cached {
            return Ok(ListingUpdateRequest::from_listing(&listing));
        }

        match self.config.missing_record_policy {
            MissingRecordPolicy::BlankFallback => {
                warn!(%listing_number, "listing not cached; sending blank fields");
                Ok(ListingUpdateRequest::blank(listing_number.clone()))
            }
            MissingRecordPolicy::Reject => Err(UiError::new(
                UiErrorCategory::Validation,
                kind.error_context(),
                format!("Listing {listing_number} is not loaded; get listings before updating it."),
            )),
            MissingRecordPolicy::FetchFromServer => {
                debug!(%listing_number, "listing not cached; fetching from server");
                self.api
                    .get_listing(listing_number)
                    .await
                    .map(|listing| ListingUpdateRequest::from_listing(&listing))
                    .map_err(|err| UiError::from_client(kind.error_context(), &err))
            }
        }
    }

    /// Re-lists after a successful mutation. Runs only after every listener
    /// of the mutation's own store writes has finished.
    async fn refresh_after(&self, kind: ActionKind) -> ActionOutcome {
        self.transition(kind, ActionState::Succeeded);
        self.transition(kind, ActionState::Refreshing);

        let refreshed = match self.fetch_listings().await {
            Ok(listings) => self.store.set(&LISTINGS, listings).map_err(|err| {
                UiError::from_store(UiErrorContext::Refresh, &err)
            }),
            Err(err) => Err(UiError::from_client(UiErrorContext::Refresh, &err)),
        };

        self.transition(kind, ActionState::Idle);
        match refreshed {
            Ok(()) => ActionOutcome::Completed,
            Err(err) => {
                error!(?kind, error = %err, "refresh after mutation failed");
                self.emit(PageEvent::Error(err.clone()));
                ActionOutcome::Failed(err)
            }
        }
    }

    async fn fetch_listings(&self) -> Result<Vec<Listing>, ClientError> {
        if self.config.variant.lists_open_only() {
            self.api.get_all_open_listings().await
        } else {
            self.api.get_all_listings().await
        }
    }

    fn fail(&self, kind: ActionKind, err: UiError) -> ActionOutcome {
        error!(?kind, error = %err, "page action failed");
        self.transition(kind, ActionState::Failed);
        self.emit(PageEvent::Error(err.clone()));
        self.transition(kind, ActionState::Idle);
        ActionOutcome::Failed(err)
    }

    fn finish(&self, kind: ActionKind) {
        self.transition(kind, ActionState::Succeeded);
        self.transition(kind, ActionState::Idle);
    }

    fn transition(&self, kind: ActionKind, state: ActionState) {
        debug!(?kind, ?state, "action state");
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, state);
    }

    fn emit(&self, event: PageEvent) {
        if self.events.send(event).is_err() {
            debug!("page event receiver dropped");
        }
    }
}

fn find_listing(listings: Vec<Listing>, listing_number: &ListingNumber) -> Option<Listing> {
    listings
        .into_iter()
        .find(|listing| &listing.listing_number == listing_number)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
