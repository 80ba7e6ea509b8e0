use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use super::*;
use async_trait::async_trait;
use shared::domain::ListingStatus;
use tokio::sync::Notify;

use crate::{
    forms::{CREATE_FORM, UPDATE_PRICE_FORM},
    page::{PageVariant, ALL_LISTINGS_REGION, NEW_LISTINGS_REGION, SEARCH_RESULTS_REGION},
    render::MemorySurface,
};

#[derive(Default)]
struct FakeState {
    listings: Mutex<Vec<Listing>>,
    calls: Mutex<Vec<&'static str>>,
    updates: Mutex<Vec<ListingUpdateRequest>>,
    failing: Mutex<Option<ClientError>>,
    // (entered, release) pair that holds create_listing mid-flight
    create_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    next_number: AtomicU64,
}

#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<FakeState>,
}

impl FakeApi {
    fn with_listings(listings: Vec<Listing>) -> Self {
        let api = Self::default();
        *api.state.listings.lock().expect("listings") = listings;
        api
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.calls.lock().expect("calls").clone()
    }

    fn updates(&self) -> Vec<ListingUpdateRequest> {
        self.state.updates.lock().expect("updates").clone()
    }

    fn fail_with(&self, err: Option<ClientError>) {
        *self.state.failing.lock().expect("failing") = err;
    }

    fn record(&self, call: &'static str) -> Result<(), ClientError> {
        self.state.calls.lock().expect("calls").push(call);
        match self.state.failing.lock().expect("failing").clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> Vec<Listing> {
        self.state.listings.lock().expect("listings").clone()
    }
}

#[async_trait]
impl ListingApi for FakeApi {
    async fn get_all_open_listings(&self) -> Result<Vec<Listing>, ClientError> {
        self.record("open")?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|listing| listing.listing_status.is_open())
            .collect())
    }

    async fn get_all_listings(&self) -> Result<Vec<Listing>, ClientError> {
        self.record("all")?;
        Ok(self.snapshot())
    }

    async fn get_parameterized_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<Listing>, ClientError> {
        self.record("search")?;
        let max_price: i64 = query.price.trim().parse().unwrap_or(0);
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|listing| listing.listing_status.is_open())
            .filter(|listing| max_price == 0 || listing.price < max_price)
            .collect())
    }

    async fn get_listing(&self, listing_number: &ListingNumber) -> Result<Listing, ClientError> {
        self.record("get")?;
        self.snapshot()
            .into_iter()
            .find(|listing| &listing.listing_number == listing_number)
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("listing {listing_number} not found"),
            })
    }

    async fn create_listing(
        &self,
        request: &ListingCreateRequest,
    ) -> Result<Listing, ClientError> {
        self.record("create")?;
        let gate = self.state.create_gate.lock().expect("gate").clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        let number = self.state.next_number.fetch_add(1, Ordering::SeqCst) + 100;
        let created = Listing {
            listing_number: ListingNumber::new(number.to_string()),
            address: request.address.clone(),
            square_footage: request.square_footage.parse().unwrap_or(0),
            price: request.price.parse().unwrap_or(0),
            num_bedrooms: request.num_bedrooms.parse().unwrap_or(0),
            num_bathrooms: request.num_bathrooms.parse().unwrap_or(0.0),
            listing_status: request.listing_status.parse().unwrap_or(ListingStatus::ForSale),
            lot_size: request.lot_size.parse().unwrap_or(0.0),
        };
        self.state
            .listings
            .lock()
            .expect("listings")
            .push(created.clone());
        Ok(created)
    }

    async fn update_price(&self, request: &ListingUpdateRequest) -> Result<(), ClientError> {
        self.record("update_price")?;
        self.state
            .updates
            .lock()
            .expect("updates")
            .push(request.clone());
        Ok(())
    }

    async fn update_status(&self, request: &ListingUpdateRequest) -> Result<(), ClientError> {
        self.record("update_status")?;
        self.state
            .updates
            .lock()
            .expect("updates")
            .push(request.clone());
        Ok(())
    }

    async fn delete_listing_by_id(
        &self,
        listing_number: &ListingNumber,
    ) -> Result<(), ClientError> {
        self.record("delete")?;
        self.state
            .listings
            .lock()
            .expect("listings")
            .retain(|listing| &listing.listing_number != listing_number);
        Ok(())
    }
}

fn listing(number: &str, address: &str, price: i64, status: ListingStatus) -> Listing {
    Listing {
        listing_number: ListingNumber::from(number),
        address: address.to_string(),
        square_footage: 1200,
        price,
        num_bedrooms: 3,
        num_bathrooms: 2.5,
        listing_status: status,
        lot_size: 0.3,
    }
}

fn mounted_page(
    api: FakeApi,
    config: PageConfig,
) -> (
    PageController<FakeApi>,
    Receiver<PageEvent>,
    Arc<MemorySurface>,
) {
    let (controller, events) = PageController::new(api, config);
    let surface = Arc::new(MemorySurface::with_regions([
        ALL_LISTINGS_REGION,
        SEARCH_RESULTS_REGION,
        NEW_LISTINGS_REGION,
    ]));
    controller.mount(surface.clone(), TableFormat::Html);
    (controller, events, surface)
}

fn drain(events: &Receiver<PageEvent>) -> Vec<PageEvent> {
    events.try_iter().collect()
}

fn create_request(address: &str) -> ListingCreateRequest {
    ListingCreateRequest {
        address: address.to_string(),
        price: "350000".into(),
        num_bedrooms: "4".into(),
        num_bathrooms: "2".into(),
        square_footage: "2100".into(),
        listing_status: "For Sale".into(),
        lot_size: "0.4".into(),
    }
}

#[tokio::test]
async fn get_listings_stores_open_listings_and_renders_them() {
    let api = FakeApi::with_listings(vec![
        listing("1", "1 Main St", 100, ListingStatus::ForSale),
        listing("2", "2 Main St", 100, ListingStatus::Sold),
    ]);
    let (controller, events, surface) = mounted_page(api.clone(), PageConfig::default());

    let outcome = controller.on_get_listings().await;
    assert!(outcome.is_completed());
    assert_eq!(api.calls(), vec!["open"]);

    let stored = controller.store().get(&LISTINGS).expect("listings");
    assert_eq!(stored.len(), 1);
    let table = surface.content(ALL_LISTINGS_REGION).expect("region");
    assert!(table.contains("1 Main St"));
    assert!(!table.contains("2 Main St"));
    assert!(matches!(
        drain(&events).as_slice(),
        [PageEvent::Info(message)] if message == "Here you go!"
    ));
}

#[tokio::test]
async fn agent_page_lists_every_status() {
    let api = FakeApi::with_listings(vec![
        listing("1", "1 Main St", 100, ListingStatus::ForSale),
        listing("2", "2 Main St", 100, ListingStatus::Withdrawn),
    ]);
    let (controller, _events, _surface) =
        mounted_page(api.clone(), PageConfig::new(PageVariant::Agent));

    controller.on_get_listings().await;
    assert_eq!(api.calls(), vec!["all"]);
    assert_eq!(controller.store().get(&LISTINGS).map(|l| l.len()), Some(2));
}

#[tokio::test]
async fn create_refreshes_listings_exactly_once() {
    let api = FakeApi::default();
    let (controller, events, surface) = mounted_page(api.clone(), PageConfig::default());

    let outcome = controller.on_create(create_request("77 Harbor Rd")).await;
    assert!(outcome.is_completed(), "{outcome:?}");

    assert_eq!(api.calls(), vec!["create", "open"]);
    assert_eq!(surface.render_count(ALL_LISTINGS_REGION), 1);
    assert!(surface
        .content(ALL_LISTINGS_REGION)
        .expect("region")
        .contains("77 Harbor Rd"));
    assert_eq!(controller.action_state(ActionKind::Create), ActionState::Idle);
    assert!(matches!(
        drain(&events).as_slice(),
        [PageEvent::Info(message)] if message == "Created Listing!"
    ));
}

#[tokio::test]
async fn agent_create_tracks_new_homes_before_refreshing() {
    let api = FakeApi::default();
    let (controller, _events, surface) =
        mounted_page(api.clone(), PageConfig::new(PageVariant::Agent));

    controller.on_create(create_request("5 Pine Ct")).await;
    controller.on_create(create_request("6 Pine Ct")).await;

    assert_eq!(api.calls(), vec!["create", "all", "create", "all"]);
    let new_homes = controller.store().get(&NEW_HOMES).expect("new homes");
    assert_eq!(new_homes.len(), 2);
    assert!(surface
        .content(NEW_LISTINGS_REGION)
        .expect("region")
        .contains("6 Pine Ct"));
    // one pass for newHomes, one for the refresh, per create
    assert_eq!(surface.render_count(ALL_LISTINGS_REGION), 4);
}

#[tokio::test]
async fn update_price_copies_cached_fields_verbatim() {
    let api = FakeApi::with_listings(vec![listing(
        "5",
        "1 Main St",
        100,
        ListingStatus::ForSale,
    )]);
    let (controller, _events, _surface) = mounted_page(api.clone(), PageConfig::default());
    controller.on_get_listings().await;

    let outcome = controller
        .on_update_price(FieldPatch {
            listing_number: ListingNumber::from("5"),
            value: "200".into(),
        })
        .await;
    assert!(outcome.is_completed(), "{outcome:?}");

    assert_eq!(
        api.updates(),
        vec![ListingUpdateRequest {
            listing_number: ListingNumber::from("5"),
            address: "1 Main St".into(),
            square_footage: "1200".into(),
            price: "200".into(),
            num_bedrooms: "3".into(),
            num_bathrooms: "2.5".into(),
            listing_status: "For Sale".into(),
            lot_size: "0.3".into(),
        }]
    );
    assert_eq!(api.calls(), vec!["open", "update_price", "open"]);
}

#[tokio::test]
async fn update_status_replaces_only_the_status() {
    let api = FakeApi::with_listings(vec![listing(
        "8",
        "8 Elm St",
        250_000,
        ListingStatus::ForSale,
    )]);
    let (controller, _events, _surface) = mounted_page(api.clone(), PageConfig::default());
    controller.on_get_listings().await;

    controller
        .on_update_status(FieldPatch {
            listing_number: ListingNumber::from("8"),
            value: "Sold".into(),
        })
        .await;

    let sent = api.updates();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].listing_status, "Sold");
    assert_eq!(sent[0].price, "250000");
    assert_eq!(sent[0].address, "8 Elm St");
}

#[tokio::test]
async fn blank_fallback_sends_empty_fields_for_uncached_listing() {
    let api = FakeApi::default();
    let config =
        PageConfig::default().with_missing_record_policy(MissingRecordPolicy::BlankFallback);
    let (controller, _events, _surface) = mounted_page(api.clone(), config);

    controller
        .on_update_price(FieldPatch {
            listing_number: ListingNumber::from("9"),
            value: "200".into(),
        })
        .await;

    assert_eq!(
        api.updates(),
        vec![ListingUpdateRequest {
            listing_number: ListingNumber::from("9"),
            price: "200".into(),
            ..ListingUpdateRequest::default()
        }]
    );
    assert_eq!(api.calls(), vec!["update_price", "open"]);
}

#[tokio::test]
async fn reject_policy_refuses_uncached_updates_without_calling_the_api() {
    let api = FakeApi::default();
    let config = PageConfig::default().with_missing_record_policy(MissingRecordPolicy::Reject);
    let (controller, events, _surface) = mounted_page(api.clone(), config);

    let outcome = controller
        .on_update_status(FieldPatch {
            listing_number: ListingNumber::from("9"),
            value: "Sold".into(),
        })
        .await;

    let err = outcome.error().expect("rejected");
    assert_eq!(err.category(), UiErrorCategory::Validation);
    assert_eq!(err.context(), UiErrorContext::UpdateStatus);
    assert!(api.calls().is_empty());
    assert!(matches!(drain(&events).as_slice(), [PageEvent::Error(_)]));
    assert_eq!(
        controller.action_state(ActionKind::UpdateStatus),
        ActionState::Idle
    );
}

#[tokio::test]
async fn fetch_policy_loads_the_record_before_patching() {
    let api = FakeApi::with_listings(vec![listing(
        "3",
        "3 Bay St",
        500_000,
        ListingStatus::ForSale,
    )]);
    let (controller, _events, _surface) = mounted_page(api.clone(), PageConfig::default());

    controller
        .on_update_status(FieldPatch {
            listing_number: ListingNumber::from("3"),
            value: "Under Contract".into(),
        })
        .await;
    assert_eq!(api.calls(), vec!["get", "update_status", "open"]);
    assert_eq!(api.updates()[0].address, "3 Bay St");
    assert_eq!(api.updates()[0].listing_status, "Under Contract");

    let outcome = controller
        .on_update_price(FieldPatch {
            listing_number: ListingNumber::from("404"),
            value: "1".into(),
        })
        .await;
    let err = outcome.error().expect("missing listing");
    assert_eq!(err.category(), UiErrorCategory::NotFound);
    assert_eq!(api.updates().len(), 1);
}

#[tokio::test]
async fn delete_refreshes_listings() {
    let api = FakeApi::with_listings(vec![
        listing("1", "1 Main St", 100, ListingStatus::ForSale),
        listing("2", "2 Main St", 100, ListingStatus::ForSale),
    ]);
    let (controller, _events, surface) = mounted_page(api.clone(), PageConfig::default());
    controller.on_get_listings().await;

    let outcome = controller
        .on_delete_listing(ListingNumber::from("1"))
        .await;
    assert!(outcome.is_completed());
    assert_eq!(api.calls(), vec!["open", "delete", "open"]);
    let table = surface.content(ALL_LISTINGS_REGION).expect("region");
    assert!(!table.contains("1 Main St"));
    assert!(table.contains("2 Main St"));
}

#[tokio::test]
async fn failed_call_leaves_store_and_tables_untouched() {
    let api = FakeApi::with_listings(vec![listing(
        "1",
        "1 Main St",
        100,
        ListingStatus::ForSale,
    )]);
    let (controller, events, surface) = mounted_page(api.clone(), PageConfig::default());
    controller.on_get_listings().await;
    drain(&events);
    let renders = surface.render_count(ALL_LISTINGS_REGION);
    let notifications = controller.store().notifications();

    api.fail_with(Some(ClientError::Transport("connection refused".into())));
    let outcome = controller.on_get_listings().await;
    let err = outcome.error().expect("transport failure");
    assert_eq!(err.message(), "Error getting listings!  Try again...");
    assert!(err.is_retryable());

    let outcome = controller.on_create(create_request("1 New Rd")).await;
    assert!(outcome.error().is_some());
    assert_eq!(api.calls(), vec!["open", "open", "create"]);

    assert_eq!(controller.store().notifications(), notifications);
    assert_eq!(surface.render_count(ALL_LISTINGS_REGION), renders);
    assert_eq!(controller.store().get(&LISTINGS).map(|l| l.len()), Some(1));
    assert_eq!(drain(&events).len(), 2);
    assert_eq!(controller.action_state(ActionKind::List), ActionState::Idle);

    // no failure is fatal
    api.fail_with(None);
    assert!(controller.on_get_listings().await.is_completed());
}

#[tokio::test]
async fn empty_search_is_a_soft_no_match_on_home_page() {
    let api = FakeApi::with_listings(vec![listing(
        "1",
        "1 Main St",
        900_000,
        ListingStatus::ForSale,
    )]);
    let (controller, events, surface) = mounted_page(api.clone(), PageConfig::default());

    let outcome = controller
        .on_search(ListingQuery {
            price: "100000".into(),
            ..ListingQuery::default()
        })
        .await;
    assert!(matches!(outcome, ActionOutcome::NoMatch));
    assert_eq!(controller.store().get(&SEARCHED_HOMES), Some(Vec::new()));
    assert!(matches!(drain(&events).as_slice(), [PageEvent::NoMatch(_)]));

    let table = surface.content(SEARCH_RESULTS_REGION).expect("region");
    assert!(table.contains("<th>Lot Size</th>"));
    assert!(!table.contains("<td>"));
}

#[tokio::test]
async fn empty_search_is_an_error_on_classic_page() {
    let api = FakeApi::default();
    let (controller, events, _surface) =
        mounted_page(api.clone(), PageConfig::new(PageVariant::Classic));

    let outcome = controller.on_search(ListingQuery::default()).await;
    let err = outcome.error().expect("hard no-match");
    assert_eq!(err.category(), UiErrorCategory::NotFound);
    assert_eq!(err.message(), "Error searching!  Try again...");
    assert_eq!(controller.store().get(&SEARCHED_HOMES), None);
    assert!(matches!(drain(&events).as_slice(), [PageEvent::Error(_)]));
}

#[tokio::test]
async fn search_results_render_matches() {
    let api = FakeApi::with_listings(vec![
        listing("1", "Cheap St", 90_000, ListingStatus::ForSale),
        listing("2", "Pricey Ave", 900_000, ListingStatus::ForSale),
    ]);
    let (controller, events, surface) = mounted_page(api, PageConfig::default());

    let outcome = controller
        .on_search(ListingQuery {
            price: "100000".into(),
            ..ListingQuery::default()
        })
        .await;
    assert!(outcome.is_completed());
    let table = surface.content(SEARCH_RESULTS_REGION).expect("region");
    assert!(table.contains("Cheap St"));
    assert!(!table.contains("Pricey Ave"));
    assert!(matches!(
        drain(&events).as_slice(),
        [PageEvent::Info(message)] if message == "Search successful!"
    ));
}

#[tokio::test]
async fn empty_listing_result_renders_header_only_table() {
    let api = FakeApi::default();
    let (controller, _events, surface) = mounted_page(api, PageConfig::default());

    assert!(controller.on_get_listings().await.is_completed());
    assert_eq!(controller.store().get(&LISTINGS), Some(Vec::new()));
    let table = surface.content(ALL_LISTINGS_REGION).expect("region");
    assert!(table.contains("<th>Listing Number</th>"));
    assert!(!table.contains("<td>"));
    assert!(!table.contains("No Item"));
}

#[tokio::test]
async fn submit_routes_by_form_id_and_prevents_default() {
    let api = FakeApi::with_listings(vec![listing(
        "5",
        "1 Main St",
        100,
        ListingStatus::ForSale,
    )]);
    let (controller, _events, _surface) = mounted_page(api.clone(), PageConfig::default());

    let mut list = SubmitEvent::new("get-all-open-listings-form");
    assert!(controller.handle_submit(&mut list).await.is_completed());
    assert!(list.default_prevented());

    let mut update = SubmitEvent::new(UPDATE_PRICE_FORM)
        .with_field("update-price-listingNumber", "5")
        .with_field("update-price", "200");
    assert!(controller.handle_submit(&mut update).await.is_completed());
    assert_eq!(api.updates()[0].price, "200");

    let mut create = SubmitEvent::new(CREATE_FORM).with_field("address", "9 Lake Dr");
    controller.handle_submit(&mut create).await;
    assert_eq!(api.calls(), vec!["open", "update_price", "open", "create", "open"]);
}

#[tokio::test]
async fn unknown_form_is_reported_without_api_calls() {
    let api = FakeApi::default();
    let (controller, events, _surface) = mounted_page(api.clone(), PageConfig::default());

    let mut event = SubmitEvent::new("newsletter-form");
    let outcome = controller.handle_submit(&mut event).await;
    assert!(event.default_prevented());
    let err = outcome.error().expect("unknown form");
    assert_eq!(err.context(), UiErrorContext::Submit);
    assert!(api.calls().is_empty());
    assert!(matches!(drain(&events).as_slice(), [PageEvent::Error(_)]));
}

#[tokio::test]
async fn render_failure_is_reported_but_value_is_kept() {
    let api = FakeApi::with_listings(vec![listing(
        "1",
        "1 Main St",
        100,
        ListingStatus::ForSale,
    )]);
    let (controller, _events) = PageController::new(api, PageConfig::default());
    // surface without any of the page's regions
    controller.mount(Arc::new(MemorySurface::default()), TableFormat::Text);

    let outcome = controller.on_get_listings().await;
    let err = outcome.error().expect("render failure");
    assert_eq!(err.category(), UiErrorCategory::Render);
    assert_eq!(controller.store().get(&LISTINGS).map(|l| l.len()), Some(1));
}

#[tokio::test]
async fn mutations_run_one_at_a_time() {
    let api = FakeApi::default();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    *api.state.create_gate.lock().expect("gate") = Some((entered.clone(), release.clone()));

    let (controller, _events) = PageController::new(api.clone(), PageConfig::default());
    let controller = Arc::new(controller);

    let creating = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.on_create(create_request("1 Gate St")).await })
    };
    entered.notified().await;
    assert_eq!(
        controller.action_state(ActionKind::Create),
        ActionState::Submitting
    );

    let deleting = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.on_delete_listing(ListingNumber::from("100")).await })
    };
    // reads are not blocked by the pending create
    assert!(controller.on_get_listings().await.is_completed());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(api.calls(), vec!["create", "open"]);

    release.notify_one();
    assert!(creating.await.expect("create task").is_completed());
    assert!(deleting.await.expect("delete task").is_completed());
    assert_eq!(
        api.calls(),
        vec!["create", "open", "open", "delete", "open"]
    );
}
