use std::sync::{Arc, Mutex};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode as AxumStatus,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use shared::{domain::ListingStatus, error::ErrorCode};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    listings: Arc<Mutex<Vec<Listing>>>,
    queries: Arc<Mutex<Vec<ListingQuery>>>,
    updates: Arc<Mutex<Vec<ListingUpdateRequest>>>,
}

fn listing(number: &str, price: i64, status: ListingStatus) -> Listing {
    Listing {
        listing_number: ListingNumber::from(number),
        address: format!("{number} Main St"),
        square_footage: 1500,
        price,
        num_bedrooms: 3,
        num_bathrooms: 2.0,
        listing_status: status,
        lot_size: 0.25,
    }
}

async fn all_listings(State(state): State<ServerState>) -> axum::response::Response {
    let listings = state.listings.lock().expect("listings").clone();
    if listings.is_empty() {
        return AxumStatus::NO_CONTENT.into_response();
    }
    Json(listings).into_response()
}

async fn query_listings(
    State(state): State<ServerState>,
    Query(query): Query<ListingQuery>,
) -> axum::response::Response {
    state.queries.lock().expect("queries").push(query);
    AxumStatus::NO_CONTENT.into_response()
}

async fn one_listing(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let found = state
        .listings
        .lock()
        .expect("listings")
        .iter()
        .find(|listing| listing.listing_number.as_str() == number)
        .cloned();
    match found {
        Some(listing) => Json(listing).into_response(),
        None => (
            AxumStatus::NOT_FOUND,
            Json(ApiError::new(
                ErrorCode::NotFound,
                format!("listing {number} not found"),
            )),
        )
            .into_response(),
    }
}

async fn record_update(
    State(state): State<ServerState>,
    Json(request): Json<ListingUpdateRequest>,
) -> AxumStatus {
    state.updates.lock().expect("updates").push(request);
    AxumStatus::NO_CONTENT
}

async fn broken_body() -> &'static str {
    "not json"
}

async fn spawn_listing_server(state: ServerState) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/listing", get(all_listings))
        .route("/listing/allOpen", get(broken_body))
        .route("/listing/query", get(query_listings))
        .route("/listing/price", put(record_update))
        .route("/listing/:listing_number", get(one_listing))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn list_returns_server_listings_and_treats_no_content_as_empty() {
    let state = ServerState::default();
    let server_url = spawn_listing_server(state.clone())
        .await
        .expect("spawn server");
    let client = HttpListingClient::new(&server_url, None).expect("client");

    assert!(client.get_all_listings().await.expect("empty").is_empty());

    state
        .listings
        .lock()
        .expect("listings")
        .push(listing("5", 100, ListingStatus::ForSale));
    let listings = client.get_all_listings().await.expect("listings");
    assert_eq!(listings, vec![listing("5", 100, ListingStatus::ForSale)]);
}

#[tokio::test]
async fn search_sends_filters_as_query_parameters() {
    let state = ServerState::default();
    let server_url = spawn_listing_server(state.clone())
        .await
        .expect("spawn server");
    let client = HttpListingClient::new(&format!("{server_url}/"), None).expect("client");

    let query = ListingQuery {
        square_footage: "1200".into(),
        price: "300000".into(),
        ..ListingQuery::default()
    };
    let found = client
        .get_parameterized_listings(&query)
        .await
        .expect("search");
    assert!(found.is_empty());

    let recorded = state.queries.lock().expect("queries").clone();
    assert_eq!(recorded, vec![query]);
}

#[tokio::test]
async fn missing_listing_surfaces_server_message() {
    let server_url = spawn_listing_server(ServerState::default())
        .await
        .expect("spawn server");
    let client = HttpListingClient::new(&server_url, None).expect("client");

    let err = client
        .get_listing(&ListingNumber::from("404"))
        .await
        .expect_err("missing listing");
    assert!(err.is_not_found());
    match err {
        ClientError::Status { message, .. } => assert_eq!(message, "listing 404 not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn update_price_puts_full_record() {
    let state = ServerState::default();
    let server_url = spawn_listing_server(state.clone())
        .await
        .expect("spawn server");
    let client = HttpListingClient::new(&server_url, None).expect("client");

    let mut request =
        ListingUpdateRequest::from_listing(&listing("7", 100, ListingStatus::Sold));
    request.price = "200".into();
    client.update_price(&request).await.expect("update");

    let recorded = state.updates.lock().expect("updates").clone();
    assert_eq!(recorded, vec![request]);
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server_url = spawn_listing_server(ServerState::default())
        .await
        .expect("spawn server");
    let client = HttpListingClient::new(&server_url, None).expect("client");

    let err = client
        .get_all_open_listings()
        .await
        .expect_err("bad body");
    assert!(matches!(err, ClientError::Decode(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpListingClient::new(
        &format!("http://{addr}"),
        Some(std::time::Duration::from_secs(2)),
    )
    .expect("client");
    let err = client.get_all_listings().await.expect_err("refused");
    assert!(matches!(err, ClientError::Transport(_)), "unexpected error: {err}");
}

#[test]
fn rejects_unusable_server_urls() {
    assert!(matches!(
        HttpListingClient::new("not a url", None),
        Err(ClientError::Config(_))
    ));
    assert!(matches!(
        HttpListingClient::new("ftp://example.com", None),
        Err(ClientError::Config(_))
    ));
    let client = HttpListingClient::new("http://localhost:5001/", None).expect("client");
    assert_eq!(client.base_url(), "http://localhost:5001");
}
