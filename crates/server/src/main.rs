use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use shared::{
    domain::{Listing, ListingNumber},
    error::{ApiError, ErrorCode},
    protocol::{
        listing_query_route, listings_route, open_listings_route, update_price_route,
        update_status_route, ListingCreateRequest, ListingQuery, ListingUpdateRequest,
    },
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod api;
mod app_state;
mod cache;
mod config;

use api::ApiContext;
use app_state::AppState;
use cache::CacheStore;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        cache: CacheStore::new(settings.cache_ttl()),
    };

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, cache_ttl_seconds = settings.cache_ttl_seconds, "listing server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(listings_route(), get(http_list_listings).post(http_create_listing))
        .route(open_listings_route(), get(http_list_open_listings))
        .route(listing_query_route(), get(http_search_listings))
        .route(update_price_route(), put(http_update_price))
        .route(update_status_route(), put(http_update_status))
        .route(
            "/listing/:listing_number",
            get(http_find_listing).delete(http_delete_listing),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        error_response(ApiError::new(ErrorCode::Internal, e.to_string()))
    })?;
    Ok("ok")
}

async fn http_list_listings(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let listings = api::list_listings(&state.api)
        .await
        .map_err(error_response)?;
    Ok(listing_list_response(listings))
}

async fn http_list_open_listings(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let listings = api::list_open_listings(&state.api)
        .await
        .map_err(error_response)?;
    Ok(listing_list_response(listings))
}

async fn http_search_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Response> {
    let listings = api::search_listings(&state.api, &query)
        .await
        .map_err(error_response)?;
    Ok(listing_list_response(listings))
}

async fn http_find_listing(
    State(state): State<Arc<AppState>>,
    Path(listing_number): Path<String>,
) -> ApiResult<Json<Listing>> {
    let listing = api::find_listing(&state.api, &ListingNumber(listing_number))
        .await
        .map_err(error_response)?;
    Ok(Json(listing))
}

async fn http_create_listing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListingCreateRequest>,
) -> ApiResult<Json<Listing>> {
    let listing = api::create_listing(&state.api, &req)
        .await
        .map_err(error_response)?;
    Ok(Json(listing))
}

async fn http_update_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListingUpdateRequest>,
) -> ApiResult<StatusCode> {
    api::update_price(&state.api, &req)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::OK)
}

async fn http_update_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListingUpdateRequest>,
) -> ApiResult<StatusCode> {
    api::update_status(&state.api, &req)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::OK)
}

async fn http_delete_listing(
    State(state): State<Arc<AppState>>,
    Path(listing_number): Path<String>,
) -> ApiResult<StatusCode> {
    api::delete_listing(&state.api, &ListingNumber(listing_number))
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// An empty collection is answered with `204 No Content`.
fn listing_list_response(listings: Vec<Listing>) -> Response {
    if listings.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(listings).into_response()
    }
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(message = %err.message, "listing request failed");
    }
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
