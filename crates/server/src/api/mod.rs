//! Listing service: validation, read-through caching, and full-record updates
//! on top of [`Storage`].

use shared::{
    domain::{Listing, ListingNumber, ListingStatus},
    error::{ApiError, ErrorCode},
    protocol::{ListingCreateRequest, ListingQuery, ListingUpdateRequest},
};
use storage::{ListingFilter, Storage};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::CacheStore;

mod fields;

use fields::{parse_decimal, parse_whole};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub cache: CacheStore,
}

pub async fn list_listings(ctx: &ApiContext) -> Result<Vec<Listing>, ApiError> {
    ctx.storage.list_listings().await.map_err(internal)
}

pub async fn list_open_listings(ctx: &ApiContext) -> Result<Vec<Listing>, ApiError> {
    ctx.storage
        .search_listings(&ListingFilter {
            status: Some(ListingStatus::ForSale),
            ..ListingFilter::default()
        })
        .await
        .map_err(internal)
}

/// Zero-valued filters count as "not entered". Only open listings match.
pub async fn search_listings(
    ctx: &ApiContext,
    query: &ListingQuery,
) -> Result<Vec<Listing>, ApiError> {
    let filter = ListingFilter {
        min_square_footage: non_zero_whole(parse_whole("squareFootage", &query.square_footage)?),
        max_price: non_zero_whole(parse_whole("price", &query.price)?),
        min_bedrooms: non_zero_whole(parse_whole("numBedrooms", &query.num_bedrooms)?),
        min_bathrooms: non_zero_decimal(parse_decimal("numBathrooms", &query.num_bathrooms)?),
        min_lot_size: non_zero_decimal(parse_decimal("lotSize", &query.lot_size)?),
        status: Some(ListingStatus::ForSale),
    };
    debug!(?filter, "searching listings");
    ctx.storage.search_listings(&filter).await.map_err(internal)
}

pub async fn find_listing(
    ctx: &ApiContext,
    listing_number: &ListingNumber,
) -> Result<Listing, ApiError> {
    if let Some(cached) = ctx.cache.get(listing_number).await {
        return Ok(cached);
    }

    let listing = ctx
        .storage
        .get_listing(listing_number)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(listing_number))?;
    ctx.cache
        .add(listing_number.clone(), listing.clone())
        .await;
    Ok(listing)
}

pub async fn create_listing(
    ctx: &ApiContext,
    req: &ListingCreateRequest,
) -> Result<Listing, ApiError> {
    let listing = Listing {
        listing_number: ListingNumber(Uuid::new_v4().to_string()),
        address: req.address.clone(),
        square_footage: parse_whole("squareFootage", &req.square_footage)?,
        price: parse_whole("price", &req.price)?,
        num_bedrooms: parse_whole("numBedrooms", &req.num_bedrooms)?,
        num_bathrooms: parse_decimal("numBathrooms", &req.num_bathrooms)?,
        listing_status: parse_status(&req.listing_status)?,
        lot_size: parse_decimal("lotSize", &req.lot_size)?,
    };
    ensure_positive_price(listing.price)?;

    ctx.storage.save_listing(&listing).await.map_err(internal)?;
    info!(listing_number = %listing.listing_number, "listing created");
    Ok(listing)
}

pub async fn update_price(ctx: &ApiContext, req: &ListingUpdateRequest) -> Result<(), ApiError> {
    let listing = listing_from_update(req)?;
    ensure_positive_price(listing.price)?;
    replace_listing(ctx, listing).await
}

pub async fn update_status(ctx: &ApiContext, req: &ListingUpdateRequest) -> Result<(), ApiError> {
    let listing = listing_from_update(req)?;
    replace_listing(ctx, listing).await
}

pub async fn delete_listing(
    ctx: &ApiContext,
    listing_number: &ListingNumber,
) -> Result<(), ApiError> {
    let removed = ctx
        .storage
        .delete_listing(listing_number)
        .await
        .map_err(internal)?;
    ctx.cache.evict(listing_number).await;
    debug!(%listing_number, removed, "listing delete processed");
    Ok(())
}

async fn replace_listing(ctx: &ApiContext, listing: Listing) -> Result<(), ApiError> {
    let exists = ctx
        .storage
        .listing_exists(&listing.listing_number)
        .await
        .map_err(internal)?;
    if !exists {
        return Err(not_found(&listing.listing_number));
    }

    ctx.storage.save_listing(&listing).await.map_err(internal)?;
    ctx.cache.evict(&listing.listing_number).await;
    info!(listing_number = %listing.listing_number, "listing replaced");
    Ok(())
}

fn listing_from_update(req: &ListingUpdateRequest) -> Result<Listing, ApiError> {
    if req.listing_number.as_str().trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "listingNumber must not be empty",
        ));
    }
    Ok(Listing {
        listing_number: req.listing_number.clone(),
        address: req.address.clone(),
        square_footage: parse_whole("squareFootage", &req.square_footage)?,
        price: parse_whole("price", &req.price)?,
        num_bedrooms: parse_whole("numBedrooms", &req.num_bedrooms)?,
        num_bathrooms: parse_decimal("numBathrooms", &req.num_bathrooms)?,
        listing_status: parse_status(&req.listing_status)?,
        lot_size: parse_decimal("lotSize", &req.lot_size)?,
    })
}

fn parse_status(raw: &str) -> Result<ListingStatus, ApiError> {
    raw.parse::<ListingStatus>().map_err(ApiError::from)
}

fn ensure_positive_price(price: i64) -> Result<(), ApiError> {
    if price < 1 {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "price must be at least 1",
        ));
    }
    Ok(())
}

fn non_zero_whole(value: i64) -> Option<i64> {
    (value != 0).then_some(value)
}

fn non_zero_decimal(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

fn not_found(listing_number: &ListingNumber) -> ApiError {
    ApiError::new(
        ErrorCode::NotFound,
        format!("listing {listing_number} not found"),
    )
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
