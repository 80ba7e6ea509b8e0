//! Wire messages exchanged between the catalog pages and the listing API.
//!
//! Request bodies carry raw form text: numeric fields stay strings on the wire
//! and are parsed by the server, so whatever the user typed reaches the API
//! unmodified.

use serde::{Deserialize, Serialize};

use crate::domain::{Listing, ListingNumber};

pub fn listings_route() -> &'static str {
    "/listing"
}

pub fn open_listings_route() -> &'static str {
    "/listing/allOpen"
}

pub fn listing_query_route() -> &'static str {
    "/listing/query"
}

pub fn update_price_route() -> &'static str {
    "/listing/price"
}

pub fn update_status_route() -> &'static str {
    "/listing/status"
}

pub fn listing_route(listing_number: &ListingNumber) -> String {
    format!("/listing/{listing_number}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCreateRequest {
    pub address: String,
    pub price: String,
    pub num_bedrooms: String,
    pub num_bathrooms: String,
    pub square_footage: String,
    pub listing_status: String,
    pub lot_size: String,
}

/// Full-record replacement. Every field is resent on each update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdateRequest {
    pub listing_number: ListingNumber,
    pub address: String,
    pub square_footage: String,
    pub price: String,
    pub num_bedrooms: String,
    pub num_bathrooms: String,
    pub listing_status: String,
    pub lot_size: String,
}

impl ListingUpdateRequest {
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            listing_number: listing.listing_number.clone(),
            address: listing.address.clone(),
            square_footage: listing.square_footage.to_string(),
            price: listing.price.to_string(),
            num_bedrooms: listing.num_bedrooms.to_string(),
            num_bathrooms: listing.num_bathrooms.to_string(),
            listing_status: listing.listing_status.label().to_string(),
            lot_size: listing.lot_size.to_string(),
        }
    }

    /// Record with only the key known; every other field is blank.
    pub fn blank(listing_number: ListingNumber) -> Self {
        Self {
            listing_number,
            ..Self::default()
        }
    }
}

/// Search filters. An empty or zero value means "not entered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingQuery {
    pub square_footage: String,
    pub price: String,
    pub num_bedrooms: String,
    pub num_bathrooms: String,
    pub lot_size: String,
}
