use async_trait::async_trait;
use shared::{
    domain::{Listing, ListingNumber},
    protocol::{ListingCreateRequest, ListingQuery, ListingUpdateRequest},
};
use thiserror::Error;

/// Failure of a listing API call. An empty result is never an error: list
/// calls answer `Ok(vec![])` when nothing matched.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("listing api unreachable: {0}")]
    Transport(String),
    #[error("listing api answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("listing api response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid listing api configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

/// Remote listing endpoints consumed by the page controller.
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn get_all_open_listings(&self) -> Result<Vec<Listing>, ClientError>;

    async fn get_all_listings(&self) -> Result<Vec<Listing>, ClientError>;

    async fn get_parameterized_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<Listing>, ClientError>;

    async fn get_listing(&self, listing_number: &ListingNumber) -> Result<Listing, ClientError>;

    async fn create_listing(&self, request: &ListingCreateRequest)
        -> Result<Listing, ClientError>;

    async fn update_price(&self, request: &ListingUpdateRequest) -> Result<(), ClientError>;

    async fn update_status(&self, request: &ListingUpdateRequest) -> Result<(), ClientError>;

    async fn delete_listing_by_id(&self, listing_number: &ListingNumber)
        -> Result<(), ClientError>;
}
