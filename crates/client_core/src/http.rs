use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Listing, ListingNumber},
    error::ApiError,
    protocol::{
        listing_query_route, listing_route, listings_route, open_listings_route,
        update_price_route, update_status_route, ListingCreateRequest, ListingQuery,
        ListingUpdateRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::api::{ClientError, ListingApi};

/// [`ListingApi`] over the listing REST endpoints.
#[derive(Clone)]
pub struct HttpListingClient {
    http: Client,
    base_url: String,
}

impl HttpListingClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid server url '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported scheme '{}' in server url",
                parsed.scheme()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch_listings(&self, request: RequestBuilder) -> Result<Vec<Listing>, ClientError> {
        let response = request.send().await.map_err(transport)?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        decode(ensure_success(response).await?).await
    }

    async fn send_update(&self, path: &str, request: &ListingUpdateRequest) -> Result<(), ClientError> {
        debug!(listing_number = %request.listing_number, path, "sending listing update");
        let response = self
            .http
            .put(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ListingApi for HttpListingClient {
    async fn get_all_open_listings(&self) -> Result<Vec<Listing>, ClientError> {
        self.fetch_listings(self.http.get(self.url(open_listings_route())))
            .await
    }

    async fn get_all_listings(&self) -> Result<Vec<Listing>, ClientError> {
        self.fetch_listings(self.http.get(self.url(listings_route())))
            .await
    }

    async fn get_parameterized_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<Listing>, ClientError> {
        self.fetch_listings(self.http.get(self.url(listing_query_route())).query(query))
            .await
    }

    async fn get_listing(&self, listing_number: &ListingNumber) -> Result<Listing, ClientError> {
        let response = self
            .http
            .get(self.url(&listing_route(listing_number)))
            .send()
            .await
            .map_err(transport)?;
        decode(ensure_success(response).await?).await
    }

    async fn create_listing(
        &self,
        request: &ListingCreateRequest,
    ) -> Result<Listing, ClientError> {
        let response = self
            .http
            .post(self.url(listings_route()))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        decode(ensure_success(response).await?).await
    }

    async fn update_price(&self, request: &ListingUpdateRequest) -> Result<(), ClientError> {
        self.send_update(update_price_route(), request).await
    }

    async fn update_status(&self, request: &ListingUpdateRequest) -> Result<(), ClientError> {
        self.send_update(update_status_route(), request).await
    }

    async fn delete_listing_by_id(
        &self,
        listing_number: &ListingNumber,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&listing_route(listing_number)))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body,
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
