use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use shared::domain::{Listing, ListingNumber};
use tokio::sync::RwLock;

struct CachedListing {
    listing: Listing,
    expires_at: Instant,
}

/// Read-through cache for single-listing lookups. Entries expire a fixed time
/// after they were written.
#[derive(Clone)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<ListingNumber, CachedListing>>>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &ListingNumber) -> Option<Listing> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.listing.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    /// Stores `listing` and drops every entry that has already expired.
    pub async fn add(&self, key: ListingNumber, listing: Listing) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CachedListing {
                listing,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn evict(&self, key: &ListingNumber) {
        self.entries.write().await.remove(key);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
