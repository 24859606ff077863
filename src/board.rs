use chrono::Utc;
use std::cmp::Reverse;
use thiserror::Error;

use crate::filter::filter_listings;
use crate::form::FormError;
use crate::models::{CreatedAt, FilterCriteria, Listing, PostForm};
use crate::normalize::normalize_listing;
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-memory listing set backed by a document store.
pub struct Board<S> {
    store: S,
    listings: Vec<Listing>,
}

impl<S: DocumentStore> Board<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            listings: Vec::new(),
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    /// Replaces the listing set with a fresh fetch. On error the previous
    /// set is kept.
    pub fn refresh(&mut self) -> Result<usize, StoreError> {
        let documents = self.store.fetch_all()?;

        let mut listings: Vec<Listing> = documents
            .iter()
            .map(|(id, raw)| {
                let listing = normalize_listing(raw, id);
                tracing::debug!(%id, title = %listing.title, "normalized listing");
                listing
            })
            .collect();
        listings.sort_by_key(|l| Reverse(l.created_at.as_ref().and_then(CreatedAt::instant)));

        tracing::info!(count = listings.len(), "refreshed listings");
        self.listings = listings;
        Ok(self.listings.len())
    }

    /// Validates and stores a new listing, then refetches so the set
    /// includes it. Returns the id assigned by the store once the insert
    /// lands; a failed refetch after that only leaves the set stale.
    pub fn submit(&mut self, form: &PostForm) -> Result<String, SubmitError> {
        form.validate()?;
        let id = self.store.insert(&form.to_payload(Utc::now()))?;
        if let Err(e) = self.refresh() {
            tracing::warn!(%id, error = %e, "listing stored but refetch failed");
        }
        Ok(id)
    }

    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<&Listing> {
        filter_listings(&self.listings, criteria)
    }
}
