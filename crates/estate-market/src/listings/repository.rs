use crate::accounts::UserId;

use super::domain::{ImageId, Listing, ListingDraft, ListingId, ListingImage};
use super::filter::{ListingFilter, Page, PageRequest};
use super::gallery::ImageGallery;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ListingRepository: Send + Sync {
    /// Persist a new listing, assigning the next id in creation order.
    fn insert_listing(&self, owner: UserId, draft: ListingDraft) -> Result<Listing, RepositoryError>;
    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError>;
    fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// Remove the listing record together with its image records.
    fn remove_listing(&self, id: ListingId) -> Result<(), RepositoryError>;
    /// Matching listings, newest first.
    fn search(
        &self,
        filter: &ListingFilter,
        request: PageRequest,
    ) -> Result<Page<Listing>, RepositoryError>;
    /// Listings of one owner, newest first.
    fn listings_by_owner(&self, owner: UserId) -> Result<Vec<Listing>, RepositoryError>;
    /// Photos of a listing in display order.
    fn images(&self, listing: ListingId) -> Result<Vec<ListingImage>, RepositoryError>;
    fn fetch_image(&self, id: ImageId) -> Result<Option<ListingImage>, RepositoryError>;
    /// Load the listing's gallery, run `change` against it and commit the result only when the
    /// closure succeeds. Fails with `NotFound` when the listing does not exist.
    fn with_gallery<T, E, F>(&self, listing: ListingId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut ImageGallery) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
