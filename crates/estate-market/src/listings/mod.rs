//! Listings, their photo galleries and the public search.
//!
//! Every mutation goes through [`ListingService`], which re-checks ownership against the
//! stored listing on each call and keeps exactly one primary photo per non-empty gallery.

pub mod domain;
pub mod filter;
pub mod form;
pub mod format;
pub mod gallery;
pub mod guard;
pub mod locations;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AreaUnit, Category, CurrencyCode, ImageId, Listing, ListingDraft, ListingId, ListingImage,
    ListingStatus, Location, Surface, BASE_CURRENCY,
};
pub use filter::{ListingFilter, Page, PageRequest, SearchParams, PAGE_SIZE};
pub use form::{FieldError, ListingForm};
pub use gallery::{GalleryError, ImageGallery, MAX_PHOTOS_PER_LISTING};
pub use guard::{AccessDenied, OwnershipGuard};
pub use repository::{ListingRepository, RepositoryError};
pub use router::{listing_routes, PHOTO_FIELD};
pub use service::{ListingService, ListingServiceError, ReorderEntry};
pub use storage::{FsImageStore, ImageExtension, ImageStore, StorageError, UploadCandidate};
pub use views::{ImageRemoval, ListingCard, ListingDetail, SearchResults};
