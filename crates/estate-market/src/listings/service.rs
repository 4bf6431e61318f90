use std::collections::BTreeMap;
use std::sync::Arc;

use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use tracing::{info, warn};

use crate::accounts::{Identity, UserId};

use super::domain::{Category, ImageId, Listing, ListingId, ListingImage, ListingStatus};
use super::filter::{ListingFilter, PageRequest, SearchParams};
use super::form::{FieldError, ListingForm};
use super::gallery::{check_capacity, GalleryError};
use super::guard::{AccessDenied, OwnershipGuard};
use super::locations;
use super::repository::{ListingRepository, RepositoryError};
use super::storage::{accepted_uploads, ImageExtension, ImageStore, UploadCandidate};
use super::views::{ImageRemoval, ListingCard, ListingDetail, SearchResults};

/// One entry of a reorder request. Both fields take a JSON number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReorderEntry {
    #[serde(deserialize_with = "image_id")]
    pub id: ImageId,
    #[serde(deserialize_with = "number_or_string")]
    pub sort_order: i64,
}

fn image_id<'de, D>(deserializer: D) -> Result<ImageId, D::Error>
where
    D: Deserializer<'de>,
{
    number_or_string(deserializer).map(ImageId)
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// Service composing the ownership guard, repository and photo storage.
pub struct ListingService<R, S> {
    guard: OwnershipGuard,
    repository: Arc<R>,
    images: Arc<S>,
}

impl<R, S> ListingService<R, S>
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    pub fn new(repository: Arc<R>, images: Arc<S>) -> Self {
        Self {
            guard: OwnershipGuard,
            repository,
            images,
        }
    }

    /// Public search. `scope` pins the category for the house and plot pages.
    pub fn search(
        &self,
        params: &SearchParams,
        scope: Option<Category>,
    ) -> Result<SearchResults, ListingServiceError> {
        let filter = ListingFilter::from_params(params);
        let filter = match scope {
            Some(category) => filter.within(category),
            None => filter,
        };

        let page = self
            .repository
            .search(&filter, PageRequest::from_params(params))?;
        let results = page.try_map(|listing| self.card(&listing))?;

        let sub_districts = params
            .district
            .as_deref()
            .map(|district| locations::sub_districts(district).to_vec())
            .unwrap_or_default();

        Ok(SearchResults {
            results,
            sub_districts,
        })
    }

    pub fn detail(
        &self,
        identity: &Identity,
        id: ListingId,
    ) -> Result<ListingDetail, ListingServiceError> {
        let listing = self.load(id)?;
        let images = self.repository.images(id)?;
        let is_owner = identity.user_id() == Some(listing.owner);
        Ok(ListingDetail::new(listing, images, is_owner))
    }

    /// The caller's own listings, newest first.
    pub fn dashboard(&self, identity: &Identity) -> Result<Vec<ListingCard>, ListingServiceError> {
        let owner = self.guard.require_user(identity)?;
        self.repository
            .listings_by_owner(owner)?
            .iter()
            .map(|listing| self.card(listing))
            .collect()
    }

    /// Publish a listing and its photos. A refused photo batch removes the new listing again.
    pub fn create(
        &self,
        identity: &Identity,
        form: &ListingForm,
        uploads: Vec<UploadCandidate>,
    ) -> Result<ListingDetail, ListingServiceError> {
        let owner = self.guard.require_user(identity)?;
        let draft = form.validate().map_err(ListingServiceError::Validation)?;
        let listing = self.repository.insert_listing(owner, draft)?;

        if let Err(err) = self.attach_uploads(listing.id, accepted_uploads(uploads)) {
            if let Err(rollback) = self.repository.remove_listing(listing.id) {
                warn!(listing_id = %listing.id, %rollback, "failed to roll back listing");
            }
            return Err(err);
        }

        info!(listing_id = %listing.id, owner = %owner, "listing published");
        let images = self.repository.images(listing.id)?;
        Ok(ListingDetail::new(listing, images, true))
    }

    /// Edit a listing and append photos. A refused photo batch leaves the listing unchanged.
    pub fn update(
        &self,
        identity: &Identity,
        id: ListingId,
        form: &ListingForm,
        uploads: Vec<UploadCandidate>,
    ) -> Result<ListingDetail, ListingServiceError> {
        let mut listing = self.load(id)?;
        self.authorize(identity, &listing)?;
        let draft = form
            .validate_update(&listing)
            .map_err(ListingServiceError::Validation)?;

        let accepted = accepted_uploads(uploads);
        let existing = self.repository.images(id)?.len();
        check_capacity(existing, accepted.len())?;

        listing.apply(draft);
        self.repository.update_listing(listing.clone())?;
        self.attach_uploads(id, accepted)?;

        info!(listing_id = %id, "listing updated");
        let images = self.repository.images(id)?;
        Ok(ListingDetail::new(listing, images, true))
    }

    pub fn delete(&self, identity: &Identity, id: ListingId) -> Result<(), ListingServiceError> {
        let listing = self.load(id)?;
        self.authorize(identity, &listing)?;
        self.purge(&listing)
    }

    /// Remove every listing of `owner`; used when the account itself is deleted.
    pub fn delete_all_for(&self, owner: UserId) -> Result<usize, ListingServiceError> {
        let listings = self.repository.listings_by_owner(owner)?;
        for listing in &listings {
            self.purge(listing)?;
        }
        Ok(listings.len())
    }

    /// Flip between for-sale/sold or for-rent/rented.
    pub fn toggle_status(
        &self,
        identity: &Identity,
        id: ListingId,
    ) -> Result<ListingStatus, ListingServiceError> {
        let mut listing = self.load(id)?;
        self.authorize(identity, &listing)?;

        let previous = listing.status.clone();
        listing.status = listing.status.toggled();
        let status = listing.status.clone();
        self.repository.update_listing(listing)?;

        info!(listing_id = %id, from = previous.label(), to = status.label(), "status toggled");
        Ok(status)
    }

    pub fn delete_image(
        &self,
        identity: &Identity,
        image_id: ImageId,
    ) -> Result<ImageRemoval, ListingServiceError> {
        let (image, listing) = self.load_image(image_id)?;
        self.authorize(identity, &listing)?;

        self.discard_file(&image.path);
        let removed = self
            .repository
            .with_gallery(listing.id, |gallery| Ok::<_, ListingServiceError>(gallery.remove(image_id)?))?;

        info!(
            listing_id = %listing.id,
            image_id = %image_id,
            new_primary = ?removed.new_primary,
            "photo deleted"
        );
        Ok(ImageRemoval {
            removed: image_id,
            new_primary_id: removed.new_primary,
        })
    }

    pub fn set_primary(
        &self,
        identity: &Identity,
        image_id: ImageId,
    ) -> Result<ImageId, ListingServiceError> {
        let (_, listing) = self.load_image(image_id)?;
        self.authorize(identity, &listing)?;

        self.repository
            .with_gallery(listing.id, |gallery| Ok::<_, ListingServiceError>(gallery.set_primary(image_id)?))?;

        info!(listing_id = %listing.id, image_id = %image_id, "primary photo changed");
        Ok(image_id)
    }

    /// Apply new sort positions. Entries for photos the caller does not own, or that do not
    /// exist, are skipped. Returns how many entries were applied.
    pub fn reorder(
        &self,
        identity: &Identity,
        entries: &[ReorderEntry],
    ) -> Result<usize, ListingServiceError> {
        let user = self.guard.require_user(identity)?;

        let mut by_listing: BTreeMap<ListingId, Vec<ReorderEntry>> = BTreeMap::new();
        for entry in entries {
            let Some(image) = self.repository.fetch_image(entry.id)? else {
                continue;
            };
            let Some(listing) = self.repository.fetch_listing(image.listing_id)? else {
                continue;
            };
            if listing.owner != user {
                warn!(image_id = %entry.id, user = %user, "skipping reorder of foreign photo");
                continue;
            }
            by_listing.entry(listing.id).or_default().push(*entry);
        }

        let mut applied = 0;
        for (listing, entries) in by_listing {
            applied += self.repository.with_gallery(listing, |gallery| {
                Ok::<_, ListingServiceError>(
                    entries
                        .iter()
                        .filter(|entry| gallery.reposition(entry.id, entry.sort_order))
                        .count(),
                )
            })?;
        }
        Ok(applied)
    }

    fn authorize(&self, identity: &Identity, listing: &Listing) -> Result<UserId, AccessDenied> {
        self.guard.authorize(identity, listing).inspect_err(|denied| {
            warn!(listing_id = %listing.id, user = ?identity.user_id(), %denied, "listing access refused");
        })
    }

    fn load(&self, id: ListingId) -> Result<Listing, ListingServiceError> {
        self.repository
            .fetch_listing(id)?
            .ok_or(ListingServiceError::ListingNotFound(id))
    }

    fn load_image(&self, id: ImageId) -> Result<(ListingImage, Listing), ListingServiceError> {
        let image = self
            .repository
            .fetch_image(id)?
            .ok_or(ListingServiceError::ImageNotFound(id))?;
        let listing = self.load(image.listing_id)?;
        Ok((image, listing))
    }

    fn card(&self, listing: &Listing) -> Result<ListingCard, ListingServiceError> {
        let images = self.repository.images(listing.id)?;
        Ok(ListingCard::new(listing, images.first()))
    }

    /// Photo files first, then the records.
    fn purge(&self, listing: &Listing) -> Result<(), ListingServiceError> {
        let images = self.repository.images(listing.id)?;
        for image in &images {
            self.discard_file(&image.path);
        }
        self.repository.remove_listing(listing.id)?;
        info!(listing_id = %listing.id, photos = images.len(), "listing deleted");
        Ok(())
    }

    /// Files are written before the records are committed; a failed commit removes them again.
    fn attach_uploads(
        &self,
        listing: ListingId,
        accepted: Vec<(UploadCandidate, ImageExtension)>,
    ) -> Result<Vec<ListingImage>, ListingServiceError> {
        if accepted.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.repository.images(listing)?.len();
        if let Err(err) = check_capacity(existing, accepted.len()) {
            warn!(listing_id = %listing, %err, "photo batch refused");
            return Err(err.into());
        }

        let mut stored = Vec::with_capacity(accepted.len());
        for (candidate, extension) in accepted {
            match self.images.save(&candidate.bytes, extension) {
                Ok(path) => stored.push(path),
                Err(err) => {
                    warn!(listing_id = %listing, file = %candidate.file_name, %err, "skipping photo that could not be stored");
                }
            }
        }
        if stored.is_empty() {
            return Ok(Vec::new());
        }

        let committed = self.repository.with_gallery(listing, |gallery| {
            Ok::<_, ListingServiceError>(gallery.attach(stored.clone())?)
        });

        match committed {
            Ok(images) => {
                info!(listing_id = %listing, count = images.len(), "photos attached");
                Ok(images)
            }
            Err(err) => {
                for path in &stored {
                    self.discard_file(path);
                }
                Err(err)
            }
        }
    }

    fn discard_file(&self, path: &str) {
        if let Err(err) = self.images.remove(path) {
            warn!(path, %err, "failed to remove photo file");
        }
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error("listing form has invalid fields")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("listing {0} not found")]
    ListingNotFound(ListingId),
    #[error("image {0} not found")]
    ImageNotFound(ImageId),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
