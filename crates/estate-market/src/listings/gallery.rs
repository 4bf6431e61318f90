//! Per-listing photo collection and the single-primary rule.
//!
//! A gallery is loaded, mutated and committed as one unit by the repository, so callers never
//! observe a listing with two primaries, or with photos but no primary.

use serde::Serialize;

use super::domain::{ImageId, ListingId, ListingImage};

/// Hard cap on photos per listing.
pub const MAX_PHOTOS_PER_LISTING: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GalleryError {
    #[error("a listing holds at most {max} photos ({existing} present, {requested} submitted)")]
    CapacityExceeded {
        max: usize,
        existing: usize,
        requested: usize,
    },
    #[error("image {0} does not belong to this listing")]
    UnknownImage(ImageId),
}

/// Outcome of removing a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedImage {
    pub image: ListingImage,
    pub new_primary: Option<ImageId>,
}

/// Refuse a batch that would take a listing past the photo cap.
pub fn check_capacity(existing: usize, requested: usize) -> Result<(), GalleryError> {
    if existing + requested > MAX_PHOTOS_PER_LISTING {
        return Err(GalleryError::CapacityExceeded {
            max: MAX_PHOTOS_PER_LISTING,
            existing,
            requested,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGallery {
    listing_id: ListingId,
    images: Vec<ListingImage>,
    next_id: u64,
}

impl ImageGallery {
    /// `next_id` is the first unused image id; the repository reads it back on commit.
    pub fn new(listing_id: ListingId, images: Vec<ListingImage>, next_id: u64) -> Self {
        let mut gallery = Self {
            listing_id,
            images,
            next_id,
        };
        gallery.sort();
        gallery
    }

    pub fn listing_id(&self) -> ListingId {
        self.listing_id
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Display order: primary first, then sort position, then id.
    pub fn images(&self) -> &[ListingImage] {
        &self.images
    }

    pub fn into_images(self) -> Vec<ListingImage> {
        self.images
    }

    pub fn primary(&self) -> Option<&ListingImage> {
        self.images.iter().find(|image| image.is_primary)
    }

    pub fn get(&self, id: ImageId) -> Option<&ListingImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn ensure_capacity(&self, additional: usize) -> Result<(), GalleryError> {
        check_capacity(self.images.len(), additional)
    }

    /// Append stored files as new photos. The whole batch is refused when it would exceed the
    /// cap. When no primary exists yet, the first new photo takes the role.
    pub fn attach(&mut self, paths: Vec<String>) -> Result<Vec<ListingImage>, GalleryError> {
        self.ensure_capacity(paths.len())?;

        let mut needs_primary = self.primary().is_none();
        let first_position = self
            .images
            .iter()
            .map(|image| image.sort_order)
            .max()
            .map_or(0, |max| max + 1);

        let mut added = Vec::with_capacity(paths.len());
        for (offset, path) in paths.into_iter().enumerate() {
            let image = ListingImage {
                id: ImageId(self.next_id),
                listing_id: self.listing_id,
                path,
                is_primary: needs_primary,
                sort_order: first_position + offset as i64,
            };
            self.next_id += 1;
            needs_primary = false;
            added.push(image.clone());
            self.images.push(image);
        }

        self.sort();
        Ok(added)
    }

    /// Clear the flag everywhere, then set it on `id`.
    pub fn set_primary(&mut self, id: ImageId) -> Result<(), GalleryError> {
        if self.get(id).is_none() {
            return Err(GalleryError::UnknownImage(id));
        }
        for image in &mut self.images {
            image.is_primary = image.id == id;
        }
        self.sort();
        Ok(())
    }

    /// Drop a photo. A removed primary hands over to the lowest sort position left.
    pub fn remove(&mut self, id: ImageId) -> Result<RemovedImage, GalleryError> {
        let index = self
            .images
            .iter()
            .position(|image| image.id == id)
            .ok_or(GalleryError::UnknownImage(id))?;
        let image = self.images.remove(index);

        let mut new_primary = None;
        if image.is_primary {
            if let Some(next) = self
                .images
                .iter_mut()
                .min_by_key(|candidate| (candidate.sort_order, candidate.id))
            {
                next.is_primary = true;
                new_primary = Some(next.id);
            }
        }

        self.sort();
        Ok(RemovedImage { image, new_primary })
    }

    /// Move a photo to a new sort position. Returns false when the photo is not in this gallery.
    pub fn reposition(&mut self, id: ImageId, sort_order: i64) -> bool {
        let Some(image) = self.images.iter_mut().find(|image| image.id == id) else {
            return false;
        };
        image.sort_order = sort_order;
        self.sort();
        true
    }

    fn sort(&mut self) {
        self.images
            .sort_by_key(|image| (!image.is_primary, image.sort_order, image.id));
    }
}
