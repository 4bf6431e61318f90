//! In-process store backing both repositories, with an optional JSON snapshot on disk.
//!
//! Every mutation runs against a copy of the state under one lock and replaces the live state
//! only after the closure and the snapshot write both succeed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::accounts::{NewUser, User, UserId, UserRepository};
use crate::listings::domain::{ImageId, Listing, ListingDraft, ListingId, ListingImage};
use crate::listings::filter::{ListingFilter, Page, PageRequest};
use crate::listings::gallery::ImageGallery;
use crate::listings::{ListingRepository, RepositoryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreState {
    users: BTreeMap<u64, User>,
    listings: BTreeMap<u64, Listing>,
    images: BTreeMap<u64, ListingImage>,
    next_user_id: u64,
    next_listing_id: u64,
    next_image_id: u64,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            listings: BTreeMap::new(),
            images: BTreeMap::new(),
            next_user_id: 1,
            next_listing_id: 1,
            next_image_id: 1,
        }
    }
}

impl StoreState {
    fn gallery(&self, listing: ListingId) -> ImageGallery {
        let images = self
            .images
            .values()
            .filter(|image| image.listing_id == listing)
            .cloned()
            .collect();
        ImageGallery::new(listing, images, self.next_image_id)
    }

    fn replace_gallery(&mut self, gallery: ImageGallery) {
        let listing = gallery.listing_id();
        self.next_image_id = self.next_image_id.max(gallery.next_id());
        self.images.retain(|_, image| image.listing_id != listing);
        for image in gallery.into_images() {
            self.images.insert(image.id.0, image);
        }
    }
}

#[derive(Debug, Default)]
pub struct MarketStore {
    state: Mutex<StoreState>,
    snapshot: Option<PathBuf>,
}

impl MarketStore {
    /// Volatile store; contents vanish with the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store persisted to `path`, loading the previous snapshot when one exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read(&path).map_err(|err| unavailable(&path, err))?;
            serde_json::from_slice(&raw).map_err(|err| unavailable(&path, err))?
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: Mutex::new(state),
            snapshot: Some(path),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    fn read<T>(&self, query: impl FnOnce(&StoreState) -> T) -> Result<T, RepositoryError> {
        let guard = self.lock()?;
        Ok(query(&guard))
    }

    fn transact<T, E>(&self, change: impl FnOnce(&mut StoreState) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let mut guard = self.lock()?;
        let mut draft = guard.clone();
        let outcome = change(&mut draft)?;
        self.persist(&draft)?;
        *guard = draft;
        Ok(outcome)
    }

    fn persist(&self, state: &StoreState) -> Result<(), RepositoryError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let result = serde_json::to_vec_pretty(state)
            .map_err(|err| unavailable(path, err))
            .and_then(|bytes| {
                let staging = path.with_extension("tmp");
                fs::write(&staging, bytes).map_err(|err| unavailable(&staging, err))?;
                fs::rename(&staging, path).map_err(|err| unavailable(path, err))
            });

        if let Err(err) = &result {
            error!(snapshot = %path.display(), %err, "failed to persist store snapshot");
        }
        result
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

impl ListingRepository for MarketStore {
    fn insert_listing(&self, owner: UserId, draft: ListingDraft) -> Result<Listing, RepositoryError> {
        self.transact(|state| {
            if !state.users.contains_key(&owner.0) {
                return Err(RepositoryError::NotFound);
            }
            let id = ListingId(state.next_listing_id);
            state.next_listing_id += 1;
            let listing = Listing::from_draft(id, owner, draft, Utc::now());
            state.listings.insert(id.0, listing.clone());
            Ok(listing)
        })
    }

    fn update_listing(&self, listing: Listing) -> Result<(), RepositoryError> {
        self.transact(|state| match state.listings.get_mut(&listing.id.0) {
            Some(slot) => {
                *slot = listing;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        self.read(|state| state.listings.get(&id.0).cloned())
    }

    fn remove_listing(&self, id: ListingId) -> Result<(), RepositoryError> {
        self.transact(|state| {
            if state.listings.remove(&id.0).is_none() {
                return Err(RepositoryError::NotFound);
            }
            state.images.retain(|_, image| image.listing_id != id);
            Ok(())
        })
    }

    fn search(
        &self,
        filter: &ListingFilter,
        request: PageRequest,
    ) -> Result<Page<Listing>, RepositoryError> {
        self.read(|state| {
            let matching = state
                .listings
                .values()
                .rev()
                .filter(|listing| filter.matches(listing))
                .cloned();
            Page::paginate(matching, request)
        })
    }

    fn listings_by_owner(&self, owner: UserId) -> Result<Vec<Listing>, RepositoryError> {
        self.read(|state| {
            state
                .listings
                .values()
                .rev()
                .filter(|listing| listing.owner == owner)
                .cloned()
                .collect()
        })
    }

    fn images(&self, listing: ListingId) -> Result<Vec<ListingImage>, RepositoryError> {
        self.read(|state| state.gallery(listing).into_images())
    }

    fn fetch_image(&self, id: ImageId) -> Result<Option<ListingImage>, RepositoryError> {
        self.read(|state| state.images.get(&id.0).cloned())
    }

    fn with_gallery<T, E, F>(&self, listing: ListingId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut ImageGallery) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.transact(|state| {
            if !state.listings.contains_key(&listing.0) {
                return Err(E::from(RepositoryError::NotFound));
            }
            let mut gallery = state.gallery(listing);
            let outcome = change(&mut gallery)?;
            state.replace_gallery(gallery);
            Ok(outcome)
        })
    }
}

impl UserRepository for MarketStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.transact(|state| {
            if state.users.values().any(|existing| existing.email == user.email) {
                return Err(RepositoryError::Conflict);
            }
            let id = UserId(state.next_user_id);
            state.next_user_id += 1;
            let stored = User {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            };
            state.users.insert(id.0, stored.clone());
            Ok(stored)
        })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.read(|state| state.users.values().find(|user| user.email == email).cloned())
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.read(|state| state.users.get(&id.0).cloned())
    }

    fn remove_user(&self, id: UserId) -> Result<(), RepositoryError> {
        self.transact(|state| {
            if state.listings.values().any(|listing| listing.owner == id) {
                return Err(RepositoryError::Conflict);
            }
            state
                .users
                .remove(&id.0)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        })
    }
}
