use serde::Serialize;

use super::domain::{Category, ImageId, Listing, ListingId, ListingImage, ListingStatus, Surface};
use super::filter::Page;
use super::format::format_currency;

/// Compact projection used on search pages and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingCard {
    pub id: ListingId,
    pub title: String,
    pub category: Category,
    pub status: ListingStatus,
    /// Sold or rented; shown as a badge on the card.
    pub resolved: bool,
    pub price: f64,
    pub currency: String,
    pub price_label: String,
    pub location: String,
    pub primary_image: Option<String>,
}

impl ListingCard {
    pub fn new(listing: &Listing, primary_image: Option<&ListingImage>) -> Self {
        Self {
            id: listing.id,
            title: listing.title.clone(),
            category: listing.category,
            status: listing.status.clone(),
            resolved: listing.status.is_resolved(),
            price: listing.price,
            currency: listing.currency.as_str().to_string(),
            price_label: format_currency(listing.price, &listing.currency),
            location: listing.location.stored(),
            primary_image: primary_image.map(|image| image.path.clone()),
        }
    }
}

/// Capitalized district/sub-district pair for the detail page trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub district: String,
    pub sub_district: Option<String>,
}

impl Breadcrumb {
    fn for_listing(listing: &Listing) -> Self {
        Self {
            district: capitalize(listing.location.district()),
            sub_district: listing.location.sub_district().map(capitalize),
        }
    }
}

/// Full listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingDetail {
    pub id: ListingId,
    pub title: String,
    pub category: Category,
    pub status: ListingStatus,
    pub price: f64,
    pub currency: String,
    pub price_label: String,
    pub ownership_type: Option<String>,
    pub land_area: Surface,
    pub living_area: Surface,
    pub location: String,
    pub description: String,
    pub breadcrumb: Breadcrumb,
    pub images: Vec<ListingImage>,
    pub primary_image: Option<ListingImage>,
    pub is_owner: bool,
}

impl ListingDetail {
    /// `images` must already be in display order.
    pub fn new(listing: Listing, images: Vec<ListingImage>, is_owner: bool) -> Self {
        let primary_image = images
            .iter()
            .find(|image| image.is_primary)
            .or_else(|| images.first())
            .cloned();

        Self {
            id: listing.id,
            price_label: format_currency(listing.price, &listing.currency),
            currency: listing.currency.as_str().to_string(),
            breadcrumb: Breadcrumb::for_listing(&listing),
            location: listing.location.stored(),
            title: listing.title,
            category: listing.category,
            status: listing.status,
            price: listing.price,
            ownership_type: listing.ownership_type,
            land_area: listing.land_area,
            living_area: listing.living_area,
            description: listing.description,
            images,
            primary_image,
            is_owner,
        }
    }
}

/// Search page payload: the result page and, when a district is selected, its sub-districts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub results: Page<ListingCard>,
    pub sub_districts: Vec<&'static str>,
}

/// Result of deleting one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRemoval {
    pub removed: ImageId,
    pub new_primary_id: Option<ImageId>,
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
