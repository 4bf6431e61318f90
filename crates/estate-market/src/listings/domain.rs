use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;

/// Currency assumed when a listing does not name one.
pub const BASE_CURRENCY: &str = "SRD";

/// Identifier wrapper for listings. Ids are handed out in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for listing photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of property on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "huis")]
    House,
    #[serde(rename = "perceel")]
    Plot,
}

impl Category {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "huis" => Some(Self::House),
            "perceel" => Some(Self::Plot),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "huis",
            Self::Plot => "perceel",
        }
    }
}

/// Market status of a listing.
///
/// `Other` keeps stored values outside the known vocabulary intact; forms never produce it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingStatus {
    ForSale,
    Sold,
    ForRent,
    Rented,
    Other(String),
}

impl ListingStatus {
    /// Parse a submitted status, accepting only the known vocabulary.
    pub fn parse(raw: &str) -> Option<Self> {
        match Self::from(raw.trim().to_lowercase()) {
            Self::Other(_) => None,
            known => Some(known),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::ForSale => "te koop",
            Self::Sold => "verkocht",
            Self::ForRent => "te huur",
            Self::Rented => "verhuurd",
            Self::Other(value) => value,
        }
    }

    /// Paired counterpart: for-sale <-> sold, for-rent <-> rented. Anything else is unchanged.
    pub fn toggled(&self) -> Self {
        match self {
            Self::ForSale => Self::Sold,
            Self::Sold => Self::ForSale,
            Self::ForRent => Self::Rented,
            Self::Rented => Self::ForRent,
            Self::Other(value) => Self::Other(value.clone()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Sold | Self::Rented)
    }
}

impl From<String> for ListingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "te koop" => Self::ForSale,
            "verkocht" => Self::Sold,
            "te huur" => Self::ForRent,
            "verhuurd" => Self::Rented,
            _ => Self::Other(value),
        }
    }
}

impl From<ListingStatus> for String {
    fn from(value: ListingStatus) -> Self {
        match value {
            ListingStatus::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

/// ISO-style three letter currency code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(BASE_CURRENCY.to_string())
    }
}

/// Unit for land and living surface measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    #[serde(rename = "m2")]
    SquareMetres,
    #[serde(rename = "hectare")]
    Hectare,
}

impl AreaUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "m2" | "m²" => Some(Self::SquareMetres),
            "hectare" | "ha" => Some(Self::Hectare),
            _ => None,
        }
    }
}

/// Optional surface measurement; value and unit are captured independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub value: Option<f64>,
    pub unit: Option<AreaUnit>,
}

/// District plus optional sub-district, stored lowercased as `"<district> - <sub-district>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Location {
    district: String,
    sub_district: Option<String>,
}

const LOCATION_SEPARATOR: &str = " - ";

impl Location {
    pub fn new(district: &str, sub_district: Option<&str>) -> Self {
        let sub_district = sub_district
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        Self {
            district: district.trim().to_lowercase(),
            sub_district,
        }
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn sub_district(&self) -> Option<&str> {
        self.sub_district.as_deref()
    }

    /// The persisted string form that district filters match against.
    pub fn stored(&self) -> String {
        match &self.sub_district {
            Some(sub) => format!("{}{}{}", self.district, LOCATION_SEPARATOR, sub),
            None => self.district.clone(),
        }
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        match value.split_once(LOCATION_SEPARATOR) {
            Some((district, sub)) => Self::new(district, Some(sub)),
            None => Self::new(&value, None),
        }
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.stored()
    }
}

/// Fully validated listing attributes, produced by the form validation step.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub category: Category,
    pub status: ListingStatus,
    pub price: f64,
    pub currency: CurrencyCode,
    pub ownership_type: Option<String>,
    pub land_area: Surface,
    pub living_area: Surface,
    pub location: Location,
    pub description: String,
}

/// Persisted property advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: UserId,
    pub title: String,
    pub category: Category,
    pub status: ListingStatus,
    pub price: f64,
    pub currency: CurrencyCode,
    pub ownership_type: Option<String>,
    pub land_area: Surface,
    pub living_area: Surface,
    pub location: Location,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_draft(
        id: ListingId,
        owner: UserId,
        draft: ListingDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            title: draft.title,
            category: draft.category,
            status: draft.status,
            price: draft.price,
            currency: draft.currency,
            ownership_type: draft.ownership_type,
            land_area: draft.land_area,
            living_area: draft.living_area,
            location: draft.location,
            description: draft.description,
            created_at,
        }
    }

    /// Overwrite every editable attribute; identity, owner and creation time are kept.
    pub fn apply(&mut self, draft: ListingDraft) {
        self.title = draft.title;
        self.category = draft.category;
        self.status = draft.status;
        self.price = draft.price;
        self.currency = draft.currency;
        self.ownership_type = draft.ownership_type;
        self.land_area = draft.land_area;
        self.living_area = draft.living_area;
        self.location = draft.location;
        self.description = draft.description;
    }
}

/// Photo attached to a listing; `path` is relative to the static root (e.g. `uploads/<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: ImageId,
    pub listing_id: ListingId,
    pub path: String,
    pub is_primary: bool,
    pub sort_order: i64,
}
