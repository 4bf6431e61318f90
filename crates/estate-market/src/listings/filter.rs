//! Search criteria and pagination for the public listing pages.
//!
//! Every criterion is optional and criteria combine with AND. Parameters that fail to parse
//! are dropped, so a malformed price bound behaves exactly like an omitted one.

use serde::{Deserialize, Serialize};

use super::domain::{Category, Listing};

/// Listings shown per result page.
pub const PAGE_SIZE: usize = 12;

/// Query string accepted by the search pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    pub district: Option<String>,
    pub wijk: Option<String>,
    pub status: Option<String>,
    pub type_object: Option<String>,
    pub valuta: Option<String>,
    pub min_prijs: Option<String>,
    pub max_prijs: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

/// Normalized criteria; `None` means "match all" for that criterion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Category fixed by the page; checked alongside any requested category.
    pub scope: Option<Category>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub text: Option<String>,
    pub district: Option<String>,
    /// Matched as a suffix of the stored location. Without a district criterion this can
    /// also hit a district whose own name ends with the same text.
    pub sub_district: Option<String>,
}

impl ListingFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            scope: None,
            category: non_empty(&params.type_object).map(str::to_lowercase),
            status: non_empty(&params.status).map(str::to_lowercase),
            currency: non_empty(&params.valuta).map(str::to_uppercase),
            min_price: non_empty(&params.min_prijs).and_then(parse_bound),
            max_price: non_empty(&params.max_prijs).and_then(parse_bound),
            text: non_empty(&params.q).map(str::to_lowercase),
            district: non_empty(&params.district).map(str::to_lowercase),
            sub_district: non_empty(&params.wijk).map(str::to_lowercase),
        }
    }

    /// Restrict to `category`, as the house and plot pages do.
    pub fn within(mut self, category: Category) -> Self {
        self.scope = Some(category);
        self
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(scope) = &self.scope {
            if listing.category != *scope {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if listing.category.as_str() != category {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if listing.status.label() != status {
                return false;
            }
        }
        if let Some(currency) = &self.currency {
            if listing.currency.as_str() != currency {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let in_title = listing.title.to_lowercase().contains(text.as_str());
            let in_description = listing.description.to_lowercase().contains(text.as_str());
            if !in_title && !in_description {
                return false;
            }
        }

        let location = listing.location.stored();
        if let Some(district) = &self.district {
            if !location.starts_with(district.as_str()) {
                return false;
            }
        }
        if let Some(sub_district) = &self.sub_district {
            if !location.ends_with(sub_district.as_str()) {
                return false;
            }
        }
        true
    }
}

/// One-based page number; anything unparsable or below one reads as the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: PAGE_SIZE,
        }
    }

    pub fn from_params(params: &SearchParams) -> Self {
        let page = non_empty(&params.page)
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(1);
        Self::new(page)
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A slice of an ordered result set plus the totals the pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Cut the requested page out of an already ordered sequence. Out-of-range pages are empty.
    pub fn paginate<I>(ordered: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let all: Vec<T> = ordered.into_iter().collect();
        let total = all.len();
        let pages = total.div_ceil(request.per_page);
        let items: Vec<T> = all
            .into_iter()
            .skip(request.offset())
            .take(request.per_page)
            .collect();

        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            pages,
            has_prev: request.page > 1,
            has_next: request.page < pages,
        }
    }

    /// Convert every item, stopping at the first failure.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| !value.is_nan())
}
