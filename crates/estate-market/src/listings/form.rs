use serde::{Deserialize, Serialize};

use super::domain::{
    AreaUnit, Category, CurrencyCode, Listing, ListingDraft, ListingStatus, Location, Surface,
};

/// Raw listing form as submitted; every field is optional until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingForm {
    #[serde(rename = "titel")]
    pub title: Option<String>,
    #[serde(rename = "type_object")]
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "prijs")]
    pub price: Option<String>,
    #[serde(rename = "valuta")]
    pub currency: Option<String>,
    #[serde(rename = "grondrecht")]
    pub ownership_type: Option<String>,
    #[serde(rename = "perceel_oppervlakte")]
    pub land_area: Option<String>,
    #[serde(rename = "perceel_eenheid")]
    pub land_unit: Option<String>,
    #[serde(rename = "woon_oppervlakte")]
    pub living_area: Option<String>,
    #[serde(rename = "woon_eenheid")]
    pub living_unit: Option<String>,
    pub district: Option<String>,
    #[serde(rename = "wijk")]
    pub sub_district: Option<String>,
    #[serde(rename = "beschrijving")]
    pub description: Option<String>,
}

/// A single rejected field, reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl ListingForm {
    /// Assign a multipart text field by its wire name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "titel" => &mut self.title,
            "type_object" => &mut self.category,
            "status" => &mut self.status,
            "prijs" => &mut self.price,
            "valuta" => &mut self.currency,
            "grondrecht" => &mut self.ownership_type,
            "perceel_oppervlakte" => &mut self.land_area,
            "perceel_eenheid" => &mut self.land_unit,
            "woon_oppervlakte" => &mut self.living_area,
            "woon_eenheid" => &mut self.living_unit,
            "district" => &mut self.district,
            "wijk" => &mut self.sub_district,
            "beschrijving" => &mut self.description,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Validate a new submission into a typed draft, or every field-level failure at once.
    pub fn validate(&self) -> Result<ListingDraft, Vec<FieldError>> {
        self.validate_with(None)
    }

    /// Validate an edit. Category, status, currency and location fall back to the stored
    /// listing when the form leaves them out; title and price are always required.
    pub fn validate_update(&self, existing: &Listing) -> Result<ListingDraft, Vec<FieldError>> {
        self.validate_with(Some(existing))
    }

    fn validate_with(&self, existing: Option<&Listing>) -> Result<ListingDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = present(&self.title).map(str::to_string);
        if title.is_none() {
            errors.push(FieldError::new("titel", "title is required"));
        }

        let category = match present(&self.category) {
            Some(raw) => {
                let parsed = Category::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("type_object", "unknown property type"));
                }
                parsed
            }
            None => {
                let fallback = existing.map(|listing| listing.category);
                if fallback.is_none() {
                    errors.push(FieldError::new("type_object", "property type is required"));
                }
                fallback
            }
        };

        let status = match present(&self.status) {
            Some(raw) => {
                let parsed = ListingStatus::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("status", "unknown status"));
                }
                parsed
            }
            None => {
                let fallback = existing.map(|listing| listing.status.clone());
                if fallback.is_none() {
                    errors.push(FieldError::new("status", "status is required"));
                }
                fallback
            }
        };

        let price = match present(&self.price) {
            Some(raw) => {
                let parsed = parse_non_negative(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("prijs", "price must be a number of at least 0"));
                }
                parsed
            }
            None => {
                errors.push(FieldError::new("prijs", "price is required"));
                None
            }
        };

        let currency = match present(&self.currency) {
            Some(raw) => {
                let parsed = CurrencyCode::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("valuta", "currency must be a three letter code"));
                }
                parsed
            }
            None => Some(
                existing
                    .map(|listing| listing.currency.clone())
                    .unwrap_or_default(),
            ),
        };

        let location = match present(&self.district) {
            Some(district) => Some(Location::new(district, present(&self.sub_district))),
            None => {
                let fallback = existing.map(|listing| listing.location.clone());
                if fallback.is_none() {
                    errors.push(FieldError::new("district", "district is required"));
                }
                fallback
            }
        };

        let land_unit = parse_unit(&self.land_unit, "perceel_eenheid", &mut errors);
        let living_unit = parse_unit(&self.living_unit, "woon_eenheid", &mut errors);

        match (title, category, status, price, currency, location) {
            (Some(title), Some(category), Some(status), Some(price), Some(currency), Some(location))
                if errors.is_empty() =>
            {
                Ok(ListingDraft {
                    title,
                    category,
                    status,
                    price,
                    currency,
                    ownership_type: present(&self.ownership_type).map(str::to_string),
                    // Malformed surface figures are dropped rather than rejected.
                    land_area: Surface {
                        value: present(&self.land_area).and_then(parse_non_negative),
                        unit: land_unit,
                    },
                    living_area: Surface {
                        value: present(&self.living_area).and_then(parse_non_negative),
                        unit: living_unit,
                    },
                    location,
                    description: present(&self.description).unwrap_or_default().to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_unit(
    raw: &Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<AreaUnit> {
    let raw = present(raw)?;
    let parsed = AreaUnit::parse(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(field, "unit must be m2 or hectare"));
    }
    parsed
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_non_negative(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UserId;
    use crate::listings::domain::ListingId;
    use chrono::Utc;

    fn complete_form() -> ListingForm {
        ListingForm {
            title: Some("  Ruime woning in Blauwgrond ".to_string()),
            category: Some("Huis".to_string()),
            status: Some("TE KOOP".to_string()),
            price: Some("1250000".to_string()),
            currency: Some("usd".to_string()),
            district: Some("Paramaribo".to_string()),
            sub_district: Some("Blauwgrond".to_string()),
            land_area: Some("500".to_string()),
            land_unit: Some("m2".to_string()),
            ..ListingForm::default()
        }
    }

    #[test]
    fn validate_normalizes_complete_form() {
        let draft = complete_form().validate().expect("form is valid");
        assert_eq!(draft.title, "Ruime woning in Blauwgrond");
        assert_eq!(draft.category, Category::House);
        assert_eq!(draft.status, ListingStatus::ForSale);
        assert_eq!(draft.currency.as_str(), "USD");
        assert_eq!(draft.location.stored(), "paramaribo - blauwgrond");
        assert_eq!(draft.land_area.value, Some(500.0));
        assert_eq!(draft.land_area.unit, Some(AreaUnit::SquareMetres));
        assert_eq!(draft.description, "");
    }

    #[test]
    fn validate_collects_every_missing_required_field() {
        let errors = ListingForm::default().validate().expect_err("form is empty");
        let fields: Vec<_> = errors.iter().map(|error| error.field).collect();
        assert_eq!(fields, vec!["titel", "type_object", "status", "prijs", "district"]);
    }

    #[test]
    fn validate_rejects_negative_and_malformed_price() {
        let mut form = complete_form();
        form.price = Some("-1".to_string());
        assert!(form.validate().is_err());
        form.price = Some("veel".to_string());
        let errors = form.validate().expect_err("price invalid");
        assert_eq!(errors[0].field, "prijs");
    }

    #[test]
    fn validate_defaults_currency_and_drops_malformed_area() {
        let mut form = complete_form();
        form.currency = None;
        form.living_area = Some("groot".to_string());
        let draft = form.validate().expect("valid");
        assert_eq!(draft.currency.as_str(), "SRD");
        assert_eq!(draft.living_area.value, None);
    }

    #[test]
    fn validate_rejects_bad_currency_code() {
        let mut form = complete_form();
        form.currency = Some("dollar".to_string());
        let errors = form.validate().expect_err("currency invalid");
        assert_eq!(errors, vec![FieldError::new("valuta", "currency must be a three letter code")]);
    }

    #[test]
    fn validate_update_falls_back_to_stored_values() {
        let stored = Listing::from_draft(
            ListingId(4),
            UserId(1),
            complete_form().validate().expect("valid"),
            Utc::now(),
        );
        let form = ListingForm {
            title: Some("Nieuwe titel".to_string()),
            price: Some("900000".to_string()),
            ..ListingForm::default()
        };

        let draft = form.validate_update(&stored).expect("valid update");
        assert_eq!(draft.title, "Nieuwe titel");
        assert_eq!(draft.category, Category::House);
        assert_eq!(draft.currency.as_str(), "USD");
        assert_eq!(draft.location, stored.location);
    }

    #[test]
    fn set_maps_wire_names() {
        let mut form = ListingForm::default();
        form.set("titel", "Perceel".to_string());
        form.set("wijk", "Lelydorp".to_string());
        form.set("fotos", "ignored".to_string());
        assert_eq!(form.title.as_deref(), Some("Perceel"));
        assert_eq!(form.sub_district.as_deref(), Some("Lelydorp"));
    }
}
