use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::apartment::Apartment;

/// Upper bound on `pageSize`; anything larger is rejected at the boundary.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApartmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "Address must be 1-200 characters"))]
    pub address: String,

    #[validate(length(min = 1, max = 100, message = "City must be 1-100 characters"))]
    pub city: String,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price_per_night: f64,

    #[validate(range(min = 1, max = 50, message = "Beds must be between 1 and 50"))]
    pub number_of_beds: i32,

    #[validate(range(min = 1, max = 20, message = "Rooms must be between 1 and 20"))]
    pub number_of_rooms: i32,

    pub image_url: Option<String>,
    pub contact_phone: Option<String>,
}

/// Patch semantics: a missing field means "leave unchanged". Paid status is
/// deliberately not part of this shape; it only moves through the payment flow.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApartmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Address must be 1-200 characters"))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City must be 1-100 characters"))]
    pub city: Option<String>,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price_per_night: Option<f64>,

    #[validate(range(min = 1, max = 50, message = "Beds must be between 1 and 50"))]
    pub number_of_beds: Option<i32>,

    #[validate(range(min = 1, max = 20, message = "Rooms must be between 1 and 20"))]
    pub number_of_rooms: Option<i32>,

    pub image_url: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateApartmentRequest {
    /// Builds the `$set` document for a single atomic update. Only supplied
    /// fields are written; `updated_at` is always refreshed.
    pub fn to_set_doc(&self, now: DateTime<Utc>) -> Document {
        let mut set = doc! { "updated_at": Bson::DateTime(now.into()) };
        if let Some(title) = &self.title {
            set.insert("title", title);
        }
        if let Some(description) = &self.description {
            set.insert("description", description);
        }
        if let Some(address) = &self.address {
            set.insert("address", address);
        }
        if let Some(city) = &self.city {
            set.insert("city", city);
        }
        if let Some(price) = self.price_per_night {
            set.insert("price_per_night", price);
        }
        if let Some(beds) = self.number_of_beds {
            set.insert("number_of_beds", beds);
        }
        if let Some(rooms) = self.number_of_rooms {
            set.insert("number_of_rooms", rooms);
        }
        if let Some(image_url) = &self.image_url {
            set.insert("image_url", image_url);
        }
        if let Some(phone) = &self.contact_phone {
            set.insert("contact_phone", phone);
        }
        if let Some(is_active) = self.is_active {
            set.insert("is_active", is_active);
        }
        set
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentSearchQuery {
    pub query: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_beds: Option<i32>,
    pub max_beds: Option<i32>,
    pub min_rooms: Option<i32>,
    pub max_rooms: Option<i32>,

    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

impl ApartmentSearchQuery {
    /// Builds the MongoDB filter: public visibility flags plus one AND-term
    /// per supplied predicate. The free-text term is itself an OR across
    /// title, address and city.
    pub fn to_filter(&self) -> Document {
        let mut filter = doc! { "is_active": true, "is_paid": true };

        if let Some(q) = trimmed(&self.query) {
            let pattern = escape_regex(q);
            filter.insert(
                "$or",
                vec![
                    doc! { "title": ci_regex(pattern.clone()) },
                    doc! { "address": ci_regex(pattern.clone()) },
                    doc! { "city": ci_regex(pattern) },
                ],
            );
        }

        if let Some(city) = trimmed(&self.city) {
            filter.insert("city", ci_regex(format!("^{}$", escape_regex(city))));
        }

        if let Some(range) = range_doc(self.min_price, self.max_price) {
            filter.insert("price_per_night", range);
        }
        if let Some(range) = range_doc(self.min_beds, self.max_beds) {
            filter.insert("number_of_beds", range);
        }
        if let Some(range) = range_doc(self.min_rooms, self.max_rooms) {
            filter.insert("number_of_rooms", range);
        }

        filter
    }

    /// Rejects non-positive or oversized paging values before any query runs.
    pub fn ensure_valid_paging(&self) -> Result<()> {
        if self.page == 0 || self.page_size == 0 {
            return Err(AppError::validation("page and pageSize must be positive"));
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "pageSize must be at most {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Saturating on purpose: a page far beyond the result set must come back
    /// as an empty list, never as an arithmetic fault.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn ci_regex(pattern: String) -> Bson {
    Bson::RegularExpression(mongodb::bson::Regex {
        pattern,
        options: "i".to_string(),
    })
}

fn range_doc<T: Into<Bson> + Copy>(min: Option<T>, max: Option<T>) -> Option<Document> {
    let mut range = Document::new();
    if let Some(min) = min {
        range.insert("$gte", min.into());
    }
    if let Some(max) = max {
        range.insert("$lte", max.into());
    }
    if range.is_empty() {
        None
    } else {
        Some(range)
    }
}

fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub price_per_night: f64,
    pub number_of_beds: i32,
    pub number_of_rooms: i32,
    pub image_url: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub owner_name: String,
}

impl ApartmentResponse {
    pub fn from_apartment(apartment: Apartment, owner_name: String) -> Self {
        ApartmentResponse {
            id: apartment._id.map(|id| id.to_hex()).unwrap_or_default(),
            title: apartment.title,
            description: apartment.description,
            address: apartment.address,
            city: apartment.city,
            price_per_night: apartment.price_per_night,
            number_of_beds: apartment.number_of_beds,
            number_of_rooms: apartment.number_of_rooms,
            image_url: apartment.image_url,
            contact_phone: apartment.contact_phone,
            is_active: apartment.is_active,
            is_paid: apartment.is_paid,
            created_at: apartment.created_at,
            user_id: apartment.user_id.to_hex(),
            owner_name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: u64, page_size: u64) -> Self {
        PagedResult {
            items,
            total_count,
            page,
            page_size,
            total_pages: total_count.div_ceil(page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_from(value: serde_json::Value) -> ApartmentSearchQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn search_defaults_to_first_page_of_ten() {
        let q = query_from(json!({}));
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);
        assert_eq!(q.skip(), 0);
    }

    #[test]
    fn empty_search_only_filters_on_visibility_flags() {
        let filter = query_from(json!({})).to_filter();
        assert!(filter.get_bool("is_active").unwrap());
        assert!(filter.get_bool("is_paid").unwrap());
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn free_text_builds_case_insensitive_or_over_three_fields() {
        let filter = query_from(json!({ "query": "Tel Aviv" })).to_filter();
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 3);

        let title_term = or[0].as_document().unwrap();
        match title_term.get("title").unwrap() {
            Bson::RegularExpression(re) => {
                assert_eq!(re.pattern, "Tel Aviv");
                assert_eq!(re.options, "i");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn free_text_escapes_regex_metacharacters() {
        let filter = query_from(json!({ "query": "what? (exactly)" })).to_filter();
        let or = filter.get_array("$or").unwrap();
        match or[0].as_document().unwrap().get("title").unwrap() {
            Bson::RegularExpression(re) => assert_eq!(re.pattern, r"what\? \(exactly\)"),
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn city_filter_is_anchored_equality() {
        let filter = query_from(json!({ "city": "Haifa" })).to_filter();
        match filter.get("city").unwrap() {
            Bson::RegularExpression(re) => {
                assert_eq!(re.pattern, "^Haifa$");
                assert_eq!(re.options, "i");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn blank_query_and_city_are_ignored() {
        let filter = query_from(json!({ "query": "   ", "city": "" })).to_filter();
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn numeric_bounds_are_inclusive_and_independent() {
        let filter =
            query_from(json!({ "minPrice": 100.0, "maxPrice": 250.0, "minBeds": 2 })).to_filter();

        let price = filter.get_document("price_per_night").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 100.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 250.0);

        let beds = filter.get_document("number_of_beds").unwrap();
        assert_eq!(beds.get_i32("$gte").unwrap(), 2);
        assert!(beds.get("$lte").is_none());

        assert!(filter.get("number_of_rooms").is_none());
    }

    #[test]
    fn pagination_skip_is_zero_based() {
        let q = query_from(json!({ "page": 3, "pageSize": 20 }));
        assert_eq!(q.skip(), 40);
    }

    #[test]
    fn skip_saturates_for_absurd_page_numbers() {
        let q = query_from(json!({ "page": u64::MAX, "pageSize": 10 }));
        assert_eq!(q.skip(), u64::MAX);

        let q = query_from(json!({ "page": u64::MAX, "pageSize": u64::MAX }));
        assert_eq!(q.skip(), u64::MAX);
    }

    #[test]
    fn paging_bounds_are_enforced_at_the_boundary() {
        assert!(query_from(json!({ "page": 0 })).ensure_valid_paging().is_err());
        assert!(query_from(json!({ "pageSize": 0 })).ensure_valid_paging().is_err());
        assert!(query_from(json!({ "pageSize": MAX_PAGE_SIZE + 1 }))
            .ensure_valid_paging()
            .is_err());
        assert!(query_from(json!({ "page": 5, "pageSize": MAX_PAGE_SIZE }))
            .ensure_valid_paging()
            .is_ok());
        assert!(query_from(json!({})).ensure_valid_paging().is_ok());
    }

    #[test]
    fn total_pages_is_ceiling_of_count_over_page_size() {
        assert_eq!(PagedResult::<()>::new(vec![], 0, 1, 10).total_pages, 0);
        assert_eq!(PagedResult::<()>::new(vec![], 10, 1, 10).total_pages, 1);
        assert_eq!(PagedResult::<()>::new(vec![], 11, 1, 10).total_pages, 2);
        assert_eq!(PagedResult::<()>::new(vec![], 1, 1, 10).total_pages, 1);
    }

    #[test]
    fn update_set_doc_only_contains_supplied_fields() {
        let patch: UpdateApartmentRequest = serde_json::from_value(json!({
            "title": "New title",
            "isActive": false
        }))
        .unwrap();

        let set = patch.to_set_doc(Utc::now());
        assert_eq!(set.get_str("title").unwrap(), "New title");
        assert!(!set.get_bool("is_active").unwrap());
        assert!(set.get("description").is_none());
        assert!(set.get("price_per_night").is_none());
        assert!(set.get("updated_at").is_some());
        // Paid status can never be patched through an update.
        assert!(set.get("is_paid").is_none());
    }

    #[test]
    fn create_request_enforces_field_bounds() {
        let valid: CreateApartmentRequest = serde_json::from_value(json!({
            "title": "Sea view studio",
            "description": "Quiet, near the beach",
            "address": "12 Allenby St",
            "city": "Tel Aviv",
            "pricePerNight": 150.0,
            "numberOfBeds": 2,
            "numberOfRooms": 1
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let bad_beds: CreateApartmentRequest = serde_json::from_value(json!({
            "title": "t",
            "description": "d",
            "address": "a",
            "city": "c",
            "pricePerNight": 10.0,
            "numberOfBeds": 51,
            "numberOfRooms": 1
        }))
        .unwrap();
        assert!(bad_beds.validate().is_err());

        let negative_price: CreateApartmentRequest = serde_json::from_value(json!({
            "title": "t",
            "description": "d",
            "address": "a",
            "city": "c",
            "pricePerNight": -1.0,
            "numberOfBeds": 1,
            "numberOfRooms": 1
        }))
        .unwrap();
        assert!(negative_price.validate().is_err());
    }
}
