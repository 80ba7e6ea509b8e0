//! Form submissions and the field ids each page form exposes.
//!
//! Field values pass through unvalidated: a missing field reads as an empty
//! string and the API decides what it means.

use std::collections::{BTreeMap, HashMap};

use shared::{
    domain::ListingNumber,
    protocol::{ListingCreateRequest, ListingQuery},
};

pub const CREATE_FORM: &str = "create-form";
pub const SEARCH_FORM: &str = "search-homes-form";
pub const OPEN_LISTINGS_FORM: &str = "get-all-open-listings-form";
pub const ALL_LISTINGS_FORM: &str = "get-all-listings-form";
pub const UPDATE_PRICE_FORM: &str = "update-price-form";
pub const UPDATE_STATUS_FORM: &str = "update-status-form";
pub const DELETE_FORM: &str = "delete-listing-form";

/// Anything that can answer "what is in the input with this id".
pub trait FieldSource {
    fn field(&self, id: &str) -> Option<&str>;

    fn value(&self, id: &str) -> String {
        self.field(id).unwrap_or_default().to_string()
    }
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl FieldSource for BTreeMap<String, String> {
    fn field(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

pub fn read_create_form(fields: &impl FieldSource) -> ListingCreateRequest {
    ListingCreateRequest {
        address: fields.value("address"),
        price: fields.value("price"),
        num_bedrooms: fields.value("bedrooms"),
        num_bathrooms: fields.value("bathrooms"),
        square_footage: fields.value("squareFootage"),
        listing_status: fields.value("listingStatus"),
        lot_size: fields.value("lotSize"),
    }
}

pub fn read_search_form(fields: &impl FieldSource) -> ListingQuery {
    ListingQuery {
        square_footage: fields.value("min-squareFootage"),
        price: fields.value("max-price"),
        num_bedrooms: fields.value("min-bedroom"),
        num_bathrooms: fields.value("min-bathroom"),
        lot_size: fields.value("min-lotSize"),
    }
}

/// Listing number plus the single field an update form changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    pub listing_number: ListingNumber,
    pub value: String,
}

pub fn read_update_price_form(fields: &impl FieldSource) -> FieldPatch {
    FieldPatch {
        listing_number: ListingNumber::new(fields.value("update-price-listingNumber").trim()),
        value: fields.value("update-price"),
    }
}

pub fn read_update_status_form(fields: &impl FieldSource) -> FieldPatch {
    FieldPatch {
        listing_number: ListingNumber::new(fields.value("update-status-listingNumber").trim()),
        value: fields.value("update-status"),
    }
}

pub fn read_delete_form(fields: &impl FieldSource) -> ListingNumber {
    ListingNumber::new(fields.value("delete-listingNumber").trim())
}

/// Controller action a form id is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Search,
    GetListings,
    UpdatePrice,
    UpdateStatus,
    Delete,
}

impl FormAction {
    /// Both listing forms trigger the same list action; which listings come
    /// back depends on the page variant.
    pub fn from_form_id(form_id: &str) -> Option<Self> {
        match form_id {
            CREATE_FORM => Some(Self::Create),
            SEARCH_FORM => Some(Self::Search),
            OPEN_LISTINGS_FORM | ALL_LISTINGS_FORM => Some(Self::GetListings),
            UPDATE_PRICE_FORM => Some(Self::UpdatePrice),
            UPDATE_STATUS_FORM => Some(Self::UpdateStatus),
            DELETE_FORM => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A form submission as delivered by the page.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    pub form_id: String,
    pub fields: HashMap<String, String>,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            fields: HashMap::new(),
            default_prevented: false,
        }
    }

    pub fn with_field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(id.into(), value.into());
        self
    }

    /// Stops the page's own submit handling; the controller takes over.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl FieldSource for SubmitEvent {
    fn field(&self, id: &str) -> Option<&str> {
        self.fields.field(id)
    }
}
