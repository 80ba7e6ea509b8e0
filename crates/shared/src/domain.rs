use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ApiException, ErrorCode};

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

key_newtype!(ListingNumber);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListingStatus {
    ForSale,
    Sold,
    UnderContract,
    Withdrawn,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::ForSale,
        ListingStatus::Sold,
        ListingStatus::UnderContract,
        ListingStatus::Withdrawn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::ForSale => "For Sale",
            ListingStatus::Sold => "Sold",
            ListingStatus::UnderContract => "Under Contract",
            ListingStatus::Withdrawn => "Withdrawn",
        }
    }

    /// A listing is "open" while it can still be bought.
    pub fn is_open(self) -> bool {
        self == ListingStatus::ForSale
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListingStatus {
    type Err = ApiException;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
            .ok_or_else(|| {
                ApiException::new(
                    ErrorCode::Validation,
                    format!("invalid listing status '{raw}'"),
                )
            })
    }
}

impl TryFrom<String> for ListingStatus {
    type Error = ApiException;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListingStatus> for String {
    fn from(value: ListingStatus) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub listing_number: ListingNumber,
    pub address: String,
    pub square_footage: i64,
    pub price: i64,
    pub num_bedrooms: i64,
    pub num_bathrooms: f64,
    pub listing_status: ListingStatus,
    pub lot_size: f64,
}
