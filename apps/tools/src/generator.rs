use rand::{seq::SliceRandom, Rng};
use shared::domain::{Listing, ListingNumber, ListingStatus};
use uuid::Uuid;

const STREET_NAMES: &[&str] = &[
    "Main", "1st", "2nd", "3rd", "4th", "5th", "6th", "Park", "Oak", "Maple", "Washington",
    "Cedar", "Walnut", "Sunset", "Church", "Lincoln", "Adams", "Cherry", "Marshall", "Airy",
    "Hill", "Forest", "Spruce", "Lafayette", "Ridge", "Markley", "Johnson", "Wilson",
    "Germantown", "Broad", "Jefferson", "Whitehall", "West", "East", "Burnside", "Sharon",
];

const STREET_TYPES: &[&str] = &[
    "Street",
    "Avenue",
    "Boulevard",
    "Circle",
    "Lane",
    "Drive",
    "Way",
];

const CITIES: &[(&str, &str)] = &[
    ("Portland", "Oregon"),
    ("Seattle", "Washington"),
    ("Austin", "Texas"),
    ("Denver", "Colorado"),
    ("Columbus", "Ohio"),
    ("Raleigh", "North Carolina"),
    ("Madison", "Wisconsin"),
    ("Boise", "Idaho"),
    ("Tucson", "Arizona"),
    ("Richmond", "Virginia"),
];

const BATHROOMS: &[f64] = &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5];

const LOT_SIZES: &[f64] = &[
    0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0,
];

pub const MAX_PRICE: i64 = 1_500_000;

/// Random but plausible listing, keyed by a fresh UUID.
pub fn random_listing<R: Rng + ?Sized>(rng: &mut R) -> Listing {
    let street = STREET_NAMES.choose(rng).copied().unwrap_or("Main");
    let street_type = STREET_TYPES.choose(rng).copied().unwrap_or("Street");
    let (city, state) = CITIES.choose(rng).copied().unwrap_or(("Portland", "Oregon"));
    let address = format!(
        "{} {street} {street_type}, {city}, {state}, {:05}",
        rng.gen_range(0..10_000),
        rng.gen_range(0..100_000)
    );

    Listing {
        listing_number: ListingNumber::new(Uuid::new_v4().to_string()),
        address,
        square_footage: rng.gen_range(500..10_000),
        price: rng.gen_range(0..MAX_PRICE),
        num_bedrooms: rng.gen_range(1..=7),
        num_bathrooms: BATHROOMS.choose(rng).copied().unwrap_or(1.0),
        listing_status: ListingStatus::ALL
            .choose(rng)
            .copied()
            .unwrap_or(ListingStatus::ForSale),
        lot_size: LOT_SIZES.choose(rng).copied().unwrap_or(0.1),
    }
}
