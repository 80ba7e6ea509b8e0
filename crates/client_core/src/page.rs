use std::{fmt, str::FromStr};

use shared::domain::Listing;

use crate::store::StoreKey;

pub const LISTINGS: StoreKey<Vec<Listing>> = StoreKey::new("listings");
pub const SEARCHED_HOMES: StoreKey<Vec<Listing>> = StoreKey::new("searchedHomes");
pub const NEW_HOMES: StoreKey<Vec<Listing>> = StoreKey::new("newHomes");

pub const ALL_LISTINGS_REGION: &str = "all-listings-info";
pub const SEARCH_RESULTS_REGION: &str = "result-info";
pub const NEW_LISTINGS_REGION: &str = "new-listings-info";

/// Which catalog page a controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageVariant {
    /// Buyer-facing page: open listings only, empty search is a soft notice.
    #[default]
    Home,
    /// Agent page: every listing, created listings are tracked separately.
    Agent,
    /// Older buyer page where an empty search is reported as an error.
    Classic,
}

impl PageVariant {
    pub fn lists_open_only(self) -> bool {
        !matches!(self, PageVariant::Agent)
    }

    pub fn tracks_new_homes(self) -> bool {
        matches!(self, PageVariant::Agent)
    }

    pub fn soft_no_match(self) -> bool {
        !matches!(self, PageVariant::Classic)
    }

    /// Table regions this page draws, paired with the store key each shows.
    pub fn regions(self) -> Vec<(&'static str, StoreKey<Vec<Listing>>)> {
        let mut regions = vec![
            (SEARCH_RESULTS_REGION, SEARCHED_HOMES),
            (ALL_LISTINGS_REGION, LISTINGS),
        ];
        if self.tracks_new_homes() {
            regions.push((NEW_LISTINGS_REGION, NEW_HOMES));
        }
        regions
    }
}

impl fmt::Display for PageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PageVariant::Home => "home",
            PageVariant::Agent => "agent",
            PageVariant::Classic => "classic",
        })
    }
}

impl FromStr for PageVariant {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(PageVariant::Home),
            "agent" => Ok(PageVariant::Agent),
            "classic" => Ok(PageVariant::Classic),
            other => Err(format!(
                "unknown page '{other}' (expected home, agent or classic)"
            )),
        }
    }
}

/// What update-price/update-status do when the cached listings lack the
/// target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingRecordPolicy {
    /// Send the patch with every other field blank.
    BlankFallback,
    /// Fail the update without calling the API.
    Reject,
    /// Fetch the full record before patching it.
    #[default]
    FetchFromServer,
}

impl FromStr for MissingRecordPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "blank-fallback" | "blank" => Ok(MissingRecordPolicy::BlankFallback),
            "reject" => Ok(MissingRecordPolicy::Reject),
            "fetch-from-server" | "fetch" => Ok(MissingRecordPolicy::FetchFromServer),
            other => Err(format!("unknown missing record policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageConfig {
    pub variant: PageVariant,
    pub missing_record_policy: MissingRecordPolicy,
}

impl PageConfig {
    pub fn new(variant: PageVariant) -> Self {
        Self {
            variant,
            missing_record_policy: MissingRecordPolicy::default(),
        }
    }

    pub fn with_missing_record_policy(mut self, policy: MissingRecordPolicy) -> Self {
        self.missing_record_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_in_listing_scope_and_no_match_handling() {
        assert!(PageVariant::Home.lists_open_only());
        assert!(!PageVariant::Agent.lists_open_only());
        assert!(PageVariant::Agent.soft_no_match());
        assert!(!PageVariant::Classic.soft_no_match());
        assert_eq!(PageVariant::Home.regions().len(), 2);
        assert_eq!(PageVariant::Agent.regions().len(), 3);
    }

    #[test]
    fn parses_config_values() {
        assert_eq!("Agent".parse::<PageVariant>(), Ok(PageVariant::Agent));
        assert!("admin".parse::<PageVariant>().is_err());
        assert_eq!(
            "blank_fallback".parse::<MissingRecordPolicy>(),
            Ok(MissingRecordPolicy::BlankFallback)
        );
        assert_eq!(
            MissingRecordPolicy::default(),
            MissingRecordPolicy::FetchFromServer
        );
    }
}
