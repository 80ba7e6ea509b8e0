//! Listing tables drawn into named page regions.

use std::{
    collections::HashMap,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use maud::{html, Markup};
use shared::domain::Listing;
use thiserror::Error;
use tracing::debug;

use crate::store::{ChangeListener, ListenerError, StoreKey, StoreView};

pub const TABLE_HEADERS: [&str; 8] = [
    "Listing Number",
    "Address",
    "Square Footage",
    "Price",
    "Number of Bedrooms",
    "Number of Bathrooms",
    "Listing Status",
    "Lot Size",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render region '{0}' does not exist")]
    MissingRegion(String),
}

/// Place renderers write into. Each write replaces the whole region.
pub trait RenderSurface: Send + Sync {
    fn replace(&self, region: &str, content: String) -> Result<(), RenderError>;
}

#[derive(Debug, Default, Clone)]
struct Region {
    content: String,
    renders: u64,
}

/// Surface that keeps region contents in memory. Writing to a region that
/// was never declared fails the same way a missing page element would.
#[derive(Debug, Default)]
pub struct MemorySurface {
    regions: Mutex<HashMap<String, Region>>,
}

impl MemorySurface {
    pub fn with_regions<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let regions = ids
            .into_iter()
            .map(|id| (id.to_string(), Region::default()))
            .collect();
        Self {
            regions: Mutex::new(regions),
        }
    }

    pub fn content(&self, region: &str) -> Option<String> {
        self.lock().get(region).map(|r| r.content.clone())
    }

    /// How many times `region` has been redrawn.
    pub fn render_count(&self, region: &str) -> u64 {
        self.lock().get(region).map(|r| r.renders).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Region>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderSurface for MemorySurface {
    fn replace(&self, region: &str, content: String) -> Result<(), RenderError> {
        let mut regions = self.lock();
        let slot = regions
            .get_mut(region)
            .ok_or_else(|| RenderError::MissingRegion(region.to_string()))?;
        slot.content = content;
        slot.renders += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Html,
    Text,
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(TableFormat::Html),
            "text" | "plain" => Ok(TableFormat::Text),
            other => Err(format!("unknown table format '{other}'")),
        }
    }
}

pub fn render_table(format: TableFormat, body_id: &str, listings: &[Listing]) -> String {
    match format {
        TableFormat::Html => html_table(body_id, listings).into_string(),
        TableFormat::Text => text_table(listings),
    }
}

fn html_table(body_id: &str, listings: &[Listing]) -> Markup {
    html! {
        div class="row" {
            table class="table-bordered" {
                thead {
                    tr {
                        @for header in TABLE_HEADERS {
                            th { (header) }
                        }
                    }
                }
                tbody id=(body_id) {
                    @for listing in listings {
                        tr {
                            @for cell in cells(listing) {
                                td { (cell) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn text_table(listings: &[Listing]) -> String {
    let rows: Vec<[String; 8]> = listings.iter().map(cells).collect();
    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&TABLE_HEADERS);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&cells));
        out.push('\n');
    }
    out
}

fn cells(listing: &Listing) -> [String; 8] {
    [
        listing.listing_number.to_string(),
        listing.address.clone(),
        listing.square_footage.to_string(),
        listing.price.to_string(),
        listing.num_bedrooms.to_string(),
        listing.num_bathrooms.to_string(),
        listing.listing_status.to_string(),
        listing.lot_size.to_string(),
    ]
}

/// Store listener that redraws one listing table on every change.
pub struct ListingTableRenderer {
    region: &'static str,
    key: StoreKey<Vec<Listing>>,
    format: TableFormat,
    surface: Arc<dyn RenderSurface>,
}

impl ListingTableRenderer {
    pub fn new(
        region: &'static str,
        key: StoreKey<Vec<Listing>>,
        format: TableFormat,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            region,
            key,
            format,
            surface,
        }
    }
}

impl ChangeListener for ListingTableRenderer {
    fn on_change(&self, store: &StoreView) -> Result<(), ListenerError> {
        // absent and empty both draw a header-only table
        let listings = store.get(&self.key).unwrap_or_default();
        debug!(region = self.region, rows = listings.len(), "rendering listing table");
        let body_id = format!("{}-rows", self.key.name());
        self.surface
            .replace(self.region, render_table(self.format, &body_id, &listings))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
