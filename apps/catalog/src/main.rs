use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    forms, ActionOutcome, HttpListingClient, MemorySurface, PageController, PageEvent,
    PageVariant, SubmitEvent, TableFormat,
};
use tracing::{debug, info};

mod config;

use config::load_settings;

/// Runs one catalog page action against the listing API and prints the
/// tables it redraws.
#[derive(Parser, Debug)]
#[command(name = "catalog")]
struct Args {
    /// Flat TOML settings file; defaults to ./catalog.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// home, agent or classic
    #[arg(long)]
    page: Option<PageVariant>,
    #[arg(long, default_value = "text")]
    format: TableFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show open listings (every listing on the agent page).
    List,
    /// Search open listings. Empty or zero filters are ignored.
    Search {
        #[arg(long, default_value = "")]
        min_square_footage: String,
        #[arg(long, default_value = "")]
        max_price: String,
        #[arg(long, default_value = "")]
        min_bedrooms: String,
        #[arg(long, default_value = "")]
        min_bathrooms: String,
        #[arg(long, default_value = "")]
        min_lot_size: String,
    },
    Create {
        #[arg(long)]
        address: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "")]
        bedrooms: String,
        #[arg(long, default_value = "")]
        bathrooms: String,
        #[arg(long, default_value = "")]
        square_footage: String,
        #[arg(long, default_value = "For Sale")]
        status: String,
        #[arg(long, default_value = "")]
        lot_size: String,
    },
    UpdatePrice {
        listing_number: String,
        price: String,
    },
    UpdateStatus {
        listing_number: String,
        status: String,
    },
    Delete {
        listing_number: String,
    },
}

impl Command {
    /// The form submission the page would produce for this command.
    fn into_submit_event(self) -> SubmitEvent {
        match self {
            Command::List => SubmitEvent::new(forms::OPEN_LISTINGS_FORM),
            Command::Search {
                min_square_footage,
                max_price,
                min_bedrooms,
                min_bathrooms,
                min_lot_size,
            } => SubmitEvent::new(forms::SEARCH_FORM)
                .with_field("min-squareFootage", min_square_footage)
                .with_field("max-price", max_price)
                .with_field("min-bedroom", min_bedrooms)
                .with_field("min-bathroom", min_bathrooms)
                .with_field("min-lotSize", min_lot_size),
            Command::Create {
                address,
                price,
                bedrooms,
                bathrooms,
                square_footage,
                status,
                lot_size,
            } => SubmitEvent::new(forms::CREATE_FORM)
                .with_field("address", address)
                .with_field("price", price)
                .with_field("bedrooms", bedrooms)
                .with_field("bathrooms", bathrooms)
                .with_field("squareFootage", square_footage)
                .with_field("listingStatus", status)
                .with_field("lotSize", lot_size),
            Command::UpdatePrice {
                listing_number,
                price,
            } => SubmitEvent::new(forms::UPDATE_PRICE_FORM)
                .with_field("update-price-listingNumber", listing_number)
                .with_field("update-price", price),
            Command::UpdateStatus {
                listing_number,
                status,
            } => SubmitEvent::new(forms::UPDATE_STATUS_FORM)
                .with_field("update-status-listingNumber", listing_number)
                .with_field("update-status", status),
            Command::Delete { listing_number } => SubmitEvent::new(forms::DELETE_FORM)
                .with_field("delete-listingNumber", listing_number),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(page) = args.page {
        settings.page = page;
    }
    debug!(?settings, "catalog settings loaded");

    let api = HttpListingClient::new(&settings.server_url, settings.request_timeout())?;
    let (controller, events) = PageController::new(api, settings.page_config());

    let regions = settings.page.regions();
    let surface = Arc::new(MemorySurface::with_regions(
        regions.iter().map(|(region, _)| *region),
    ));
    controller.mount(surface.clone(), args.format);

    let mut event = args.command.into_submit_event();
    info!(form_id = %event.form_id, server_url = %settings.server_url, "submitting form");
    let outcome = controller.handle_submit(&mut event).await;

    for (region, _) in &regions {
        if surface.render_count(region) == 0 {
            continue;
        }
        if let Some(content) = surface.content(region) {
            println!("[{region}]");
            println!("{content}");
        }
    }

    for page_event in events.try_iter() {
        match page_event {
            PageEvent::Info(message) | PageEvent::NoMatch(message) => println!("{message}"),
            PageEvent::Error(err) => eprintln!("{err}"),
        }
    }

    if let ActionOutcome::Failed(err) = outcome {
        bail!("{} failed: {}", event.form_id, err.message());
    }
    Ok(())
}
