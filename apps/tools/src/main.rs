use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use storage::Storage;
use tracing::info;

mod generator;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/listings.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store randomly generated listings.
    Seed {
        #[arg(long, default_value_t = 25)]
        count: usize,
        /// Fixed RNG seed for repeatable data.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print every stored listing.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open database '{}'", cli.database_url))?;

    match cli.command {
        Command::Seed { count, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            for _ in 0..count {
                let listing = generator::random_listing(&mut rng);
                storage.save_listing(&listing).await?;
                println!("created listing_number={}", listing.listing_number);
            }
            info!(count, "seeded listings");
        }
        Command::List => {
            let listings = storage.list_listings().await?;
            for listing in &listings {
                println!(
                    "{}\t{}\t{} sqft\t${}\t{} bd\t{} ba\t{}\t{} ac",
                    listing.listing_number,
                    listing.address,
                    listing.square_footage,
                    listing.price,
                    listing.num_bedrooms,
                    listing.num_bathrooms,
                    listing.listing_status,
                    listing.lot_size
                );
            }
            info!(count = listings.len(), "listed listings");
        }
    }

    Ok(())
}
