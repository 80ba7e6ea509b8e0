use anyhow::{anyhow, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Listing, ListingNumber, ListingStatus};

const LISTING_COLUMNS: &str = "listing_number, address, square_footage, price, num_bedrooms, \
                               num_bathrooms, listing_status, lot_size";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Search bounds. `None` leaves a column unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub min_square_footage: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i64>,
    pub min_bathrooms: Option<f64>,
    pub min_lot_size: Option<f64>,
    pub status: Option<ListingStatus>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to an in-memory url opens its own empty database
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts the listing or replaces every column of an existing row.
    pub async fn save_listing(&self, listing: &Listing) -> Result<()> {
        sqlx::query(
            "INSERT INTO listings (listing_number, address, square_footage, price, num_bedrooms,
                                   num_bathrooms, listing_status, lot_size)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(listing_number) DO UPDATE SET
                address = excluded.address,
                square_footage = excluded.square_footage,
                price = excluded.price,
                num_bedrooms = excluded.num_bedrooms,
                num_bathrooms = excluded.num_bathrooms,
                listing_status = excluded.listing_status,
                lot_size = excluded.lot_size",
        )
        .bind(listing.listing_number.as_str())
        .bind(&listing.address)
        .bind(listing.square_footage)
        .bind(listing.price)
        .bind(listing.num_bedrooms)
        .bind(listing.num_bathrooms)
        .bind(listing.listing_status.label())
        .bind(listing.lot_size)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save listing {}", listing.listing_number))?;
        Ok(())
    }

    pub async fn get_listing(&self, listing_number: &ListingNumber) -> Result<Option<Listing>> {
        let row = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE listing_number = ?"
        ))
        .bind(listing_number.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(listing_from_row).transpose()
    }

    pub async fn listing_exists(&self, listing_number: &ListingNumber) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM listings WHERE listing_number = ?")
                .bind(listing_number.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn list_listings(&self) -> Result<Vec<Listing>> {
        self.search_listings(&ListingFilter::default()).await
    }

    pub async fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE 1 = 1"
        ));
        if let Some(v) = filter.min_square_footage {
            query.push(" AND square_footage >= ").push_bind(v);
        }
        if let Some(v) = filter.max_price {
            query.push(" AND price < ").push_bind(v);
        }
        if let Some(v) = filter.min_bedrooms {
            query.push(" AND num_bedrooms >= ").push_bind(v);
        }
        if let Some(v) = filter.min_bathrooms {
            query.push(" AND num_bathrooms >= ").push_bind(v);
        }
        if let Some(v) = filter.min_lot_size {
            query.push(" AND lot_size >= ").push_bind(v);
        }
        if let Some(status) = filter.status {
            query.push(" AND listing_status = ").push_bind(status.label());
        }
        query.push(" ORDER BY rowid ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(listing_from_row).collect()
    }

    /// Returns whether a row was removed.
    pub async fn delete_listing(&self, listing_number: &ListingNumber) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE listing_number = ?")
            .bind(listing_number.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn listing_from_row(row: &SqliteRow) -> Result<Listing> {
    let raw_status: String = row.try_get("listing_status")?;
    let listing_status = raw_status
        .parse::<ListingStatus>()
        .map_err(|e| anyhow!("stored listing has {e}"))?;
    Ok(Listing {
        listing_number: ListingNumber(row.try_get("listing_number")?),
        address: row.try_get("address")?,
        square_footage: row.try_get("square_footage")?,
        price: row.try_get("price")?,
        num_bedrooms: row.try_get("num_bedrooms")?,
        num_bathrooms: row.try_get("num_bathrooms")?,
        listing_status,
        lot_size: row.try_get("lot_size")?,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
