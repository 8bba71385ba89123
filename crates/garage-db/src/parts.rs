//! Database operations for the `parts` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use garage_core::{NewPart, PartListing, PartRecord};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `parts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartRow {
    pub id: i64,
    pub part_number: String,
    pub manufacturer: String,
    pub name: String,
    pub link: String,
    /// `NULL` when the part is not attached to a car.
    pub car_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<PartRow> for PartRecord {
    fn from(row: PartRow) -> Self {
        Self {
            id: row.id,
            part_number: row.part_number,
            manufacturer: row.manufacturer,
            name: row.name,
            link: row.link,
            car_id: row.car_id,
        }
    }
}

/// A part joined with the name of its car.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartListingRow {
    pub part_number: String,
    pub manufacturer: String,
    pub name: String,
    pub link: String,
    pub car_name: Option<String>,
}

impl From<PartListingRow> for PartListing {
    fn from(row: PartListingRow) -> Self {
        Self {
            part_number: row.part_number,
            manufacturer: row.manufacturer,
            name: row.name,
            link: row.link,
            car_name: row.car_name,
        }
    }
}

const LISTING_SELECT: &str = "SELECT p.part_number, p.manufacturer, p.name, p.link, \
                                     c.name AS car_name \
                              FROM parts p \
                              LEFT JOIN cars c ON c.id = p.car_id";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a part and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when `car_id`
/// names a car that does not exist.
pub async fn insert_part(pool: &SqlitePool, part: &NewPart) -> Result<PartRow, DbError> {
    let row = sqlx::query_as::<_, PartRow>(
        "INSERT INTO parts (part_number, manufacturer, name, name_folded, link, car_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         RETURNING id, part_number, manufacturer, name, link, car_id, created_at",
    )
    .bind(&part.part_number)
    .bind(&part.manufacturer)
    .bind(&part.name)
    .bind(part.name.to_lowercase())
    .bind(&part.link)
    .bind(part.car_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns every part with its car name, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_part_listings(pool: &SqlitePool) -> Result<Vec<PartListingRow>, DbError> {
    let sql = format!("{LISTING_SELECT} ORDER BY p.id");
    let rows = sqlx::query_as::<_, PartListingRow>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns parts whose name contains `query`, ignoring case.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_part_listings(
    pool: &SqlitePool,
    query: &str,
) -> Result<Vec<PartListingRow>, DbError> {
    let sql = format!("{LISTING_SELECT} WHERE instr(p.name_folded, ?1) > 0 ORDER BY p.id");
    let rows = sqlx::query_as::<_, PartListingRow>(&sql)
        .bind(query.to_lowercase())
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
