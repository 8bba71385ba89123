//! Database operations for the `cars` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use garage_core::Car;

use crate::DbError;

/// A row from the `cars` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CarRow> for Car {
    fn from(row: CarRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Returns every car in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cars(pool: &SqlitePool) -> Result<Vec<CarRow>, DbError> {
    let rows = sqlx::query_as::<_, CarRow>("SELECT id, name, created_at FROM cars ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Inserts a car and returns the stored row.
///
/// The name is stored as given; callers validate it first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_car(pool: &SqlitePool, name: &str) -> Result<CarRow, DbError> {
    let row = sqlx::query_as::<_, CarRow>(
        "INSERT INTO cars (name, created_at) \
         VALUES (?1, ?2) \
         RETURNING id, name, created_at",
    )
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}
