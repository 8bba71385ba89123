//! Storage gateway the bot depends on.

use std::future::Future;

use sqlx::SqlitePool;

use garage_core::{Car, NewPart, PartListing, PartRecord};
use garage_db::DbError;

/// Car and part records as the bot sees them. Each call is a single atomic
/// statement; nothing spans more than one call.
pub trait PartStore: Send + Sync {
    fn list_cars(&self) -> impl Future<Output = Result<Vec<Car>, DbError>> + Send;

    fn add_car(&self, name: &str) -> impl Future<Output = Result<Car, DbError>> + Send;

    fn search_parts(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PartListing>, DbError>> + Send;

    fn list_parts(&self) -> impl Future<Output = Result<Vec<PartListing>, DbError>> + Send;

    fn add_part(&self, part: &NewPart) -> impl Future<Output = Result<PartRecord, DbError>> + Send;
}

impl PartStore for SqlitePool {
    async fn list_cars(&self) -> Result<Vec<Car>, DbError> {
        let rows = garage_db::list_cars(self).await?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn add_car(&self, name: &str) -> Result<Car, DbError> {
        let row = garage_db::insert_car(self, name).await?;
        tracing::info!(car_id = row.id, name, "car added");
        Ok(Car::from(row))
    }

    async fn search_parts(&self, query: &str) -> Result<Vec<PartListing>, DbError> {
        let rows = garage_db::search_part_listings(self, query).await?;
        Ok(rows.into_iter().map(PartListing::from).collect())
    }

    async fn list_parts(&self) -> Result<Vec<PartListing>, DbError> {
        let rows = garage_db::list_part_listings(self).await?;
        Ok(rows.into_iter().map(PartListing::from).collect())
    }

    async fn add_part(&self, part: &NewPart) -> Result<PartRecord, DbError> {
        let row = garage_db::insert_part(self, part).await?;
        tracing::info!(
            part_id = row.id,
            part_number = %row.part_number,
            car_id = ?row.car_id,
            "part added"
        );
        Ok(PartRecord::from(row))
    }
}
