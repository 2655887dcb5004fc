use async_trait::async_trait;
use common::errors::RecordError;
use sqlx::{PgPool, Postgres, Transaction};

use super::repository::{RequestRow, ResponseRow, UnitOfWork, UnitOfWorkFactory, WeatherRepository};

pub struct PgUnitOfWorkFactory {
    pool: PgPool,
}

impl PgUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RecordError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Unit of work over one pooled connection. If neither `commit` nor
/// `rollback` runs, dropping the inner transaction rolls back and returns
/// the connection to the pool, so the connection is released exactly once
/// on every path.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WeatherRepository for PgUnitOfWork {
    async fn insert_request(&mut self, row: &RequestRow) -> Result<i64, RecordError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO requests (
                requested_at, latitude, longitude, endpoint, status,
                error_type, error_message, duration_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(row.requested_at)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(&row.endpoint)
        .bind(row.status.as_str())
        .bind(&row.error_type)
        .bind(&row.error_message)
        .bind(row.duration_ms)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_response(&mut self, row: &ResponseRow) -> Result<(), RecordError> {
        sqlx::query(
            r#"
            INSERT INTO responses (
                request_id, city, temperature, weather_type,
                sunrise, sunset, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.request_id)
        .bind(&row.city)
        .bind(row.temperature)
        .bind(&row.weather_type)
        .bind(row.sunrise)
        .bind(row.sunset)
        .bind(&row.payload)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RecordError> {
        self.tx.commit().await.map_err(Into::into)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RecordError> {
        self.tx.rollback().await.map_err(Into::into)
    }
}
