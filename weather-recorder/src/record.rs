use chrono::{DateTime, Utc};
use common::errors::{RecordError, WeatherError};
use common::models::{Coordinates, Weather};
use serde_json::Value;
use tracing::error;

use crate::db::repository::{
    RequestRow, RequestStatus, ResponseRow, UnitOfWork, UnitOfWorkFactory,
};

/// Records the outcome of one cycle, one unit of work (one transaction)
/// per call.
pub struct RecordService<F: UnitOfWorkFactory> {
    factory: F,
}

impl<F: UnitOfWorkFactory> RecordService<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Persist a failed attempt: one request row with status `error`,
    /// never a response row.
    pub async fn record_error(
        &self,
        requested_at: DateTime<Utc>,
        coordinates: Option<Coordinates>,
        endpoint: &str,
        error_kind: &WeatherError,
        duration_ms: Option<i32>,
    ) -> Result<(), RecordError> {
        let row = RequestRow {
            requested_at,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            endpoint: endpoint.to_string(),
            status: RequestStatus::Error,
            error_type: Some(error_kind.error_type().to_string()),
            error_message: Some(error_kind.error_message().to_string()),
            duration_ms,
        };

        let mut uow = self.factory.begin().await?;
        match uow.insert_request(&row).await {
            Ok(_) => uow.commit().await,
            Err(err) => rollback_after(uow, err).await,
        }
    }

    /// Persist a successful attempt: one request row with status `ok` plus
    /// one response row referencing it, committed as a single transaction.
    pub async fn record_success(
        &self,
        requested_at: DateTime<Utc>,
        coordinates: Coordinates,
        endpoint: &str,
        duration_ms: i32,
        weather: &Weather,
        payload: &Value,
    ) -> Result<(), RecordError> {
        let request = RequestRow {
            requested_at,
            latitude: Some(coordinates.latitude),
            longitude: Some(coordinates.longitude),
            endpoint: endpoint.to_string(),
            status: RequestStatus::Ok,
            error_type: None,
            error_message: None,
            duration_ms: Some(duration_ms),
        };

        let mut uow = self.factory.begin().await?;
        let request_id = match uow.insert_request(&request).await {
            Ok(id) => id,
            Err(err) => return rollback_after(uow, err).await,
        };

        let response = ResponseRow {
            request_id,
            city: weather.city.clone(),
            temperature: weather.temperature,
            weather_type: weather.weather_type.as_str().to_string(),
            sunrise: weather.sunrise.with_timezone(&Utc),
            sunset: weather.sunset.with_timezone(&Utc),
            payload: payload.clone(),
        };
        match uow.insert_response(&response).await {
            Ok(()) => uow.commit().await,
            Err(err) => rollback_after(uow, err).await,
        }
    }
}

/// Roll back and re-surface the original error. A rollback failure is
/// logged but never masks the insert error that triggered it.
async fn rollback_after(
    uow: Box<dyn UnitOfWork>,
    err: RecordError,
) -> Result<(), RecordError> {
    if let Err(rollback_err) = uow.rollback().await {
        error!(error = %rollback_err, "rollback failed after insert error");
    }
    Err(err)
}
