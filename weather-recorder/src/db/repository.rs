//! Narrow persistence interface for the recording pipeline.
//!
//! A repository inserts request/response rows inside one transaction. The
//! transaction itself is modeled as a unit of work with three states:
//! unopened (the factory), active (a boxed [`UnitOfWork`]), and closed
//! (the value consumed by `commit` or `rollback`). Implementations exist
//! for Postgres and, for tests and single-process use, in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::RecordError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Ok,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// One row of the `requests` table. Latitude/longitude are absent when the
/// attempt failed before coordinates were known; duration is absent only
/// when the failure happened before timing started.
#[derive(Debug, Clone)]
pub struct RequestRow {
    pub requested_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub endpoint: String,
    pub status: RequestStatus,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: Option<i32>,
}

/// One row of the `responses` table; `received_at` is assigned by the
/// database.
#[derive(Debug, Clone)]
pub struct ResponseRow {
    pub request_id: i64,
    pub city: String,
    pub temperature: i32,
    pub weather_type: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub payload: Value,
}

#[async_trait]
pub trait WeatherRepository: Send {
    /// Insert one request row and return its generated id.
    async fn insert_request(&mut self, row: &RequestRow) -> Result<i64, RecordError>;

    /// Insert one response row referencing an existing request.
    async fn insert_response(&mut self, row: &ResponseRow) -> Result<(), RecordError>;
}

/// One open transaction. Single use: committing or rolling back consumes
/// the value, and implementations release the underlying connection exactly
/// once whichever path is taken (including drop without either call).
#[async_trait]
pub trait UnitOfWork: WeatherRepository {
    async fn commit(self: Box<Self>) -> Result<(), RecordError>;

    async fn rollback(self: Box<Self>) -> Result<(), RecordError>;
}

/// Hands out fresh units of work, one connection each.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RecordError>;
}
