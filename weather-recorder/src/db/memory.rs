//! In-memory implementation of the unit of work.
//!
//! Suitable for tests and single-process runs where persistence isn't
//! required. Rows are staged inside the unit of work and only become
//! visible in the store on commit, mirroring the transactional behavior of
//! the Postgres implementation.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use common::errors::RecordError;

use super::repository::{RequestRow, ResponseRow, UnitOfWork, UnitOfWorkFactory, WeatherRepository};

#[derive(Debug, Default)]
struct StoreInner {
    next_request_id: i64,
    requests: Vec<(i64, RequestRow)>,
    responses: Vec<ResponseRow>,
    releases: usize,
}

/// Shared backing store for [`MemoryUnitOfWorkFactory`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Committed request rows with their ids.
    pub fn requests(&self) -> Vec<(i64, RequestRow)> {
        self.lock().requests.clone()
    }

    /// Committed response rows.
    pub fn responses(&self) -> Vec<ResponseRow> {
        self.lock().responses.clone()
    }

    /// How many units of work have released their "connection" so far.
    /// Each unit of work counts exactly once, on commit, rollback or drop.
    pub fn releases(&self) -> usize {
        self.lock().releases
    }
}

pub struct MemoryUnitOfWorkFactory {
    store: Arc<MemoryStore>,
    fail_response_inserts: bool,
}

impl MemoryUnitOfWorkFactory {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            fail_response_inserts: false,
        }
    }

    /// Make every response insert fail, for exercising rollback paths.
    pub fn with_failing_response_inserts(mut self) -> Self {
        self.fail_response_inserts = true;
        self
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RecordError> {
        Ok(Box::new(MemoryUnitOfWork {
            store: Arc::clone(&self.store),
            staged_requests: Vec::new(),
            staged_responses: Vec::new(),
            fail_response_inserts: self.fail_response_inserts,
        }))
    }
}

pub struct MemoryUnitOfWork {
    store: Arc<MemoryStore>,
    staged_requests: Vec<(i64, RequestRow)>,
    staged_responses: Vec<ResponseRow>,
    fail_response_inserts: bool,
}

#[async_trait]
impl WeatherRepository for MemoryUnitOfWork {
    async fn insert_request(&mut self, row: &RequestRow) -> Result<i64, RecordError> {
        // ids come from a shared sequence, like a database sequence they
        // are not reclaimed on rollback
        let id = {
            let mut inner = self.store.lock();
            inner.next_request_id += 1;
            inner.next_request_id
        };
        self.staged_requests.push((id, row.clone()));
        Ok(id)
    }

    async fn insert_response(&mut self, row: &ResponseRow) -> Result<(), RecordError> {
        if self.fail_response_inserts {
            return Err(RecordError::database("simulated response insert failure"));
        }
        let references_staged = self
            .staged_requests
            .iter()
            .any(|(id, _)| *id == row.request_id);
        let references_committed = self
            .store
            .lock()
            .requests
            .iter()
            .any(|(id, _)| *id == row.request_id);
        if !references_staged && !references_committed {
            return Err(RecordError::database(format!(
                "foreign key violation: no request with id {}",
                row.request_id
            )));
        }
        self.staged_responses.push(row.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(mut self: Box<Self>) -> Result<(), RecordError> {
        let mut inner = self.store.lock();
        inner.requests.append(&mut self.staged_requests);
        inner.responses.append(&mut self.staged_responses);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RecordError> {
        // staged rows are discarded when the box drops
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.store.lock().releases += 1;
    }
}
