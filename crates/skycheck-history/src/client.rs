//! Thread-safe access to a history store.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::alerts::AlertRuleEngine;
use crate::demo::demo_records;
use crate::record::{NewTemperatureRecord, TemperatureRecord};
use crate::store::{HistoryError, HistoryResult, HistoryStore, InsertOutcome};

/// A stored record with its alert messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub record: TemperatureRecord,
    pub alerts: Vec<String>,
}

/// Shares one store between the recorder and readers.
///
/// Writes are serialised by the mutex. Async methods run the store call on
/// the blocking pool.
#[derive(Clone)]
pub struct HistoryClient {
    store: Arc<Mutex<Box<dyn HistoryStore>>>,
}

impl HistoryClient {
    pub fn new(store: impl HistoryStore + 'static) -> Self {
        let store: Box<dyn HistoryStore> = Box::new(store);
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Insert synchronously. Used by the recorder from inside state callbacks.
    pub fn insert(&self, record: &NewTemperatureRecord) -> HistoryResult<InsertOutcome> {
        self.store.lock().insert(record)
    }

    pub fn records_blocking(&self) -> HistoryResult<Vec<TemperatureRecord>> {
        self.store.lock().query_all()
    }

    /// All records, most recent first.
    pub async fn list_records(&self) -> HistoryResult<Vec<TemperatureRecord>> {
        self.with_store(|store| store.query_all()).await
    }

    pub async fn count(&self) -> HistoryResult<usize> {
        self.with_store(|store| store.count()).await
    }

    /// Remove every record.
    pub async fn clear(&self) -> HistoryResult<usize> {
        self.with_store(|store| store.delete_all()).await
    }

    /// Records paired with the alert messages `engine` derives for them.
    pub async fn entries_with_alerts(
        &self,
        engine: &AlertRuleEngine,
    ) -> HistoryResult<Vec<HistoryEntry>> {
        let records = self.list_records().await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let alerts = engine.messages(&record);
                HistoryEntry { record, alerts }
            })
            .collect())
    }

    /// Insert the demo records, returning how many were new.
    pub async fn seed_demo(&self, captured_at_ms: i64) -> HistoryResult<usize> {
        let records = demo_records(captured_at_ms);
        self.with_store(move |store| {
            let mut inserted = 0;
            for record in &records {
                if !store.insert(record)?.is_duplicate() {
                    inserted += 1;
                }
            }
            tracing::info!("Seeded {} demo history records", inserted);
            Ok(inserted)
        })
        .await
    }

    async fn with_store<T, F>(&self, f: F) -> HistoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn HistoryStore) -> HistoryResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            f(&**guard)
        })
        .await
        .map_err(|e| HistoryError::Other(anyhow::anyhow!("History task failed: {}", e)))?
    }
}

impl std::fmt::Debug for HistoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryClient").finish_non_exhaustive()
    }
}
