use super::{FetchOutcome, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use async_trait::async_trait;
use records_types::RecordId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// In-process store with call counters and failure switches, for demos and tests.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<RecordId, Record>>,
    fetch_calls: AtomicU64,
    delete_calls: AtomicU64,
    deleted_ids: Mutex<Vec<RecordId>>,
    fail_fetch: AtomicBool,
    fail_delete: AtomicBool,
    delete_delay: Duration,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Delays every delete by `delay` before it takes effect.
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub async fn insert(&self, record: Record) {
        self.records.lock().await.insert(record.id.clone(), record);
    }

    pub async fn contains(&self, id: &RecordId) -> bool {
        self.records.lock().await.contains_key(id)
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `delete`, in call order, whether or not the delete succeeded.
    pub async fn deleted_ids(&self) -> Vec<RecordId> {
        self.deleted_ids.lock().await.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_by_id(&self, id: &RecordId) -> StoreResult<FetchOutcome> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("fetch disabled".into()));
        }
        Ok(match self.records.lock().await.get(id) {
            Some(record) => FetchOutcome::Found(record.clone()),
            None => FetchOutcome::NotFound,
        })
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted_ids.lock().await.push(id.clone());
        if !self.delete_delay.is_zero() {
            tokio::time::sleep(self.delete_delay).await;
        }
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete disabled".into()));
        }
        match self.records.lock().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::Missing(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;

    #[tokio::test]
    async fn test_counts_calls_and_removes() {
        let store = InMemoryStore::with_records([sample_record("p42")]);
        let id = RecordId::parse("p42").unwrap();

        assert!(matches!(
            store.fetch_by_id(&id).await.unwrap(),
            FetchOutcome::Found(_)
        ));
        store.delete(&id).await.unwrap();

        assert_eq!(store.fetch_calls(), 1);
        assert_eq!(store.delete_calls(), 1);
        assert!(!store.contains(&id).await);
        assert!(matches!(
            store.delete(&id).await,
            Err(StoreError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = InMemoryStore::with_records([sample_record("p42")]);
        let id = RecordId::parse("p42").unwrap();
        store.set_fail_fetch(true);
        store.set_fail_delete(true);

        assert!(matches!(
            store.fetch_by_id(&id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.delete(&id).await.is_err());
        assert!(store.contains(&id).await, "failed delete keeps the record");
    }
}
