//! Record store client.
//!
//! [`RecordStore`] is the seam between the UI core and the document database. The core only
//! ever reads one record and deletes one record; creation and updates happen elsewhere.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;

use crate::error::StoreResult;
use crate::record::Record;
use async_trait::async_trait;
use records_types::RecordId;

/// Result of looking up a record by id.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    Found(Record),
    NotFound,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Fetches the document stored under `id`.
    ///
    /// A missing document is [`FetchOutcome::NotFound`]; errors are reserved for transport,
    /// permission and decoding failures.
    async fn fetch_by_id(&self, id: &RecordId) -> StoreResult<FetchOutcome>;

    /// Deletes the document stored under `id`. Not idempotent.
    async fn delete(&self, id: &RecordId) -> StoreResult<()>;
}
