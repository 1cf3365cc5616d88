pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ObservationKey, ObservationRecord};

/// Point lookup and upsert by composite key within a named table.
pub trait ObservationStore {
    fn lookup(&self, table: &str, key: &ObservationKey) -> Result<Option<ObservationRecord>>;

    fn upsert(&mut self, table: &str, key: ObservationKey, record: ObservationRecord) -> Result<()>;
}

/// One persisted row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub key: ObservationKey,
    pub record: ObservationRecord,
}
