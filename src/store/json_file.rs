use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{MemoryStore, ObservationStore, StoredRow};
use crate::error::{ProcessingError, Result};
use crate::models::{ObservationKey, ObservationRecord};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    tables: BTreeMap<String, Vec<StoredRow>>,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Memory store loaded from and saved to a JSON snapshot file.
///
/// Writes only touch memory until [`JsonFileStore::save`]; the snapshot is
/// written to a sibling temporary file and renamed into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let inner = if path.exists() {
            let file = fs::File::open(&path)?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)).map_err(|e| {
                ProcessingError::StoreCorrupted(format!("{}: {}", path.display(), e))
            })?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(ProcessingError::StoreCorrupted(format!(
                    "{}: unsupported snapshot version {}",
                    path.display(),
                    snapshot.version
                )));
            }
            MemoryStore::from_rows(snapshot.tables)
        } else {
            debug!("No snapshot at {}, starting empty", path.display());
            MemoryStore::new()
        };

        Ok(Self {
            path,
            inner,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self) -> Result<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            tables: self.inner.to_rows(),
        };

        let mut temp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp.as_file_mut());
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        temp.persist(&self.path).map_err(|e| ProcessingError::Io(e.error))?;

        self.dirty = false;
        info!("Saved store snapshot to {}", self.path.display());
        Ok(())
    }
}

impl ObservationStore for JsonFileStore {
    fn lookup(&self, table: &str, key: &ObservationKey) -> Result<Option<ObservationRecord>> {
        self.inner.lookup(table, key)
    }

    fn upsert(&mut self, table: &str, key: ObservationKey, record: ObservationRecord) -> Result<()> {
        self.inner.upsert(table, key, record)?;
        self.dirty = true;
        Ok(())
    }
}
