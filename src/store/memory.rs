use std::collections::BTreeMap;

use super::{ObservationStore, StoredRow};
use crate::error::Result;
use crate::models::{ObservationKey, ObservationRecord};

type Table = BTreeMap<ObservationKey, ObservationRecord>;

/// Tables held in ordered maps; rows iterate in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    tables: BTreeMap<String, Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn get(&self, table: &str, key: &ObservationKey) -> Option<&ObservationRecord> {
        self.tables.get(table).and_then(|t| t.get(key))
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }

    pub fn records<'a>(
        &'a self,
        table: &str,
    ) -> impl Iterator<Item = (&'a ObservationKey, &'a ObservationRecord)> + 'a {
        self.tables.get(table).into_iter().flat_map(|t| t.iter())
    }

    pub fn to_rows(&self) -> BTreeMap<String, Vec<StoredRow>> {
        self.tables
            .iter()
            .map(|(name, table)| {
                let rows = table
                    .iter()
                    .map(|(key, record)| StoredRow {
                        key: key.clone(),
                        record: record.clone(),
                    })
                    .collect();
                (name.clone(), rows)
            })
            .collect()
    }

    pub fn from_rows(tables: BTreeMap<String, Vec<StoredRow>>) -> Self {
        let tables = tables
            .into_iter()
            .map(|(name, rows)| {
                let table = rows.into_iter().map(|row| (row.key, row.record)).collect();
                (name, table)
            })
            .collect();
        Self { tables }
    }
}

impl ObservationStore for MemoryStore {
    fn lookup(&self, table: &str, key: &ObservationKey) -> Result<Option<ObservationRecord>> {
        Ok(self.get(table, key).cloned())
    }

    fn upsert(&mut self, table: &str, key: ObservationKey, record: ObservationRecord) -> Result<()> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }
}
