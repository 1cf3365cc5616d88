use serde::Serialize;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::models::{Candidate, Field, ObservationRecord, Source};
use crate::store::ObservationStore;

/// How incoming fields are applied to a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Honor per-field source precedence (canonical table)
    Guarded,
    /// Incoming fields always replace stored ones (per-source tables)
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Unchanged,
    /// Transient store failure; the key is skipped for this pass
    Abandoned,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub filtered: usize,
    pub abandoned: usize,
    pub protected_fields: usize,
}

impl MergeStats {
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Updated => self.updated += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
            MergeOutcome::Abandoned => self.abandoned += 1,
        }
    }

    pub fn absorb(&mut self, other: &MergeStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.filtered += other.filtered;
        self.abandoned += other.abandoned;
        self.protected_fields += other.protected_fields;
    }

    /// Candidates that reached the store.
    #[cfg(test)]
    pub fn merged(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} unchanged, {} filtered, {} abandoned, {} protected fields",
            self.inserted,
            self.updated,
            self.unchanged,
            self.filtered,
            self.abandoned,
            self.protected_fields
        )
    }
}

/// Result of overlaying one record onto another.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub record: ObservationRecord,
    pub protected_fields: Vec<Field>,
}

/// Overlay the present fields of `incoming` (written by `source`) onto
/// `existing`. Absent incoming fields leave stored ones untouched.
pub fn overlay(
    existing: &ObservationRecord,
    incoming: &ObservationRecord,
    source: Source,
    policy: MergePolicy,
) -> Overlay {
    let mut record = existing.clone();
    let mut protected_fields = Vec::new();

    for field in incoming.present_fields() {
        if policy == MergePolicy::Guarded && existing.has_field(field) {
            if let Some(holder) = existing.field_source(field) {
                if !source.may_overwrite(holder) {
                    trace!("{} keeps {} over {}", holder, field.name(), source);
                    protected_fields.push(field);
                    continue;
                }
            }
        }

        match field {
            Field::Indicators => record.indicators = incoming.indicators,
            _ => record.set_reading(field, incoming.reading(field).cloned()),
        }
        record.provenance.insert(field, source);
    }

    let retag = record
        .source
        .map_or(true, |current| source.precedence() >= current.precedence());
    if retag {
        record.source = Some(source);
    }

    Overlay {
        record,
        protected_fields,
    }
}

/// Reconciles candidates against the stored row for their key: lookup,
/// field-level overlay, upsert. Under [`MergePolicy::Guarded`] a field written
/// by a higher-precedence source is never overwritten by a lower one; other
/// fields of the same row stay open to every source.
pub struct RecordMerger {
    policy: MergePolicy,
    stats: MergeStats,
}

impl RecordMerger {
    pub fn new() -> Self {
        Self::with_policy(MergePolicy::Guarded)
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            stats: MergeStats::default(),
        }
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    pub fn take_stats(&mut self) -> MergeStats {
        std::mem::take(&mut self.stats)
    }

    /// Reconcile one candidate with `table`.
    ///
    /// Transient store failures abandon the key and return
    /// [`MergeOutcome::Abandoned`]; other store errors are returned.
    pub fn merge<S: ObservationStore + ?Sized>(
        &mut self,
        store: &mut S,
        table: &str,
        candidate: &Candidate,
    ) -> Result<MergeOutcome> {
        let outcome = match self.try_merge(store, table, candidate) {
            Ok(outcome) => outcome,
            Err(e) if e.is_transient() => {
                warn!("Abandoning {} in {} for this pass: {}", candidate.key, table, e);
                MergeOutcome::Abandoned
            }
            Err(e) => return Err(e),
        };

        self.stats.record(outcome);
        Ok(outcome)
    }

    fn try_merge<S: ObservationStore + ?Sized>(
        &mut self,
        store: &mut S,
        table: &str,
        candidate: &Candidate,
    ) -> Result<MergeOutcome> {
        let existing = store.lookup(table, &candidate.key)?;

        let base = existing.clone().unwrap_or_default();
        let merged = overlay(&base, &candidate.record, candidate.source, self.policy);
        self.stats.protected_fields += merged.protected_fields.len();

        match existing {
            None => {
                store.upsert(table, candidate.key.clone(), merged.record)?;
                debug!("Inserted {} into {}", candidate.key, table);
                Ok(MergeOutcome::Inserted)
            }
            Some(current) if current == merged.record => Ok(MergeOutcome::Unchanged),
            Some(_) => {
                store.upsert(table, candidate.key.clone(), merged.record)?;
                trace!("Updated {} in {}", candidate.key, table);
                Ok(MergeOutcome::Updated)
            }
        }
    }

    /// Merge candidates in order; stops only on a fatal store error.
    pub fn merge_all<S: ObservationStore + ?Sized>(
        &mut self,
        store: &mut S,
        table: &str,
        candidates: &[Candidate],
    ) -> Result<()> {
        for candidate in candidates {
            self.merge(store, table, candidate)?;
        }
        Ok(())
    }
}

impl Default for RecordMerger {
    fn default() -> Self {
        Self::new()
    }
}
