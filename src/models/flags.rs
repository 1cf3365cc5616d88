use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Kind of a single-character quality annotation attached to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlagKind {
    /// GHCN measurement flag (e.g. `T` trace, `B` multi-day total)
    #[serde(rename = "m")]
    Measurement,
    /// GHCN quality-control flag
    #[serde(rename = "q")]
    Quality,
    /// GHCN source flag
    #[serde(rename = "s")]
    Source,
    /// GSOD precipitation report flag or normals completeness flag
    #[serde(rename = "a")]
    Attribute,
    /// Value derived from hourly data rather than an explicit max/min report
    #[serde(rename = "h")]
    Hourly,
}

/// Small mapping of flag kind to flag character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeMap<FlagKind, char>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `flag` under `kind`; blank characters are not flags and are ignored.
    pub fn insert(&mut self, kind: FlagKind, flag: char) {
        if !flag.is_whitespace() {
            self.0.insert(kind, flag);
        }
    }

    pub fn with(mut self, kind: FlagKind, flag: char) -> Self {
        self.insert(kind, flag);
        self
    }

    pub fn get(&self, kind: FlagKind) -> Option<char> {
        self.0.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Empty sets are represented as absent.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    #[cfg(test)]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[cfg(test)]
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
