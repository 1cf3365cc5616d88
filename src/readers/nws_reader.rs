use chrono::{Datelike, NaiveDate};
use tracing::trace;

use super::field_decoder::{column, parse_number};
use super::SourceReader;
use crate::models::{Candidate, Field, ObservationKey, ObservationRecord, Reading, Source};
use crate::utils::constants::{CF6_SECTION_MARKER, DEFAULT_MISSING};
use crate::utils::units::reported_value;

const COLUMNS: [(usize, usize, Field); 6] = [
    (2, 6, Field::TMax),
    (6, 10, Field::TMin),
    (10, 14, Field::TAvg),
    (26, 31, Field::Prcp),
    (31, 36, Field::Snow),
    (36, 41, Field::Snwd),
];

/// Position of the scan within a CF6 report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cf6Section {
    /// Report heading, before the first marker
    Before,
    /// Column headings
    InHeader,
    /// Daily rows
    InData,
    /// Monthly summary and remarks
    After,
}

impl Cf6Section {
    pub fn advance(self) -> Self {
        match self {
            Cf6Section::Before => Cf6Section::InHeader,
            Cf6Section::InHeader => Cf6Section::InData,
            Cf6Section::InData | Cf6Section::After => Cf6Section::After,
        }
    }
}

/// CF6 monthly report reader. Rows carry only the day; year and month come
/// from the requested month.
pub struct NwsReader {
    station_id: String,
    year: i32,
    month: u32,
}

impl NwsReader {
    pub fn new(station_id: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            station_id: station_id.into(),
            year,
            month,
        }
    }

    /// Reader for the month containing `date` (normally the month end).
    pub fn for_month(station_id: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(station_id, date.year(), date.month())
    }

    pub fn parse_row(&self, line: &str) -> Option<Candidate> {
        let day = parse_number(column(line, 0, 2))?.as_i64().filter(|d| *d > 0)?;

        let key = ObservationKey::new(self.station_id.clone(), self.year, self.month, day as u32);
        if key.date().is_none() {
            trace!("Skipping impossible date {}", key);
            return None;
        }

        let mut record = ObservationRecord::for_source(Source::Nws);
        for (start, end, field) in COLUMNS {
            let value = reported_value(column(line, start, end)).filter(|v| *v != DEFAULT_MISSING);
            record.set_reading(field, value.map(Reading::new));
        }

        Candidate::new(key, record)
    }
}

impl SourceReader for NwsReader {
    fn source(&self) -> Source {
        Source::Nws
    }

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate> {
        let mut section = Cf6Section::Before;
        let mut candidates = Vec::new();

        for line in lines {
            if line.starts_with(CF6_SECTION_MARKER) {
                section = section.advance();
            } else if section == Cf6Section::InData && !line.is_empty() {
                candidates.extend(self.parse_row(line));
            }
        }
        candidates
    }
}
