use tracing::trace;

use super::field_decoder::parse_number;
use super::SourceReader;
use crate::models::{Candidate, Field, ObservationKey, ObservationRecord, Reading, Source};
use crate::utils::constants::DEFAULT_MISSING;
use crate::utils::units::reported_value;

const COLUMNS: [(usize, Field); 5] = [
    (3, Field::TMax),
    (4, Field::TMin),
    (5, Field::Prcp),
    (6, Field::Snow),
    (7, Field::Snwd),
];

/// Split one row on tabs, treating four consecutive spaces as a tab.
pub fn split_columns(line: &str) -> Vec<String> {
    line.replace("    ", "\t")
        .trim()
        .split('\t')
        .map(|c| c.trim().to_string())
        .collect()
}

/// Decade tables: year, month, day, tmax, tmin, prcp, snow, snwd in °F and
/// inches. `M` marks a missing value and `T` a trace.
pub struct MnClimateReader {
    station_id: String,
}

impl MnClimateReader {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
        }
    }

    /// A row is data only when its first column is a positive number.
    pub fn parse_line(&self, line: &str) -> Option<Candidate> {
        let columns = split_columns(line);

        let year = parse_number(columns.first()?)?.as_i64().filter(|y| *y > 0)?;
        let month = parse_number(columns.get(1)?)?.as_i64()?;
        let day = parse_number(columns.get(2)?)?.as_i64()?;

        let key = ObservationKey::new(self.station_id.clone(), year as i32, month as u32, day as u32);
        if month < 1 || day < 1 || key.date().is_none() {
            trace!("Skipping impossible date in row: {}", line.trim());
            return None;
        }

        let mut record = ObservationRecord::for_source(Source::MnClimate);
        for (index, field) in COLUMNS {
            let value = columns
                .get(index)
                .and_then(|text| reported_value(text))
                .filter(|v| *v != DEFAULT_MISSING);
            record.set_reading(field, value.map(Reading::new));
        }

        Candidate::new(key, record)
    }
}

impl SourceReader for MnClimateReader {
    fn source(&self) -> Source {
        Source::MnClimate
    }

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate> {
        lines.iter().filter_map(|line| self.parse_line(line)).collect()
    }
}
