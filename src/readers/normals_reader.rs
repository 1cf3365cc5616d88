use tracing::{debug, trace};

use super::field_decoder::{DaySegment, DaySegments};
use super::SourceReader;
use crate::models::{Candidate, Field, FlagKind, FlagSet, ObservationKey, ObservationRecord, Reading, Source};
use crate::utils::constants::{
    NORMALS_DAY_OFFSET, NORMALS_DAY_STRIDE, NORMALS_MISSING, NORMALS_MONTHS,
    NORMALS_REFERENCE_YEAR, NORMALS_ROUNDS_TO_ZERO, NORMALS_VALUE_WIDTH,
};
use crate::utils::units::{scale_normal, MonthToDate, NormalsClass};

/// One section of the normals file and where its values land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalsSection {
    pub marker: &'static str,
    pub field: Field,
    pub class: NormalsClass,
}

pub const NORMALS_SECTIONS: [NormalsSection; 5] = [
    NormalsSection {
        marker: "dly-tmax-normal",
        field: Field::TMax,
        class: NormalsClass::Temperature,
    },
    NormalsSection {
        marker: "dly-tmin-normal",
        field: Field::TMin,
        class: NormalsClass::Temperature,
    },
    NormalsSection {
        marker: "dly-tavg-normal",
        field: Field::TAvg,
        class: NormalsClass::Temperature,
    },
    NormalsSection {
        marker: "mtd-prcp-normal",
        field: Field::Prcp,
        class: NormalsClass::Precipitation,
    },
    NormalsSection {
        marker: "mtd-snow-normal",
        field: Field::Snow,
        class: NormalsClass::Snow,
    },
];

/// Twelve lines from the first line starting with `marker`; empty when the
/// marker never appears, shorter when the file ends early.
pub fn find_section<'a>(lines: &'a [String], marker: &str) -> &'a [String] {
    match lines.iter().position(|line| line.starts_with(marker)) {
        Some(start) => {
            let end = (start + NORMALS_MONTHS).min(lines.len());
            &lines[start..end]
        }
        None => &[],
    }
}

/// 1981-2010 normals. Each section's twelve month lines carry 31 seven-byte
/// segments: 5-column value, 1 flag column, 1 spacer.
pub struct NormalsReader {
    station_id: String,
    sections: Vec<NormalsSection>,
}

impl NormalsReader {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            sections: NORMALS_SECTIONS.to_vec(),
        }
    }

    pub fn read_section(&self, lines: &[String], section: &NormalsSection) -> Vec<Candidate> {
        let section_lines = find_section(lines, section.marker);
        if section_lines.is_empty() {
            debug!("Normals section {} not found", section.marker);
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for (index, line) in section_lines.iter().enumerate() {
            let month = index as u32 + 1;
            let mut month_to_date = MonthToDate::new();

            for segment in DaySegments::new(line, NORMALS_DAY_OFFSET, NORMALS_DAY_STRIDE) {
                let Some(raw) = normal_value(&segment) else {
                    continue;
                };

                let mut value = scale_normal(raw, section.class);
                if section.class.is_cumulative() {
                    value = month_to_date.next(value);
                }

                let key = ObservationKey::new(
                    self.station_id.clone(),
                    NORMALS_REFERENCE_YEAR,
                    month,
                    segment.day,
                );
                if key.date().is_none() {
                    trace!("Skipping impossible normals day {}", key);
                    continue;
                }

                let flags = FlagSet::new().with(FlagKind::Attribute, segment.char_at(NORMALS_VALUE_WIDTH));
                let record = ObservationRecord::for_source(Source::Normals)
                    .with_reading(section.field, Reading::with_flags(value, flags));
                candidates.extend(Candidate::new(key, record));
            }
        }
        candidates
    }
}

/// Raw value of a segment with the special codes applied: the missing codes
/// yield `None`, the "rounds to zero" code yields 0.
fn normal_value(segment: &DaySegment<'_>) -> Option<f64> {
    let raw = segment.value(NORMALS_VALUE_WIDTH, &NORMALS_MISSING)?.as_f64();
    if raw == NORMALS_ROUNDS_TO_ZERO {
        Some(0.0)
    } else {
        Some(raw)
    }
}

impl SourceReader for NormalsReader {
    fn source(&self) -> Source {
        Source::Normals
    }

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate> {
        self.sections
            .iter()
            .flat_map(|section| self.read_section(lines, section))
            .collect()
    }
}
