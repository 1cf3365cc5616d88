use tracing::trace;

use super::field_decoder::{DaySegment, DaySegments, FieldSpec, LineLayout};
use super::SourceReader;
use crate::models::{Candidate, Field, FlagKind, FlagSet, ObservationKey, ObservationRecord, Reading, Source};
use crate::utils::constants::{GHCN_DAY_OFFSET, GHCN_DAY_STRIDE, GHCN_MISSING, GHCN_VALUE_WIDTH};
use crate::utils::units::{tenths_celsius_to_fahrenheit, to_inches, LengthScale};

const HEADER: LineLayout = LineLayout::new(&[
    FieldSpec::text("station", 0, 11),
    FieldSpec::number("year", 11, 15, &[]),
    FieldSpec::number("month", 15, 17, &[]),
    FieldSpec::text("element", 17, 21),
]);

/// GHCN-Daily `.dly` reader. One line is one station-month-element with up
/// to 31 eight-byte day segments (value, then measurement, quality and source
/// flags).
pub struct GhcnReader {
    elements: Vec<Field>,
}

impl GhcnReader {
    pub fn new() -> Self {
        Self {
            elements: Field::READINGS.to_vec(),
        }
    }

    /// Restrict the elements kept (others are skipped).
    #[cfg(test)]
    pub fn with_elements(elements: Vec<Field>) -> Self {
        Self { elements }
    }

    /// Candidates for every valid day of one monthly line.
    pub fn parse_line(&self, line: &str) -> Vec<Candidate> {
        let Some(header) = HEADER.decode(line) else {
            return Vec::new();
        };

        let (Some(station), Some(year), Some(month), Some(element)) = (
            header.text("station"),
            header.integer("year"),
            header.integer("month"),
            header.text("element"),
        ) else {
            return Vec::new();
        };

        let Some(field) = Field::from_element(element).filter(|f| self.elements.contains(f))
        else {
            return Vec::new();
        };

        DaySegments::new(line, GHCN_DAY_OFFSET, GHCN_DAY_STRIDE)
            .filter_map(|segment| {
                let key = ObservationKey::new(station, year as i32, month as u32, segment.day);
                self.parse_segment(key, field, &segment)
            })
            .collect()
    }

    fn parse_segment(
        &self,
        key: ObservationKey,
        field: Field,
        segment: &DaySegment<'_>,
    ) -> Option<Candidate> {
        let raw = segment.value(GHCN_VALUE_WIDTH, &[GHCN_MISSING])?;
        if key.date().is_none() {
            trace!("Skipping impossible date {}", key);
            return None;
        }

        let flags = FlagSet::new()
            .with(FlagKind::Measurement, segment.char_at(5))
            .with(FlagKind::Quality, segment.char_at(6))
            .with(FlagKind::Source, segment.char_at(7));

        let value = normalize(field, raw.as_f64());
        let record = ObservationRecord::for_source(Source::Ghcn)
            .with_reading(field, Reading::with_flags(value, flags));

        Candidate::new(key, record)
    }
}

/// Temperatures are tenths of °C, PRCP tenths of mm, SNOW and SNWD whole mm.
fn normalize(field: Field, raw: f64) -> f64 {
    match field {
        Field::TMax | Field::TMin | Field::TAvg => tenths_celsius_to_fahrenheit(raw),
        Field::Prcp => to_inches(raw, LengthScale::TenthsOfMillimetres),
        _ => to_inches(raw, LengthScale::Millimetres),
    }
}

impl Default for GhcnReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for GhcnReader {
    fn source(&self) -> Source {
        Source::Ghcn
    }

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate> {
        lines.iter().flat_map(|line| self.parse_line(line)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOBS_LINE: &str = "USC00011084192601TOBS-9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999   -9999     217  6   28  6   39  6   44  6  100  6  106  6  117  6  106  6  128  6   94  6  189  6";

    fn month_line(element: &str, month: &str, segments: &[&str]) -> String {
        let mut line = format!("USW000149222014{}{}", month, element);
        for segment in segments {
            line.push_str(&format!("{:<8}", segment));
        }
        line
    }

    #[test]
    fn test_parse_tmax_line() {
        let line = month_line("TMAX", "06", &["  217  W", "  -56 IX", "-9999   "]);
        let candidates = GhcnReader::new().parse_line(&line);

        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.key, ObservationKey::new("USW00014922", 2014, 6, 1));
        assert_eq!(first.source, Source::Ghcn);
        let reading = first.record.tmax.as_ref().unwrap();
        assert_eq!(reading.value, 71.06);
        assert_eq!(reading.flags.as_ref().unwrap().get(FlagKind::Source), Some('W'));
        assert_eq!(reading.flags.as_ref().unwrap().len(), 1);

        let second = &candidates[1];
        assert_eq!(second.key.day, 2);
        let reading = second.record.tmax.as_ref().unwrap();
        assert_eq!(reading.value, 21.92);
        let flags = reading.flags.as_ref().unwrap();
        assert_eq!(flags.get(FlagKind::Quality), Some('I'));
        assert_eq!(flags.get(FlagKind::Source), Some('X'));
        assert_eq!(flags.get(FlagKind::Measurement), None);
    }

    #[test]
    fn test_flags_absent_when_blank() {
        let line = month_line("PRCP", "06", &["  254   "]);
        let candidates = GhcnReader::new().parse_line(&line);

        assert_eq!(candidates.len(), 1);
        let reading = candidates[0].record.prcp.as_ref().unwrap();
        assert_eq!(reading.value, 1.0);
        assert!(reading.flags.is_none());
    }

    #[test]
    fn test_snow_is_whole_millimetres() {
        let line = month_line("SNWD", "01", &["  254   "]);
        let candidates = GhcnReader::new().parse_line(&line);
        assert_eq!(candidates[0].record.snwd.as_ref().unwrap().value, 10.0);
    }

    #[test]
    fn test_impossible_days_are_not_emitted() {
        // April has 30 days; a value in segment 31 must not become a record
        let segments: Vec<&str> = std::iter::repeat("   10   ").take(31).collect();
        let line = month_line("TMIN", "04", &segments);
        let candidates = GhcnReader::new().parse_line(&line);

        assert_eq!(candidates.len(), 30);
        assert!(candidates.iter().all(|c| c.key.day <= 30));
    }

    #[test]
    fn test_unlisted_elements_are_skipped() {
        let candidates = GhcnReader::new().parse_line(TOBS_LINE);
        assert!(candidates.is_empty());

        let line = month_line("TMAX", "06", &["  217   "]);
        let reader = GhcnReader::with_elements(vec![Field::Prcp]);
        assert!(reader.parse_line(&line).is_empty());
    }

    #[test]
    fn test_read_lines_skips_garbage() {
        let lines = vec![
            String::new(),
            "short".to_string(),
            month_line("TMAX", "06", &["  217   ", "  220   "]),
        ];
        let candidates = GhcnReader::new().read_lines(&lines);
        assert_eq!(candidates.len(), 2);
    }
}
