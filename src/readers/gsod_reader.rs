use tracing::trace;

use super::field_decoder::{DecodedLine, FieldSpec, LineLayout};
use super::SourceReader;
use crate::models::{
    Candidate, DayIndicators, Field, FlagKind, FlagSet, ObservationKey, ObservationRecord,
    Reading, Source,
};
use crate::utils::constants::{GSOD_PRCP_MISSING, GSOD_SNWD_MISSING, GSOD_TEMP_MISSING};
use crate::utils::units::display_units;

const HOURLY: &[char] = &['*'];
const OCCURRED: &[char] = &['1'];

const LAYOUT: LineLayout = LineLayout::new(&[
    FieldSpec::number("year", 14, 18, &[]),
    FieldSpec::number("month", 18, 20, &[]),
    FieldSpec::number("day", 20, 22, &[]),
    FieldSpec::number("tavg", 24, 30, &[GSOD_TEMP_MISSING]),
    FieldSpec::number("tmax", 102, 108, &[GSOD_TEMP_MISSING]),
    FieldSpec::flag("tmax_hourly", 108, HOURLY),
    FieldSpec::number("tmin", 110, 116, &[GSOD_TEMP_MISSING]),
    FieldSpec::flag("tmin_hourly", 116, HOURLY),
    FieldSpec::number("prcp", 118, 123, &[GSOD_PRCP_MISSING]),
    FieldSpec::text("prcp_flag", 123, 124),
    FieldSpec::number("snwd", 125, 130, &[GSOD_SNWD_MISSING]),
    FieldSpec::flag("fog", 132, OCCURRED),
    FieldSpec::flag("rain", 133, OCCURRED),
    FieldSpec::flag("snow", 134, OCCURRED),
    FieldSpec::flag("hail", 135, OCCURRED),
    FieldSpec::flag("thunder", 136, OCCURRED),
    FieldSpec::flag("tornado", 137, OCCURRED),
])
.with_numeric_lead();

/// Global Summary of the Day, one line per station-day, already in °F and
/// inches.
pub struct GsodReader {
    station_id: String,
}

impl GsodReader {
    /// `station_id` is the canonical (GHCN) id rows are stored under.
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
        }
    }

    pub fn parse_line(&self, line: &str) -> Option<Candidate> {
        let decoded = LAYOUT.decode(line)?;

        let key = ObservationKey::new(
            self.station_id.clone(),
            decoded.integer("year")? as i32,
            decoded.integer("month")? as u32,
            decoded.integer("day")? as u32,
        );
        if key.date().is_none() {
            trace!("Skipping impossible date {}", key);
            return None;
        }

        let mut record = ObservationRecord::for_source(Source::Gsod)
            .with_indicators(indicators(&decoded));

        if let Some(tavg) = decoded.number("tavg") {
            record.set_reading(Field::TAvg, Some(Reading::new(display_units(tavg))));
        }
        if let Some(tmax) = decoded.number("tmax") {
            record.set_reading(Field::TMax, Some(hourly_reading(tmax, decoded.flag("tmax_hourly"))));
        }
        if let Some(tmin) = decoded.number("tmin") {
            record.set_reading(Field::TMin, Some(hourly_reading(tmin, decoded.flag("tmin_hourly"))));
        }
        if let Some(prcp) = decoded.number("prcp") {
            let mut flags = FlagSet::new();
            if let Some(c) = decoded.text("prcp_flag").and_then(|t| t.chars().next()) {
                flags.insert(FlagKind::Attribute, c);
            }
            record.set_reading(Field::Prcp, Some(Reading::with_flags(display_units(prcp), flags)));
        }
        if let Some(snwd) = decoded.number("snwd") {
            record.set_reading(Field::Snwd, Some(Reading::new(display_units(snwd))));
        }

        Candidate::new(key, record)
    }
}

/// A `*` after a temperature means it was derived from hourly data.
fn hourly_reading(value: f64, hourly: bool) -> Reading {
    let flags = if hourly {
        FlagSet::new().with(FlagKind::Hourly, '*')
    } else {
        FlagSet::new()
    };
    Reading::with_flags(display_units(value), flags)
}

fn indicators(decoded: &DecodedLine) -> DayIndicators {
    DayIndicators {
        fog: decoded.flag("fog"),
        rain: decoded.flag("rain"),
        snow: decoded.flag("snow"),
        hail: decoded.flag("hail"),
        thunder: decoded.flag("thunder"),
        tornado: decoded.flag("tornado"),
    }
}

impl SourceReader for GsodReader {
    fn source(&self) -> Source {
        Source::Gsod
    }

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate> {
        lines.iter().filter_map(|line| self.parse_line(line)).collect()
    }
}
