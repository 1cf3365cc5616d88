use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use super::flags::FlagSet;
use super::source::Source;

/// Composite identity of one canonical observation row.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Validate,
)]
pub struct ObservationKey {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: u32,

    #[validate(range(min = 1, max = 31))]
    pub day: u32,
}

impl ObservationKey {
    pub fn new(station_id: impl Into<String>, year: i32, month: u32, day: u32) -> Self {
        Self {
            station_id: station_id.into(),
            year,
            month,
            day,
        }
    }

    pub fn from_date(station_id: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(station_id, date.year(), date.month(), date.day())
    }

    /// Calendar date of the key, `None` for impossible days such as 31 April.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:04}-{:02}-{:02}",
            self.station_id, self.year, self.month, self.day
        )
    }
}

/// Mergeable slot of an observation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    TMax,
    TMin,
    TAvg,
    Prcp,
    Snow,
    Snwd,
    Indicators,
}

impl Field {
    /// Fields that hold a numeric reading.
    pub const READINGS: [Field; 6] = [
        Field::TMax,
        Field::TMin,
        Field::TAvg,
        Field::Prcp,
        Field::Snow,
        Field::Snwd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::TMax => "tmax",
            Field::TMin => "tmin",
            Field::TAvg => "tavg",
            Field::Prcp => "prcp",
            Field::Snow => "snow",
            Field::Snwd => "snwd",
            Field::Indicators => "indicators",
        }
    }

    /// Map a GHCN element code (`TMAX`, `PRCP`, ...) to its field.
    pub fn from_element(element: &str) -> Option<Self> {
        match element.trim().to_ascii_uppercase().as_str() {
            "TMAX" => Some(Field::TMax),
            "TMIN" => Some(Field::TMin),
            "TAVG" => Some(Field::TAvg),
            "PRCP" => Some(Field::Prcp),
            "SNOW" => Some(Field::Snow),
            "SNWD" => Some(Field::Snwd),
            _ => None,
        }
    }
}

/// Normalized value (°F or inches) with the flags that describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagSet>,
}

impl Reading {
    pub fn new(value: f64) -> Self {
        Self { value, flags: None }
    }

    pub fn with_flags(value: f64, flags: FlagSet) -> Self {
        Self {
            value,
            flags: flags.into_option(),
        }
    }
}

/// GSOD FRSHTT weather-occurrence indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayIndicators {
    pub fog: bool,
    pub rain: bool,
    pub snow: bool,
    pub hail: bool,
    pub thunder: bool,
    pub tornado: bool,
}

impl DayIndicators {
    pub fn any(&self) -> bool {
        self.fog || self.rain || self.snow || self.hail || self.thunder || self.tornado
    }
}

/// Partial or accumulated observation for one key. Every slot is optional:
/// absent means "not provided", which is distinct from a measured zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub source: Option<Source>,
    pub tmax: Option<Reading>,
    pub tmin: Option<Reading>,
    pub tavg: Option<Reading>,
    pub prcp: Option<Reading>,
    pub snow: Option<Reading>,
    pub snwd: Option<Reading>,
    pub indicators: Option<DayIndicators>,

    /// Which source wrote each populated field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<Field, Source>,
}

impl ObservationRecord {
    pub fn for_source(source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn reading(&self, field: Field) -> Option<&Reading> {
        match field {
            Field::TMax => self.tmax.as_ref(),
            Field::TMin => self.tmin.as_ref(),
            Field::TAvg => self.tavg.as_ref(),
            Field::Prcp => self.prcp.as_ref(),
            Field::Snow => self.snow.as_ref(),
            Field::Snwd => self.snwd.as_ref(),
            Field::Indicators => None,
        }
    }

    pub fn value(&self, field: Field) -> Option<f64> {
        self.reading(field).map(|r| r.value)
    }

    /// Mutable slot for a reading field; `None` for non-reading fields.
    pub fn reading_slot(&mut self, field: Field) -> Option<&mut Option<Reading>> {
        match field {
            Field::TMax => Some(&mut self.tmax),
            Field::TMin => Some(&mut self.tmin),
            Field::TAvg => Some(&mut self.tavg),
            Field::Prcp => Some(&mut self.prcp),
            Field::Snow => Some(&mut self.snow),
            Field::Snwd => Some(&mut self.snwd),
            Field::Indicators => None,
        }
    }

    pub fn set_reading(&mut self, field: Field, reading: Option<Reading>) {
        if let Some(slot) = self.reading_slot(field) {
            *slot = reading;
        }
    }

    pub fn with_reading(mut self, field: Field, reading: Reading) -> Self {
        self.set_reading(field, Some(reading));
        self
    }

    pub fn with_value(self, field: Field, value: f64) -> Self {
        self.with_reading(field, Reading::new(value))
    }

    pub fn with_indicators(mut self, indicators: DayIndicators) -> Self {
        self.indicators = Some(indicators);
        self
    }

    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::Indicators => self.indicators.is_some(),
            _ => self.reading(field).is_some(),
        }
    }

    /// Fields this record actually provides.
    pub fn present_fields(&self) -> Vec<Field> {
        Field::READINGS
            .into_iter()
            .chain(std::iter::once(Field::Indicators))
            .filter(|f| self.has_field(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// Source that last wrote `field`, falling back to the record tag.
    pub fn field_source(&self, field: Field) -> Option<Source> {
        self.provenance.get(&field).copied().or(self.source)
    }
}

/// A record produced by a source parser, ready for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: ObservationKey,
    pub source: Source,
    pub record: ObservationRecord,
}

impl Candidate {
    pub fn new(key: ObservationKey, record: ObservationRecord) -> Option<Self> {
        let source = record.source?;
        Some(Self {
            key,
            source,
            record,
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.key.date()
    }
}
