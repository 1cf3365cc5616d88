use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::parquet_writer::{flags_json, frshtt_code};
use crate::error::Result;
use crate::models::Field;
use crate::store::StoredRow;

/// Flat CSV row of the canonical table; empty cells are absent values.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    station_id: &'a str,
    date: String,
    source: Option<&'a str>,
    tmax: Option<f64>,
    tmin: Option<f64>,
    tavg: Option<f64>,
    prcp: Option<f64>,
    snow: Option<f64>,
    snwd: Option<f64>,
    flags: Option<String>,
    frshtt: Option<String>,
}

impl<'a> CsvRow<'a> {
    fn from_row(row: &'a StoredRow) -> Result<Self> {
        let record = &row.record;
        Ok(Self {
            station_id: &row.key.station_id,
            date: format!("{:04}-{:02}-{:02}", row.key.year, row.key.month, row.key.day),
            source: record.source.map(|s| s.as_str()),
            tmax: record.value(Field::TMax),
            tmin: record.value(Field::TMin),
            tavg: record.value(Field::TAvg),
            prcp: record.value(Field::Prcp),
            snow: record.value(Field::Snow),
            snwd: record.value(Field::Snwd),
            flags: flags_json(record)?,
            frshtt: frshtt_code(record),
        })
    }
}

#[derive(Debug, Default)]
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_rows(&self, rows: &[StoredRow], path: &Path) -> Result<()> {
        self.write_to(rows, File::create(path)?)
    }

    pub fn write_to<W: Write>(&self, rows: &[StoredRow], writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in rows {
            writer.serialize(CsvRow::from_row(row)?)?;
        }
        writer.flush()?;
        Ok(())
    }
}
