use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use station_obs_merger::config::{RunConfig, StationConfig};
use station_obs_merger::error::{ProcessingError, Result};
use station_obs_merger::feeds::LocalFeedDirectory;
use station_obs_merger::models::{Field, ObservationKey, ObservationRecord, Source};
use station_obs_merger::processors::{MergeOutcome, Pipeline, RecordMerger, RunMode};
use station_obs_merger::readers::{GsodReader, NormalsReader, NwsReader, SourceReader};
use station_obs_merger::store::{JsonFileStore, MemoryStore, ObservationStore, StoredRow};
use station_obs_merger::utils::constants::{NORMALS_TABLE, OBSERVATIONS_TABLE};
use station_obs_merger::writers::{CsvWriter, ParquetWriter};

const STATION: &str = "USW00014922";

const GSOD_LINE: &str = "726580 14922  20140601    62.4 24    48.2 24  1013.0 24   984.3 24   10.0 24    8.1 24   15.0   22.9    58.1*   50.0   0.20G 999.9  010010";

fn station() -> StationConfig {
    StationConfig {
        ghcn_id: STATION.to_string(),
        gsod_id: "726580-14922".to_string(),
        wfo: Some("MPX".to_string()),
        nws_sid: Some("MSP".to_string()),
        mn_climate: false,
    }
}

fn config(dir: &Path, run_date: NaiveDate) -> RunConfig {
    RunConfig::default()
        .with_run_date(run_date)
        .with_data_dir(dir.join("feeds"))
        .with_store_path(dir.join("store/observations.json"))
        .with_stations(vec![station()])
}

fn write_feed(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn write_gzip_feed(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn cf6_row(day: &str, tmax: &str, tmin: &str, tavg: &str, prcp: &str) -> String {
    let mut row = vec![' '; 41];
    for (start, text) in [(0, day), (2, tmax), (6, tmin), (10, tavg), (26, prcp)] {
        for (i, c) in text.chars().enumerate() {
            row[start + i] = c;
        }
    }
    row.into_iter().collect()
}

fn cf6_report(rows: &[String]) -> String {
    let marker = "=".repeat(80);
    let mut lines = vec![
        "PRELIMINARY LOCAL CLIMATOLOGICAL DATA (WS FORM: F-6)".to_string(),
        marker.clone(),
        "DY MAX MIN AVG DEP HDD CDD  WTR  SNW DPTH".to_string(),
        marker.clone(),
    ];
    lines.extend(rows.iter().cloned());
    lines.push(marker);
    lines.push("SM 2345 1234".to_string());
    lines.join("\n")
}

fn normals_month(marker: &str, month: u32, segments: &[&str]) -> String {
    let mut line = format!("{:<20}", format!("{} {:02}", marker, month));
    for segment in segments {
        line.push_str(&format!("{:<7}", segment));
    }
    line
}

fn normals_section(marker: &str, january: &[&str]) -> Vec<String> {
    let mut lines = vec![normals_month(marker, 1, january)];
    for month in 2..=12 {
        lines.push(normals_month(marker, month, &["  100C "]));
    }
    lines
}

/// GHCN and GSOD for June 1st 2014, the June CF6 report for the 2nd and 3rd.
fn seed_recent_feeds(root: &Path) {
    write_feed(root, "ghcn/USW00014922.dly", "USW00014922201406TMAX  211  7");
    write_gzip_feed(root, "gsod/2014/726580-14922-2014.op.gz", GSOD_LINE);
    let report = cf6_report(&[
        cf6_row(" 2", "  75", "  55", "  65", "    T"),
        cf6_row(" 3", "  72", "  52", "  62", "    M"),
    ]);
    write_feed(root, "nws/mpx-msp-2014-06.cf6.txt", &report);
}

fn key(year: i32, month: u32, day: u32) -> ObservationKey {
    ObservationKey::new(STATION, year, month, day)
}

#[test]
fn test_gsod_line_to_canonical_row() -> Result<()> {
    let reader = GsodReader::new(STATION);
    let candidates = reader.read_lines(&[GSOD_LINE.to_string()]);
    assert_eq!(candidates.len(), 1);

    let candidate = &candidates[0];
    assert_eq!(candidate.key, key(2014, 6, 1));
    assert_eq!(candidate.source, Source::Gsod);
    assert_eq!(candidate.record.value(Field::TMax), Some(58.1));
    assert_eq!(candidate.record.value(Field::Prcp), Some(0.2));
    assert_eq!(candidate.record.value(Field::Snwd), None);

    let mut store = MemoryStore::new();
    let mut merger = RecordMerger::new();
    assert_eq!(
        merger.merge(&mut store, OBSERVATIONS_TABLE, candidate)?,
        MergeOutcome::Inserted
    );
    assert_eq!(
        merger.merge(&mut store, OBSERVATIONS_TABLE, candidate)?,
        MergeOutcome::Unchanged
    );
    assert_eq!(store.len(OBSERVATIONS_TABLE), 1);
    Ok(())
}

#[test]
fn test_recent_run_merges_all_sources() -> Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
    seed_recent_feeds(&config.data_dir);

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = JsonFileStore::open(&config.store_path)?;
    let summary = Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut store, None)?;

    // May CF6 report is absent
    assert_eq!(summary.feeds_read, 3);
    assert_eq!(summary.feeds_failed, 1);
    assert!(summary.observations.protected_fields >= 1);

    let day1 = store.store().get(OBSERVATIONS_TABLE, &key(2014, 6, 1)).unwrap();
    assert_eq!(day1.value(Field::TMax), Some(69.98));
    assert_eq!(day1.field_source(Field::TMax), Some(Source::Ghcn));
    assert_eq!(day1.value(Field::Prcp), Some(0.2));
    assert_eq!(day1.field_source(Field::Prcp), Some(Source::Gsod));
    assert_eq!(day1.value(Field::TMin), Some(50.0));
    assert_eq!(day1.source, Some(Source::Ghcn));
    assert!(day1.indicators.unwrap().rain);

    let day2 = store.store().get(OBSERVATIONS_TABLE, &key(2014, 6, 2)).unwrap();
    assert_eq!(day2.value(Field::TMax), Some(75.0));
    assert_eq!(day2.value(Field::Prcp), Some(0.001));
    assert_eq!(day2.source, Some(Source::Nws));

    // Archive tables keep each source's own view
    let gsod_day1 = store.store().get("gsod", &key(2014, 6, 1)).unwrap();
    assert_eq!(gsod_day1.value(Field::TMax), Some(58.1));
    let nws_day3 = store.store().get("nws", &key(2014, 6, 3)).unwrap();
    assert_eq!(nws_day3.value(Field::TMax), Some(72.0));
    assert_eq!(nws_day3.value(Field::Prcp), None);

    store.save()?;
    Ok(())
}

#[test]
fn test_second_run_changes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
    seed_recent_feeds(&config.data_dir);
    let feeds = LocalFeedDirectory::new(&config.data_dir);

    let mut store = JsonFileStore::open(&config.store_path)?;
    Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut store, None)?;
    store.save()?;
    let first = store.store().clone();

    let mut reopened = JsonFileStore::open(&config.store_path)?;
    assert_eq!(reopened.store(), &first);

    let summary = Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut reopened, None)?;
    assert_eq!(summary.observations.inserted, 0);
    assert_eq!(summary.observations.updated, 0);
    assert!(summary.observations.unchanged > 0);
    assert!(!reopened.is_dirty());
    assert_eq!(reopened.store(), &first);
    Ok(())
}

#[test]
fn test_recent_window_excludes_old_days() -> Result<()> {
    let dir = TempDir::new()?;
    // Cutoff is 2014-06-02, so June 1st from GHCN and GSOD is dropped
    let config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 12).unwrap())
        .with_recent_window_days(10);
    seed_recent_feeds(&config.data_dir);

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = MemoryStore::new();
    let summary = Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut store, None)?;

    assert_eq!(summary.feeds_failed, 0);
    assert_eq!(summary.observations.filtered, 2);
    assert!(store.get(OBSERVATIONS_TABLE, &key(2014, 6, 1)).is_none());
    assert!(store.get(OBSERVATIONS_TABLE, &key(2014, 6, 2)).is_some());
    Ok(())
}

#[test]
fn test_historical_run_reads_normals_and_decade_tables() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
    config.stations[0].mn_climate = true;
    config.mn_decades = vec![2000];

    let mut normals = vec!["STATION: USW00014922".to_string()];
    normals.extend(normals_section("dly-tmax-normal", &["  223C ", "  225C "]));
    normals.extend(normals_section("mtd-prcp-normal", &["    3C ", "    5C ", "    5C "]));
    write_feed(
        &config.data_dir,
        "normals/USW00014922.normals.txt",
        &normals.join("\n"),
    );
    write_feed(
        &config.data_dir,
        "mn_climate/msp2000s.txt",
        "Year\tMonth\tDay\tMax\tMin\tPcpn\tSnow\tDepth\n2005\t1\t15\t20\t5\tT\t1.5\t12\n",
    );

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = MemoryStore::new();
    let summary = Pipeline::new(&config, &feeds, RunMode::Historical).run(&mut store, None)?;

    // GHCN history is absent
    assert_eq!(summary.feeds_failed, 1);
    assert_eq!(summary.feeds_read, 2);

    let jan1 = store.get(NORMALS_TABLE, &key(2000, 1, 1)).unwrap();
    assert_eq!(jan1.value(Field::TMax), Some(22.3));
    assert_eq!(jan1.value(Field::Prcp), Some(0.03));
    assert_eq!(
        store.get(NORMALS_TABLE, &key(2000, 1, 2)).unwrap().value(Field::Prcp),
        Some(0.02)
    );
    assert_eq!(
        store.get(NORMALS_TABLE, &key(2000, 1, 3)).unwrap().value(Field::Prcp),
        Some(0.0)
    );

    // Normals never reach the canonical table
    assert!(store.get(OBSERVATIONS_TABLE, &key(2000, 1, 1)).is_none());

    let mn = store.get(OBSERVATIONS_TABLE, &key(2005, 1, 15)).unwrap();
    assert_eq!(mn.value(Field::TMax), Some(20.0));
    assert_eq!(mn.value(Field::Prcp), Some(0.001));
    assert_eq!(mn.value(Field::Snow), Some(1.5));
    assert_eq!(mn.value(Field::Snwd), Some(12.0));
    assert_eq!(mn.source, Some(Source::MnClimate));
    Ok(())
}

#[test]
fn test_missing_normals_section_yields_nothing() {
    let reader = NormalsReader::new(STATION);
    let lines = vec!["no sections here".to_string()];
    assert!(reader.read_lines(&lines).is_empty());
}

#[test]
fn test_cf6_rows_outside_data_section_are_ignored() {
    let report = cf6_report(&[cf6_row(" 1", "  70", "  50", "  60", "  0.00")]);
    let mut lines: Vec<String> = report.lines().map(String::from).collect();
    // A day-like row in the summary block after the closing marker
    lines.push(cf6_row(" 9", "  99", "  99", "  99", "  9.99"));

    let reader = NwsReader::new(STATION, 2014, 6);
    let candidates = reader.read_lines(&lines);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].key, key(2014, 6, 1));
}

struct UnavailableStore {
    inner: MemoryStore,
    failing_day: u32,
}

impl ObservationStore for UnavailableStore {
    fn lookup(&self, table: &str, key: &ObservationKey) -> Result<Option<ObservationRecord>> {
        if key.day == self.failing_day {
            return Err(ProcessingError::StoreUnavailable("lock timeout".to_string()));
        }
        self.inner.lookup(table, key)
    }

    fn upsert(&mut self, table: &str, key: ObservationKey, record: ObservationRecord) -> Result<()> {
        self.inner.upsert(table, key, record)
    }
}

#[test]
fn test_transient_store_failure_abandons_only_that_key() -> Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
    seed_recent_feeds(&config.data_dir);

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = UnavailableStore {
        inner: MemoryStore::new(),
        failing_day: 1,
    };
    let summary = Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut store, None)?;

    // ghcn and gsod each offer June 1st
    assert_eq!(summary.observations.abandoned, 2);
    assert!(store.inner.get(OBSERVATIONS_TABLE, &key(2014, 6, 1)).is_none());
    assert!(store.inner.get(OBSERVATIONS_TABLE, &key(2014, 6, 2)).is_some());
    Ok(())
}

#[test]
fn test_export_canonical_table() -> Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path(), NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
    seed_recent_feeds(&config.data_dir);

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = MemoryStore::new();
    Pipeline::new(&config, &feeds, RunMode::Recent).run(&mut store, None)?;

    let rows: Vec<StoredRow> = store
        .records(OBSERVATIONS_TABLE)
        .map(|(key, record)| StoredRow {
            key: key.clone(),
            record: record.clone(),
        })
        .collect();
    assert_eq!(rows.len(), 3);

    let parquet_path = dir.path().join("observations.parquet");
    let writer = ParquetWriter::new();
    writer.write_rows(&rows, &parquet_path)?;
    let info = writer.get_file_info(&parquet_path)?;
    assert_eq!(info.total_rows, 3);

    let sample = writer.read_sample_rows(&parquet_path, 2)?;
    assert_eq!(sample.len(), 2);
    assert_eq!(sample[0].key, rows[0].key);
    assert_eq!(sample[0].record.value(Field::TMax), Some(69.98));
    assert_eq!(sample[1].record.source, Some(Source::Nws));

    let csv_path = dir.path().join("observations.csv");
    CsvWriter::new().write_rows(&rows, &csv_path)?;
    let csv = fs::read_to_string(csv_path)?;
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("USW00014922,2014-06-02,nws,75.0,55.0,65.0,0.001"));
    Ok(())
}
