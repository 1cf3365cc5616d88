use crate::error::{ProcessingError, Result};
use crate::models::{Field, ObservationKey, ObservationRecord, Source};
use crate::store::StoredRow;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const READING_COLUMNS: [(&str, Field); 6] = [
    ("tmax", Field::TMax),
    ("tmin", Field::TMin),
    ("tavg", Field::TAvg),
    ("prcp", Field::Prcp),
    ("snow", Field::Snow),
    ("snwd", Field::Snwd),
];

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write table rows to a Parquet file, one row group per `row_group_size` rows
    pub fn write_rows(&self, rows: &[StoredRow], path: &Path) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let schema = self.create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in rows.chunks(self.row_group_size.max(1)) {
            let batch = self.rows_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    /// Arrow schema of the canonical table; every measurement is nullable
    fn create_schema(&self) -> Arc<Schema> {
        let mut fields = vec![
            ArrowField::new("station_id", DataType::Utf8, false),
            ArrowField::new("date", DataType::Date32, false),
            ArrowField::new("source", DataType::Utf8, true),
        ];
        for (name, _) in READING_COLUMNS {
            fields.push(ArrowField::new(name, DataType::Float64, true));
        }
        fields.push(ArrowField::new("flags", DataType::Utf8, true));
        fields.push(ArrowField::new("frshtt", DataType::Utf8, true));

        Arc::new(Schema::new(fields))
    }

    fn rows_to_batch(&self, rows: &[StoredRow], schema: Arc<Schema>) -> Result<RecordBatch> {
        let station_ids: Vec<&str> = rows.iter().map(|r| r.key.station_id.as_str()).collect();
        let dates = rows
            .iter()
            .map(|r| date_to_days(&r.key))
            .collect::<Result<Vec<i32>>>()?;
        let sources: Vec<Option<&str>> = rows
            .iter()
            .map(|r| r.record.source.map(|s| s.as_str()))
            .collect();
        let flags = rows
            .iter()
            .map(|r| flags_json(&r.record))
            .collect::<Result<Vec<Option<String>>>>()?;
        let frshtt: Vec<Option<String>> = rows.iter().map(|r| frshtt_code(&r.record)).collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(station_ids)),
            Arc::new(Date32Array::from(dates)),
            Arc::new(StringArray::from(sources)),
        ];
        for (_, field) in READING_COLUMNS {
            let values: Vec<Option<f64>> = rows.iter().map(|r| r.record.value(field)).collect();
            columns.push(Arc::new(Float64Array::from(values)));
        }
        columns.push(Arc::new(StringArray::from(flags)));
        columns.push(Arc::new(StringArray::from(frshtt)));

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Read back up to `limit` rows (values only; flags are not restored)
    pub fn read_sample_rows(&self, path: &Path, limit: usize) -> Result<Vec<StoredRow>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut rows = Vec::new();
        for batch_result in parquet_reader {
            let batch = batch_result?;

            let station_ids = string_column(&batch, "station_id")?;
            let dates = batch
                .column_by_name("date")
                .and_then(|c| c.as_any().downcast_ref::<Date32Array>())
                .ok_or_else(|| invalid_column("date"))?;
            let sources = string_column(&batch, "source")?;
            let readings = READING_COLUMNS
                .iter()
                .map(|(name, field)| {
                    batch
                        .column_by_name(name)
                        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                        .map(|array| (*field, array))
                        .ok_or_else(|| invalid_column(name))
                })
                .collect::<Result<Vec<_>>>()?;

            for i in 0..batch.num_rows() {
                if rows.len() >= limit {
                    return Ok(rows);
                }

                let date = days_to_date(dates.value(i))?;
                let key = ObservationKey::from_date(station_ids.value(i), date);

                let mut record = ObservationRecord {
                    source: (!sources.is_null(i)).then(|| Source::parse(sources.value(i))).flatten(),
                    ..ObservationRecord::default()
                };
                for (field, array) in &readings {
                    if !array.is_null(i) {
                        record = record.with_value(*field, array.value(i));
                    }
                }

                rows.push(StoredRow { key, record });
            }
        }

        Ok(rows)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

/// Days from 0001-01-01 (CE) to 1970-01-01, the Date32 origin.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_days(key: &ObservationKey) -> Result<i32> {
    let date = key
        .date()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid date for {}", key)))?;
    Ok(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
        .ok_or_else(|| ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string()))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| invalid_column(name))
}

fn invalid_column(name: &str) -> ProcessingError {
    ProcessingError::InvalidFormat(format!("Invalid {} column type", name))
}

/// `{"tmax":{"q":"I"}}` style object of the per-field flags; `None` if no field has any.
pub(crate) fn flags_json(record: &ObservationRecord) -> Result<Option<String>> {
    let flags: BTreeMap<&str, _> = READING_COLUMNS
        .iter()
        .filter_map(|(name, field)| {
            record
                .reading(*field)
                .and_then(|r| r.flags.as_ref())
                .map(|f| (*name, f))
        })
        .collect();

    if flags.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(&flags)?))
}

/// GSOD-style FRSHTT digit string.
pub(crate) fn frshtt_code(record: &ObservationRecord) -> Option<String> {
    record.indicators.map(|i| {
        [i.fog, i.rain, i.snow, i.hail, i.thunder, i.tornado]
            .iter()
            .map(|set| if *set { '1' } else { '0' })
            .collect()
    })
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            self.total_rows as f64 / self.row_groups.max(1) as f64
        )
    }
}
