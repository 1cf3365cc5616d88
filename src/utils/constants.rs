/// Table names
pub const OBSERVATIONS_TABLE: &str = "observations";
pub const NORMALS_TABLE: &str = "normals";

/// Day segments per monthly line
pub const DAYS_PER_LINE: usize = 31;

/// GHCN-Daily `.dly` layout
pub const GHCN_DAY_OFFSET: usize = 21;
pub const GHCN_DAY_STRIDE: usize = 8;
pub const GHCN_VALUE_WIDTH: usize = 5;
pub const GHCN_MISSING: f64 = -9999.0;

/// NOAA 1981-2010 station normals layout
pub const NORMALS_DAY_OFFSET: usize = 20;
pub const NORMALS_DAY_STRIDE: usize = 7;
pub const NORMALS_VALUE_WIDTH: usize = 5;
pub const NORMALS_MONTHS: usize = 12;
pub const NORMALS_MISSING: [f64; 4] = [-9999.0, -8888.0, -6666.0, -5555.0];
pub const NORMALS_ROUNDS_TO_ZERO: f64 = -7777.0;
/// Leap year used to key day-of-year normals so 29 February has a row.
pub const NORMALS_REFERENCE_YEAR: i32 = 2000;

/// GSOD missing-value sentinels
pub const GSOD_TEMP_MISSING: f64 = 9999.9;
pub const GSOD_PRCP_MISSING: f64 = 99.99;
pub const GSOD_SNWD_MISSING: f64 = 999.9;

/// Generic sentinel used when a feed documents none
pub const DEFAULT_MISSING: f64 = 999999.0;

/// Non-zero but unmeasurable amount
pub const TRACE_AMOUNT: f64 = 0.001;

/// NWS CF6 section delimiter
pub const CF6_SECTION_MARKER: &str = "=============================";

/// University of Minnesota decade tables
pub const MN_FIRST_DECADE: i32 = 1870;
pub const MN_LAST_DECADE: i32 = 2000;

/// Unit conversion
pub const MM_PER_INCH: f64 = 25.4;

/// Processing defaults
pub const DEFAULT_RECENT_WINDOW_DAYS: i64 = 30;
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
