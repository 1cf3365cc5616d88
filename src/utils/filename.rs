use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;

/// Default export path: `output/observations-{YYMMDD}.{extension}`
pub fn generate_default_export_filename(run_date: NaiveDate, extension: &str) -> PathBuf {
    let year = run_date.year() % 100; // Get last 2 digits of year
    let filename = format!(
        "observations-{:02}{:02}{:02}.{}",
        year,
        run_date.month(),
        run_date.day(),
        extension
    );
    PathBuf::from("output").join(filename)
}
