pub mod calendar;
pub mod constants;
pub mod filename;
pub mod progress;
pub mod units;

pub use constants::*;
pub use filename::generate_default_export_filename;
pub use progress::ProgressReporter;
