pub mod pipeline;
pub mod recency;
pub mod record_merger;

pub use pipeline::{Pipeline, RunMode, RunSummary};
pub use recency::RecencyFilter;
pub use record_merger::{overlay, MergeOutcome, MergePolicy, MergeStats, Overlay, RecordMerger};
