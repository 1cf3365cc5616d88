pub mod flags;
pub mod observation;
pub mod source;

pub use flags::{FlagKind, FlagSet};
pub use observation::{Candidate, DayIndicators, Field, ObservationKey, ObservationRecord, Reading};
pub use source::Source;
