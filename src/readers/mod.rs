pub mod field_decoder;
pub mod ghcn_reader;
pub mod gsod_reader;
pub mod mn_climate_reader;
pub mod normals_reader;
pub mod nws_reader;

pub use field_decoder::{DaySegment, DaySegments, DecodedLine, FieldSpec, LineLayout};
pub use ghcn_reader::GhcnReader;
pub use gsod_reader::GsodReader;
pub use mn_climate_reader::MnClimateReader;
pub use normals_reader::NormalsReader;
pub use nws_reader::{Cf6Section, NwsReader};

use crate::models::{Candidate, Source};

/// Turns the raw lines of one retrieved feed file into merge candidates.
pub trait SourceReader {
    fn source(&self) -> Source;

    fn read_lines(&self, lines: &[String]) -> Vec<Candidate>;
}

/// Build a fixed-width line by placing each text at its byte offset.
#[cfg(test)]
pub(crate) fn fixed_width(width: usize, fields: &[(usize, &str)]) -> String {
    let mut buf = vec![b' '; width];
    for (start, text) in fields {
        let end = start + text.len();
        if buf.len() < end {
            buf.resize(end, b' ');
        }
        buf[*start..end].copy_from_slice(text.as_bytes());
    }
    String::from_utf8(buf).unwrap()
}
