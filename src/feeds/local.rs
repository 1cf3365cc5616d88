use encoding_rs::WINDOWS_1252;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{FeedRequest, FeedSource};
use crate::error::{ProcessingError, Result};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

/// Feed files previously retrieved into a directory tree.
///
/// Files ending in `.gz` are decompressed. A plain file is also accepted
/// where a `.gz` name is expected, and the reverse.
#[derive(Debug, Clone)]
pub struct LocalFeedDirectory {
    root: PathBuf,
}

impl LocalFeedDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing file for `request`, if any.
    pub fn resolve(&self, request: &FeedRequest) -> Option<PathBuf> {
        let path = self.root.join(request.relative_path());
        let alternate = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => path.with_extension(""),
            _ => {
                let mut name = path.clone().into_os_string();
                name.push(".gz");
                PathBuf::from(name)
            }
        };

        [path, alternate].into_iter().find(|p| p.is_file())
    }
}

/// UTF-8 when valid, Windows-1252 otherwise (older NCDC and NWS pages).
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

fn read_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();

    if path.extension().is_some_and(|e| e == "gz") {
        GzDecoder::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)).read_to_end(&mut bytes)?;
    } else {
        BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file).read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

impl FeedSource for LocalFeedDirectory {
    fn fetch(&self, request: &FeedRequest) -> Result<String> {
        let path = self.resolve(request).ok_or_else(|| {
            ProcessingError::feed_unavailable(
                request.source().as_str(),
                self.root.join(request.relative_path()).display().to_string(),
                "file not found",
            )
        })?;

        debug!("Reading {} from {}", request, path.display());
        let bytes = read_bytes(&path).map_err(|e| {
            ProcessingError::feed_unavailable(request.source().as_str(), path.display().to_string(), e)
        })?;

        Ok(decode_text(&bytes))
    }
}
