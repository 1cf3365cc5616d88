pub mod local;

pub use local::LocalFeedDirectory;

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::Source;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedRequest {
    /// Full period-of-record `.dly` file
    Ghcn { ghcn_id: String },
    /// 1981-2010 station normals product
    Normals { ghcn_id: String },
    /// One year of daily summaries, gzip-compressed upstream
    Gsod { gsod_id: String, year: i32 },
    /// Text block of one decade table
    MnClimate { decade: i32 },
    /// Text block of one monthly CF6 report
    Nws {
        wfo: String,
        sid: String,
        month_end: NaiveDate,
    },
}

impl FeedRequest {
    pub fn source(&self) -> Source {
        match self {
            FeedRequest::Ghcn { .. } => Source::Ghcn,
            FeedRequest::Normals { .. } => Source::Normals,
            FeedRequest::Gsod { .. } => Source::Gsod,
            FeedRequest::MnClimate { .. } => Source::MnClimate,
            FeedRequest::Nws { .. } => Source::Nws,
        }
    }

    /// Path of the retrieved file relative to the feed directory.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            FeedRequest::Ghcn { ghcn_id } => PathBuf::from("ghcn").join(format!("{}.dly", ghcn_id)),
            FeedRequest::Normals { ghcn_id } => {
                PathBuf::from("normals").join(format!("{}.normals.txt", ghcn_id))
            }
            FeedRequest::Gsod { gsod_id, year } => PathBuf::from("gsod")
                .join(year.to_string())
                .join(format!("{}-{}.op.gz", gsod_id, year)),
            FeedRequest::MnClimate { decade } => {
                PathBuf::from("mn_climate").join(format!("msp{}s.txt", decade))
            }
            FeedRequest::Nws {
                wfo,
                sid,
                month_end,
            } => PathBuf::from("nws").join(format!(
                "{}-{}-{:04}-{:02}.cf6.txt",
                wfo.to_lowercase(),
                sid.to_lowercase(),
                month_end.year(),
                month_end.month()
            )),
        }
    }
}

impl fmt::Display for FeedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedRequest::Ghcn { ghcn_id } => write!(f, "ghcn {}", ghcn_id),
            FeedRequest::Normals { ghcn_id } => write!(f, "normals {}", ghcn_id),
            FeedRequest::Gsod { gsod_id, year } => write!(f, "gsod {} {}", gsod_id, year),
            FeedRequest::MnClimate { decade } => write!(f, "mn_climate {}s", decade),
            FeedRequest::Nws {
                wfo,
                sid,
                month_end,
            } => write!(f, "nws {}/{} {}", wfo, sid, month_end.format("%Y-%m")),
        }
    }
}

/// Hands back already retrieved feed text. Fetching and scraping happen
/// outside this crate.
pub trait FeedSource {
    /// Whole decoded text of the requested feed.
    fn fetch(&self, request: &FeedRequest) -> Result<String>;

    fn lines(&self, request: &FeedRequest) -> Result<Vec<String>> {
        Ok(self.fetch(request)?.lines().map(String::from).collect())
    }

    /// Designated text block of a scraped page.
    fn text_block(&self, request: &FeedRequest) -> Result<String> {
        self.fetch(request)
    }
}
