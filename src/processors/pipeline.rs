use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::config::{RunConfig, StationConfig};
use crate::error::Result;
use crate::feeds::{FeedRequest, FeedSource};
use crate::models::{Candidate, Source};
use crate::processors::recency::RecencyFilter;
use crate::processors::record_merger::{MergePolicy, MergeStats, RecordMerger};
use crate::readers::{
    GhcnReader, GsodReader, MnClimateReader, NormalsReader, NwsReader, SourceReader,
};
use crate::store::ObservationStore;
use crate::utils::calendar::{month_ends_spanned, years_spanned};
use crate::utils::constants::{NORMALS_TABLE, OBSERVATIONS_TABLE};
use crate::utils::progress::ProgressReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Full history: GHCN, normals and the university decade tables
    Historical,
    /// Recent window: GHCN, GSOD and NWS monthly reports, filtered by date
    Recent,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Historical => write!(f, "historical"),
            RunMode::Recent => write!(f, "recent"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub feeds_read: usize,
    pub feeds_failed: usize,
    /// Canonical table
    pub observations: MergeStats,
    /// Per-source archive tables and the normals table
    pub archives: BTreeMap<Source, MergeStats>,
}

/// Runs every feed of every configured station through its reader, the
/// recency filter (recent mode) and the merge engine, one feed at a time.
pub struct Pipeline<'a, F: FeedSource + ?Sized> {
    config: &'a RunConfig,
    feeds: &'a F,
    mode: RunMode,
}

impl<'a, F: FeedSource + ?Sized> Pipeline<'a, F> {
    pub fn new(config: &'a RunConfig, feeds: &'a F, mode: RunMode) -> Self {
        Self {
            config,
            feeds,
            mode,
        }
    }

    /// Feed requests for one station, in processing order.
    pub fn requests(&self, station: &StationConfig) -> Vec<FeedRequest> {
        let mut requests = vec![FeedRequest::Ghcn {
            ghcn_id: station.ghcn_id.clone(),
        }];

        match self.mode {
            RunMode::Historical => {
                requests.push(FeedRequest::Normals {
                    ghcn_id: station.ghcn_id.clone(),
                });
                if station.mn_climate {
                    requests.extend(
                        self.config
                            .mn_decades
                            .iter()
                            .map(|decade| FeedRequest::MnClimate { decade: *decade }),
                    );
                }
            }
            RunMode::Recent => {
                let cutoff = self.config.recent_cutoff();
                let run_date = self.config.run_date;

                requests.extend(years_spanned(cutoff, run_date).into_iter().map(|year| {
                    FeedRequest::Gsod {
                        gsod_id: station.gsod_id.clone(),
                        year,
                    }
                }));

                if let Some((wfo, sid)) = station.nws_ids() {
                    requests.extend(month_ends_spanned(cutoff, run_date).into_iter().map(
                        |month_end| FeedRequest::Nws {
                            wfo: wfo.to_string(),
                            sid: sid.to_string(),
                            month_end,
                        },
                    ));
                }
            }
        }
        requests
    }

    pub fn run<S: ObservationStore + ?Sized>(
        &self,
        store: &mut S,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for station in &self.config.stations {
            info!("Processing {} data for station {}", self.mode, station.ghcn_id);

            for request in self.requests(station) {
                if let Some(p) = progress {
                    p.set_message(&format!("Reading {}", request));
                }

                self.process_request(store, station, &request, &mut summary)?;

                if let Some(p) = progress {
                    p.increment(1);
                }
            }
        }

        info!(
            "Finished {} run: {} feeds read, {} unavailable; observations: {}",
            self.mode, summary.feeds_read, summary.feeds_failed, summary.observations
        );
        Ok(summary)
    }

    fn process_request<S: ObservationStore + ?Sized>(
        &self,
        store: &mut S,
        station: &StationConfig,
        request: &FeedRequest,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let reader = reader_for(station, request);

        let lines = match self.fetch_lines(request) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Skipping {}: {}", request, e);
                summary.feeds_failed += 1;
                return Ok(());
            }
        };
        summary.feeds_read += 1;

        let mut candidates = reader.read_lines(&lines);
        let mut filtered = 0;
        if self.mode == RunMode::Recent {
            (candidates, filtered) = RecencyFilter::from_config(self.config).apply(candidates);
        }
        info!("Parsed {} candidates from {}", candidates.len(), request);

        let source = reader.source();
        let archive_stats = self.merge_candidates(store, source, &candidates, summary)?;
        summary.observations.filtered += filtered;
        summary.archives.entry(source).or_default().absorb(&archive_stats);
        Ok(())
    }

    fn fetch_lines(&self, request: &FeedRequest) -> Result<Vec<String>> {
        match request {
            FeedRequest::MnClimate { .. } | FeedRequest::Nws { .. } => Ok(self
                .feeds
                .text_block(request)?
                .lines()
                .map(String::from)
                .collect()),
            _ => self.feeds.lines(request),
        }
    }

    /// Every candidate goes to its archive table; observations (not
    /// normals) also go to the canonical table under precedence.
    fn merge_candidates<S: ObservationStore + ?Sized>(
        &self,
        store: &mut S,
        source: Source,
        candidates: &[Candidate],
        summary: &mut RunSummary,
    ) -> Result<MergeStats> {
        let mut archive = RecordMerger::with_policy(MergePolicy::Overlay);
        let mut canonical = RecordMerger::new();

        let archive_table = match source {
            Source::Normals => NORMALS_TABLE,
            _ => source.as_str(),
        };

        for candidate in candidates {
            archive.merge(store, archive_table, candidate)?;
            if source != Source::Normals {
                canonical.merge(store, OBSERVATIONS_TABLE, candidate)?;
            }
        }

        summary.observations.absorb(&canonical.take_stats());
        Ok(archive.take_stats())
    }
}

fn reader_for(station: &StationConfig, request: &FeedRequest) -> Box<dyn SourceReader> {
    let station_id = station.ghcn_id.clone();
    match request {
        FeedRequest::Ghcn { .. } => Box::new(GhcnReader::new()),
        FeedRequest::Normals { .. } => Box::new(NormalsReader::new(station_id)),
        FeedRequest::Gsod { .. } => Box::new(GsodReader::new(station_id)),
        FeedRequest::MnClimate { .. } => Box::new(MnClimateReader::new(station_id)),
        FeedRequest::Nws { month_end, .. } => Box::new(NwsReader::for_month(station_id, *month_end)),
    }
}
