use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use station_obs_merger::models::{Candidate, Field, ObservationKey, ObservationRecord, Source};
use station_obs_merger::processors::RecordMerger;
use station_obs_merger::readers::{GhcnReader, SourceReader};
use station_obs_merger::store::MemoryStore;
use station_obs_merger::utils::constants::OBSERVATIONS_TABLE;

// One GHCN line per element and month, 31 days each
fn create_ghcn_lines(years: i32) -> Vec<String> {
    let mut lines = Vec::new();
    for year in 2000..2000 + years {
        for month in 1..=12 {
            for element in ["TMAX", "TMIN", "PRCP"] {
                let mut line = format!("USW00014922{}{:02}{}", year, month, element);
                for day in 0..31 {
                    line.push_str(&format!("{:>5}  7", 100 + day));
                }
                lines.push(line);
            }
        }
    }
    lines
}

// GSOD-shaped candidates overlapping every GHCN day
fn create_gsod_candidates(years: i32) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for year in 2000..2000 + years {
        for month in 1..=12 {
            for day in 1..=28 {
                let record = ObservationRecord::for_source(Source::Gsod)
                    .with_value(Field::TMax, 58.1)
                    .with_value(Field::TAvg, 50.0)
                    .with_value(Field::Snwd, 2.0);
                candidates.extend(Candidate::new(
                    ObservationKey::new("USW00014922", year, month, day),
                    record,
                ));
            }
        }
    }
    candidates
}

fn benchmark_ghcn_reader(c: &mut Criterion) {
    let lines = create_ghcn_lines(5);
    let reader = GhcnReader::new();

    c.bench_function("ghcn_read_lines", |b| {
        b.iter(|| black_box(reader.read_lines(&lines).len()))
    });
}

fn benchmark_merge_by_years(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_by_years");

    for &years in &[1, 5, 20] {
        let ghcn = GhcnReader::new().read_lines(&create_ghcn_lines(years));
        let gsod = create_gsod_candidates(years);

        group.bench_with_input(BenchmarkId::new("ghcn_then_gsod", years), &years, |b, _| {
            b.iter(|| {
                let mut store = MemoryStore::new();
                let mut merger = RecordMerger::new();
                merger
                    .merge_all(&mut store, OBSERVATIONS_TABLE, &ghcn)
                    .and_then(|_| merger.merge_all(&mut store, OBSERVATIONS_TABLE, &gsod))
                    .ok();
                black_box(merger.take_stats())
            })
        });
    }

    group.finish();
}

fn benchmark_remerge_unchanged(c: &mut Criterion) {
    let ghcn = GhcnReader::new().read_lines(&create_ghcn_lines(5));
    let mut store = MemoryStore::new();
    RecordMerger::new()
        .merge_all(&mut store, OBSERVATIONS_TABLE, &ghcn)
        .ok();

    c.bench_function("remerge_unchanged", |b| {
        b.iter(|| {
            let mut merger = RecordMerger::new();
            merger
                .merge_all(&mut store, OBSERVATIONS_TABLE, &ghcn)
                .ok();
            black_box(merger.stats().unchanged)
        })
    });
}

criterion_group!(
    benches,
    benchmark_ghcn_reader,
    benchmark_merge_by_years,
    benchmark_remerge_unchanged
);
criterion_main!(benches);
