use chrono::Local;
use tracing::{debug, info};
use validator::Validate;

use crate::cli::args::{Cli, Commands, ExportFormat, RunArgs};
use crate::config::RunConfig;
use crate::error::Result;
use crate::feeds::LocalFeedDirectory;
use crate::processors::{Pipeline, RunMode, RunSummary};
use crate::store::{JsonFileStore, StoredRow};
use crate::utils::filename::generate_default_export_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};

pub fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli);

    match &cli.command {
        Commands::Historical { run } => {
            let config = load_config(&cli, run, None)?;
            run_merge(&config, RunMode::Historical, cli.quiet)?;
        }

        Commands::Recent { run, window_days } => {
            let config = load_config(&cli, run, *window_days)?;
            println!(
                "Keeping observations on or after {}",
                config.recent_cutoff()
            );
            run_merge(&config, RunMode::Recent, cli.quiet)?;
        }

        Commands::Export {
            store,
            output_file,
            format,
            compression,
            row_group_size,
            table,
        } => {
            let config = RunConfig::load(cli.config.as_deref())?;
            let store_path = store.clone().unwrap_or(config.store_path);
            let store = JsonFileStore::open(&store_path)?;

            let rows: Vec<StoredRow> = store
                .store()
                .records(table)
                .map(|(key, record)| StoredRow {
                    key: key.clone(),
                    record: record.clone(),
                })
                .collect();

            if rows.is_empty() {
                println!("No rows in table '{}' of {}", table, store_path.display());
                println!("Tables: {}", store.store().table_names().join(", "));
                return Ok(());
            }

            let output_file = output_file.clone().unwrap_or_else(|| {
                generate_default_export_filename(Local::now().date_naive(), format.extension())
            });

            if let Some(parent) = output_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            println!(
                "Writing {} rows from '{}' to {}",
                rows.len(),
                table,
                output_file.display()
            );

            match format {
                ExportFormat::Parquet => {
                    let writer = ParquetWriter::new()
                        .with_compression(compression)?
                        .with_row_group_size(*row_group_size);
                    writer.write_rows(&rows, &output_file)?;

                    let file_info = writer.get_file_info(&output_file)?;
                    println!("\n{}", file_info.summary());
                }
                ExportFormat::Csv => {
                    CsvWriter::new().write_rows(&rows, &output_file)?;
                }
            }

            println!("Export complete!");
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if *sample > 0 {
                println!("\nSample Rows (showing up to {}):", sample);
                for (i, row) in writer.read_sample_rows(file, *sample)?.iter().enumerate() {
                    let values: Vec<String> = row
                        .record
                        .present_fields()
                        .into_iter()
                        .filter_map(|field| {
                            row.record
                                .value(field)
                                .map(|v| format!("{}={}", field.name(), v))
                        })
                        .collect();
                    println!(
                        "{}. {} {:04}-{:02}-{:02} [{}] {}",
                        i + 1,
                        row.key.station_id,
                        row.key.year,
                        row.key.month,
                        row.key.day,
                        row.record.source.map(|s| s.as_str()).unwrap_or("-"),
                        values.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("station_obs_merger={}", cli.get_log_level()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(cli: &Cli, args: &RunArgs, window_days: Option<i64>) -> Result<RunConfig> {
    let mut config = RunConfig::load(cli.config.as_deref())?;

    if let Some(run_date) = args.run_date {
        config = config.with_run_date(run_date);
    }
    if let Some(data_dir) = &args.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(store) = &args.store {
        config = config.with_store_path(store);
    }
    if let Some(days) = window_days {
        config = config.with_recent_window_days(days);
    }
    if let Some(id) = &args.station {
        let station = config.station(id)?.clone();
        config = config.with_stations(vec![station]);
    }

    config.validate()?;
    debug!("Run configuration: {:?}", config);
    Ok(config)
}

fn run_merge(config: &RunConfig, mode: RunMode, quiet: bool) -> Result<RunSummary> {
    println!("Running {} merge for {} station(s)", mode, config.stations.len());
    println!("Feed directory: {}", config.data_dir.display());
    println!("Store: {}", config.store_path.display());

    let feeds = LocalFeedDirectory::new(&config.data_dir);
    let mut store = JsonFileStore::open(&config.store_path)?;
    let pipeline = Pipeline::new(config, &feeds, mode);

    let total: u64 = config
        .stations
        .iter()
        .map(|station| pipeline.requests(station).len() as u64)
        .sum();
    let progress = ProgressReporter::new(total, "Reading feeds...", quiet);

    let summary = pipeline.run(&mut store, Some(&progress))?;
    progress.finish_with_message(&format!(
        "Read {} feeds ({} unavailable)",
        summary.feeds_read, summary.feeds_failed
    ));

    store.save()?;
    info!("Store saved to {}", store.path().display());

    println!("\nObservations: {}", summary.observations);
    for (source, stats) in &summary.archives {
        println!("{:>12}: {}", source.as_str(), stats);
    }

    Ok(summary)
}
