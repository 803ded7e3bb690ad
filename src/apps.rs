use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use clap::{Parser, error::ErrorKind};

use crate::config::{CategoryProportions, GenreFloor, GenreSelector, IngestConfig, SubsetConfig};
use crate::constants::ingestion::{DEFAULT_INCLUDE_NETWORK_IDS, DEFAULT_WINDOW_DAYS};
use crate::constants::sampler::{DEFAULT_GENRE_FLOOR_FRACTION, DEFAULT_SEED, DEFAULT_SUBSET_SIZE};
use crate::data::ProgramRecord;
use crate::errors::DatasetError;
use crate::metrics::{category_drift, subset_composition};
use crate::pipeline::DatasetPipeline;
use crate::sampler::DeterministicRng;
use crate::source::{EventSource, JsonlEventSource, TimeWindow, jst, parse_jst_datetime};
use crate::transport::fs::{JsonlWriter, read_jsonl, write_jsonl};
use crate::types::NetworkId;

type DynSource = Box<dyn EventSource + 'static>;

#[derive(Debug, Parser)]
#[command(
    name = "generate_epg_dataset",
    disable_help_subcommand = true,
    about = "Build the full EPG dataset from a guide-data source",
    long_about = "Acquire guide events window by window, keep regular TV services on the allowed networks, assign ids, normalize text, and write one JSON record per line sorted by id within each window.",
    after_help = "Naive dates are taken as UTC+9. The output file must not exist yet."
)]
struct GenerateDatasetCli {
    #[arg(
        long,
        value_name = "SOURCE",
        help = "Guide-data source (path to a JSONL dump of service/event groups)"
    )]
    source: String,
    #[arg(
        long,
        value_name = "PATH",
        default_value = "epg_dataset.jsonl",
        help = "Dataset output path"
    )]
    output: PathBuf,
    #[arg(
        long = "start-date",
        value_name = "DATETIME",
        value_parser = parse_date_arg,
        help = "Start of the acquisition range (default: 24 hours ago)"
    )]
    start_date: Option<DateTime<FixedOffset>>,
    #[arg(
        long = "end-date",
        value_name = "DATETIME",
        value_parser = parse_date_arg,
        help = "End of the acquisition range, exclusive (default: now)"
    )]
    end_date: Option<DateTime<FixedOffset>>,
    #[arg(
        long = "include-network-id",
        value_name = "ONID",
        help = "Allowed original network id, repeat as needed (default: BS, CS1, CS2, Tokyo terrestrial)"
    )]
    include_network_ids: Vec<NetworkId>,
    #[arg(
        long = "window-days",
        default_value_t = DEFAULT_WINDOW_DAYS,
        value_parser = parse_positive_i64,
        help = "Acquisition window length in days"
    )]
    window_days: i64,
}

#[derive(Debug, Parser)]
#[command(
    name = "generate_epg_subset",
    disable_help_subcommand = true,
    about = "Draw a stratified, weighted subset from an EPG dataset",
    long_about = "Filter shopping, unknown-genre, genre-less, and blank-title programs, drop repeated title/description pairs, weight the rest by recency and genre, and sample per channel category.",
    after_help = "Naive dates are taken as UTC+9. The output file must not exist yet."
)]
struct GenerateSubsetCli {
    #[arg(
        long,
        value_name = "PATH",
        default_value = "epg_dataset.jsonl",
        help = "Full dataset JSONL path"
    )]
    dataset: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        default_value = "epg_dataset_subset.jsonl",
        help = "Subset output path"
    )]
    output: PathBuf,
    #[arg(
        long = "subset-size",
        default_value_t = DEFAULT_SUBSET_SIZE,
        value_parser = parse_positive_usize,
        help = "Number of records in the subset"
    )]
    subset_size: usize,
    #[arg(
        long = "start-date",
        value_name = "DATETIME",
        value_parser = parse_date_arg,
        help = "Drop programs starting before this instant"
    )]
    start_date: Option<DateTime<FixedOffset>>,
    #[arg(
        long = "end-date",
        value_name = "DATETIME",
        value_parser = parse_date_arg,
        help = "Drop programs starting after this instant"
    )]
    end_date: Option<DateTime<FixedOffset>>,
    #[arg(long, default_value_t = DEFAULT_SEED, help = "Deterministic sampling seed")]
    seed: u64,
    #[arg(
        long,
        value_name = "TERRESTRIAL,FREE_BS,PAID_BS_CS",
        value_parser = parse_proportions_arg,
        default_value = "0.65,0.25,0.10",
        help = "Comma-separated channel category proportions (sum at most 1.0)"
    )]
    proportions: CategoryProportions,
    #[arg(
        long = "genre-floor",
        value_name = "MAJOR[:MIDDLE]",
        help = "Genre whose share is topped up to --floor-fraction, repeat as needed (e.g. 7:0)"
    )]
    genre_floors: Vec<GenreSelector>,
    #[arg(
        long = "floor-fraction",
        default_value_t = DEFAULT_GENRE_FLOOR_FRACTION,
        help = "Minimum share of the subset for each --genre-floor genre"
    )]
    floor_fraction: f64,
}

/// Build the full dataset from a JSONL dump named by `--source`.
pub fn run_generate_dataset<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    run_generate_dataset_with(args_iter, |source| {
        Ok(Box::new(JsonlEventSource::open(source)?) as DynSource)
    })
}

/// Build the full dataset from a caller-provided source.
///
/// `build_source` receives the `--source` argument and is only called once the output path has
/// been checked, so a network client is never contacted for a run that cannot write.
pub fn run_generate_dataset_with<I, Build>(
    args_iter: I,
    build_source: Build,
) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    Build: FnOnce(&str) -> Result<DynSource, Box<dyn Error>>,
{
    init_tracing();

    let Some(cli) = parse_cli::<GenerateDatasetCli, _>(
        std::iter::once("generate_epg_dataset".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    if cli.output.exists() {
        eprintln!("{}", DatasetError::OutputExists(cli.output));
        return Ok(());
    }

    let now = Utc::now().with_timezone(&jst());
    let start = cli.start_date.unwrap_or(now - TimeDelta::days(1));
    let end = cli.end_date.unwrap_or(now);
    println!("acquisition range: {start} .. {end}");

    let ingest = IngestConfig {
        include_network_ids: if cli.include_network_ids.is_empty() {
            DEFAULT_INCLUDE_NETWORK_IDS.to_vec()
        } else {
            cli.include_network_ids
        },
        window: TimeDelta::days(cli.window_days),
    };
    let pipeline = DatasetPipeline::new(ingest, SubsetConfig::default())?;

    let started = Instant::now();
    let source = build_source(&cli.source)?;
    let mut writer = match JsonlWriter::create(&cli.output) {
        Ok(writer) => writer,
        Err(DatasetError::OutputExists(path)) => {
            eprintln!("{}", DatasetError::OutputExists(path));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let summary = pipeline.write_dataset(&*source, &TimeWindow::new(start, end), &mut writer)?;
    let written = writer.finish()?;

    println!("{}", "-".repeat(80));
    println!("windows: {} ({} failed)", summary.windows, summary.failed_windows);
    println!("events: {}", summary.stats);
    println!("records written: {written} -> {}", cli.output.display());
    println!("elapsed: {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Draw the subset described by the CLI arguments and print its composition.
pub fn run_generate_subset<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();

    let Some(cli) = parse_cli::<GenerateSubsetCli, _>(
        std::iter::once("generate_epg_subset".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    if cli.output.exists() {
        eprintln!("{}", DatasetError::OutputExists(cli.output));
        return Ok(());
    }

    let subset = SubsetConfig {
        subset_size: cli.subset_size,
        proportions: cli.proportions,
        genre_floors: cli
            .genre_floors
            .into_iter()
            .map(|genre| GenreFloor {
                genre,
                fraction: cli.floor_fraction,
            })
            .collect(),
        start_date: cli.start_date,
        end_date: cli.end_date,
        seed: cli.seed,
    };
    let pipeline = DatasetPipeline::new(IngestConfig::default(), subset)?;
    if let Some(start) = pipeline.subset_config().start_date {
        println!("subset range start: {start}");
    }
    if let Some(end) = pipeline.subset_config().end_date {
        println!("subset range end: {end}");
    }

    let started = Instant::now();
    let dataset: Vec<ProgramRecord> = read_jsonl(&cli.dataset)?;
    let total = dataset.len();
    let mut rng = DeterministicRng::new(pipeline.subset_config().seed);
    let output = pipeline.build_subset(dataset, &mut rng);

    println!("{}", "-".repeat(80));
    println!("dataset records: {total}");
    println!("pool records: {} ({})", output.pool_size, output.pool_stats);
    if output.sampling.supplemented > 0 {
        println!(
            "genre floor: +{} supplemented, -{} downsampled",
            output.sampling.supplemented, output.sampling.downsampled
        );
    }
    let composition = subset_composition(&output.records);
    print!("{composition}");
    for (category, drift) in category_drift(&composition, &pipeline.subset_config().proportions) {
        println!("{category} drift from target: {:+.2}%", drift * 100.0);
    }
    println!("{}", "-".repeat(80));

    match write_jsonl(&cli.output, &output.records) {
        Ok(written) => println!("records written: {written} -> {}", cli.output.display()),
        Err(DatasetError::OutputExists(path)) => {
            eprintln!("{}", DatasetError::OutputExists(path));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }
    println!("elapsed: {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_date_arg(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    parse_jst_datetime(raw).ok_or_else(|| {
        format!("could not parse '{raw}' as a date (expected YYYY-MM-DD[THH:MM[:SS]][+09:00])")
    })
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_positive_i64(raw: &str) -> Result<i64, String> {
    let parsed = raw
        .parse::<i64>()
        .map_err(|_| format!("could not parse '{raw}' as a positive integer"))?;
    if parsed <= 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_proportions_arg(raw: &str) -> Result<CategoryProportions, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err("--proportions expects exactly 3 comma-separated values".to_string());
    }
    let mut values = [0.0f64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid proportion '{}': must be a float", part.trim()))?;
    }
    CategoryProportions {
        terrestrial: values[0],
        free_satellite: values[1],
        paid_satellite_or_cable: values[2],
    }
    .validated()
    .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_cli_defaults_match_reference_run() {
        let cli = GenerateSubsetCli::try_parse_from(["generate_epg_subset"]).unwrap();
        assert_eq!(cli.subset_size, 5000);
        assert_eq!(cli.seed, 42);
        assert_eq!(cli.proportions, CategoryProportions::default());
        assert!(cli.genre_floors.is_empty());
        assert_eq!(cli.output, PathBuf::from("epg_dataset_subset.jsonl"));
    }

    #[test]
    fn subset_cli_parses_floors_and_dates() {
        let cli = GenerateSubsetCli::try_parse_from([
            "generate_epg_subset",
            "--genre-floor",
            "7:0",
            "--genre-floor",
            "3",
            "--floor-fraction",
            "0.2",
            "--start-date",
            "2023-01-01",
            "--proportions",
            "0.5,0.3,0.2",
        ])
        .unwrap();
        assert_eq!(cli.genre_floors.len(), 2);
        assert_eq!(cli.genre_floors[0].to_string(), "7:0");
        assert_eq!(cli.floor_fraction, 0.2);
        assert_eq!(
            cli.start_date.unwrap().to_rfc3339(),
            "2023-01-01T00:00:00+09:00"
        );
        assert_eq!(cli.proportions.free_satellite, 0.3);
    }

    #[test]
    fn cli_rejects_bad_values() {
        assert!(GenerateSubsetCli::try_parse_from(["x", "--subset-size", "0"]).is_err());
        assert!(GenerateSubsetCli::try_parse_from(["x", "--proportions", "0.9,0.9,0.1"]).is_err());
        assert!(GenerateSubsetCli::try_parse_from(["x", "--genre-floor", "99"]).is_err());
        assert!(GenerateDatasetCli::try_parse_from(["x"]).is_err());
        assert!(
            GenerateDatasetCli::try_parse_from(["x", "--source", "a", "--window-days", "0"]).is_err()
        );
    }

    #[test]
    fn help_is_not_an_error() {
        let parsed = parse_cli::<GenerateSubsetCli, _>(["generate_epg_subset", "--help"]).unwrap();
        assert!(parsed.is_none());
    }
}
