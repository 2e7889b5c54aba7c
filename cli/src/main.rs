use anyhow::{bail, Result};
use clap::Parser;
use courtside::{
    enrich::{self, EnrichConfig, DEFAULT_MIN_MINUTES, DEFAULT_SEASON},
    fetch::{FetchConfig, DEFAULT_MAX_ATTEMPTS},
    source::NbaStatsSource,
    stats::{EnrichedStatsDf, PlayerStatsDf},
    teams::nba_teams,
    Error, Phase, PLAYER_ID_COL, POSITION_COL,
};
use itertools::Itertools;
use log::LevelFilter;
use polars::prelude::*;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Attach roster positions to player statistics tables")]
struct Args {
    /// Regular season player statistics (csv or parquet)
    #[arg(short = 'r', long = "regular", value_name = "FILE")]
    regular: PathBuf,

    /// Playoff player statistics (csv or parquet)
    #[arg(short = 'p', long = "playoffs", value_name = "FILE")]
    playoffs: PathBuf,

    #[arg(short = 's', long, default_value = DEFAULT_SEASON)]
    season: String,

    /// Write enriched tables here instead of overwriting the inputs
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    attempts: u32,

    #[arg(long = "base-delay-ms", default_value_t = 800)]
    base_delay_ms: u64,

    #[arg(long = "pacing-ms", default_value_t = 500)]
    pacing_ms: u64,

    #[arg(long = "timeout-secs", default_value_t = 90)]
    timeout_secs: u64,

    /// Also write `<name>_filtered` tables without unknown positions or low minutes
    #[arg(long)]
    clean: bool,

    #[arg(long = "min-minutes", default_value_t = DEFAULT_MIN_MINUTES)]
    min_minutes: f64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> EnrichConfig {
        EnrichConfig {
            season: self.season.clone(),
            fetch: FetchConfig {
                max_attempts: self.attempts,
                base_delay: Duration::from_millis(self.base_delay_ms),
                pacing: Duration::from_millis(self.pacing_ms),
            },
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn output_path(&self, input: &Path) -> Result<PathBuf> {
        match &self.out_dir {
            Some(dir) => {
                let Some(name) = input.file_name() else {
                    bail!("Not a file: {}", input.display());
                };
                Ok(dir.join(name))
            }
            None => Ok(input.to_path_buf()),
        }
    }
}

fn filtered_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("players");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    path.with_file_name(format!("{}_filtered.{}", stem, ext))
}

fn write_phase(args: &Args, phase: Phase, input: &Path, df: &EnrichedStatsDf) -> Result<()> {
    let out = args.output_path(input)?;
    df.write(&out)?;
    log::info!("Wrote {} {} players to {}", df.height(), phase, out.display());

    if args.clean {
        let cleaned = df.clone().clean(args.min_minutes)?;
        let filtered = filtered_path(&out);
        cleaned.write(&filtered)?;
        log::info!(
            "Wrote {} cleaned {} players to {}",
            cleaned.height(),
            phase,
            filtered.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new().add_filter_allow_str("courtside").build();

    // Initialize the logger with the custom configuration
    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    log::trace!("Args {:#?}", args);

    if args.attempts == 0 {
        bail!("--attempts must be at least 1");
    }
    if let Some(dir) = &args.out_dir {
        if !dir.is_dir() {
            bail!("Output directory does not exist: {}", dir.display());
        }
    }

    let regular = PlayerStatsDf::load(&args.regular)?;
    log::info!("Loaded {} {} players", regular.height(), Phase::RegularSeason);
    let playoffs = PlayerStatsDf::load(&args.playoffs)?;
    log::info!("Loaded {} {} players", playoffs.height(), Phase::Playoffs);

    let config = args.config();
    let source = NbaStatsSource::new(config.timeout)?;
    let teams = nba_teams();

    let enrichment = match enrich::run(&source, &teams, &regular, &playoffs, &config) {
        Ok(enrichment) => enrichment,
        Err(Error::AllTeamsFailed(names)) => {
            bail!(
                "No roster data could be fetched after {} attempts per team ({}). Please try again in a minute.",
                config.fetch.max_attempts,
                names.iter().join(", ")
            )
        }
        Err(e) => return Err(e.into()),
    };

    write_phase(&args, Phase::RegularSeason, &args.regular, &enrichment.regular)?;
    write_phase(&args, Phase::Playoffs, &args.playoffs, &enrichment.playoffs)?;

    let preview = enrichment
        .playoffs
        .clone()
        .into_inner()
        .lazy()
        .group_by([col(POSITION_COL)])
        .agg([col(PLAYER_ID_COL).count().alias("players")])
        .sort([POSITION_COL], SortMultipleOptions::default())
        .collect()?;
    println!("{}", preview);

    Ok(())
}
