use crate::{
    fetch::{FetchConfig, RosterFetcher},
    positions::PositionMap,
    source::RosterSource,
    stats::{EnrichedStatsDf, PlayerStatsDf},
    teams::Team,
    Phase, Result,
};
use std::time::Duration;

pub const DEFAULT_SEASON: &str = "2024-25";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_MIN_MINUTES: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub season: String,
    pub fetch: FetchConfig,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            season: DEFAULT_SEASON.to_string(),
            fetch: FetchConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct Enrichment {
    pub regular: EnrichedStatsDf,
    pub playoffs: EnrichedStatsDf,
    /// Teams whose roster could not be fetched, in processing order
    pub failed_teams: Vec<String>,
    /// Players listed on more than one roster
    pub duplicates: Vec<String>,
}

impl Enrichment {
    pub fn get(&self, phase: Phase) -> &EnrichedStatsDf {
        match phase {
            Phase::RegularSeason => &self.regular,
            Phase::Playoffs => &self.playoffs,
        }
    }
}

/// Fetches every roster, merges positions and joins them onto both tables.
///
/// Aborts with [`Error::AllTeamsFailed`](crate::Error::AllTeamsFailed) before any join
/// when no roster could be fetched.
pub fn run<S: RosterSource>(
    source: &S,
    teams: &[Team],
    regular: &PlayerStatsDf,
    playoffs: &PlayerStatsDf,
    config: &EnrichConfig,
) -> Result<Enrichment> {
    log::trace!("enrich::run season {}", config.season);
    let fetcher = RosterFetcher::new(source, config.fetch);
    let fetch = fetcher.fetch_all(teams, &config.season)?;

    let positions = PositionMap::from_rosters(&fetch.rosters);
    let normalized = positions.normalize();

    let regular = regular.enrich(&normalized)?;
    log::info!("Enriched {} {} players", regular.height(), Phase::RegularSeason);
    let playoffs = playoffs.enrich(&normalized)?;
    log::info!("Enriched {} {} players", playoffs.height(), Phase::Playoffs);

    Ok(Enrichment {
        regular,
        playoffs,
        failed_teams: fetch.failed,
        duplicates: positions.duplicates().to_vec(),
    })
}
