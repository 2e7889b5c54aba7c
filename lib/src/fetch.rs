use crate::{
    error::Error,
    retry::{self, linear_backoff},
    source::{RosterEntry, RosterSource},
    teams::Team,
    Result,
};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub struct FetchConfig {
    pub max_attempts: u32,
    /// Backoff after the n-th failed attempt is `base_delay * n`
    pub base_delay: Duration,
    /// Pause after every team, successful or not
    pub pacing: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            pacing: DEFAULT_PACING,
        }
    }
}

impl FetchConfig {
    /// No backoff or pacing, for tests and offline sources
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamRoster {
    pub team: Team,
    pub entries: Vec<RosterEntry>,
}

/// Result of walking every team: successful rosters in processing order plus
/// the display names of teams whose retries were exhausted.
#[derive(Debug, Clone, Default)]
pub struct RosterFetch {
    pub rosters: Vec<TeamRoster>,
    pub failed: Vec<String>,
}

impl RosterFetch {
    pub fn player_count(&self) -> usize {
        self.rosters.iter().map(|r| r.entries.len()).sum()
    }

    /// One line naming every team that could not be fetched
    pub fn failure_summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            None
        } else {
            Some(format!("Could not fetch roster for: {}", self.failed.join(", ")))
        }
    }
}

pub struct RosterFetcher<'a, S: RosterSource> {
    source: &'a S,
    config: FetchConfig,
    sleep: Box<dyn Fn(Duration) + 'a>,
}

impl<'a, S: RosterSource> RosterFetcher<'a, S> {
    pub fn new(source: &'a S, config: FetchConfig) -> Self {
        RosterFetcher {
            source,
            config,
            sleep: Box::new(retry::sleep),
        }
    }

    /// Replaces the thread sleep used for backoff and pacing
    pub fn with_sleep<F>(mut self, sleep: F) -> Self
    where
        F: Fn(Duration) + 'a,
    {
        self.sleep = Box::new(sleep);
        self
    }

    /// Fetches one team with retry; `None` once every attempt failed
    pub fn fetch_team(&self, team: &Team, season: &str) -> Option<TeamRoster> {
        let result = retry::attempt_with_sleep(
            self.config.max_attempts,
            linear_backoff(self.config.base_delay),
            |d| (self.sleep)(d),
            |n| {
                log::debug!("Fetching {} roster (attempt {})", team.display_name(), n);
                self.source.fetch_roster(team, season)
            },
        );
        match result {
            Ok(entries) => Some(TeamRoster {
                team: team.clone(),
                entries,
            }),
            Err(exhausted) => {
                log::error!(
                    "Giving up on {} after {} attempts: {}",
                    team.display_name(),
                    exhausted.attempts,
                    exhausted.last_error
                );
                None
            }
        }
    }

    /// Fetches every team sequentially, pacing between teams.
    ///
    /// Fails with [`Error::AllTeamsFailed`] only when no roster at all could be fetched.
    pub fn fetch_all(&self, teams: &[Team], season: &str) -> Result<RosterFetch> {
        log::trace!("fetch::fetch_all {} teams, season {}", teams.len(), season);
        let mut fetch = RosterFetch::default();
        let total = teams.len();

        for (i, team) in teams.iter().enumerate() {
            match self.fetch_team(team, season) {
                Some(roster) => {
                    log::info!(
                        "[{}/{}] {}: {} players",
                        i + 1,
                        total,
                        team.display_name(),
                        roster.entries.len()
                    );
                    fetch.rosters.push(roster);
                }
                None => fetch.failed.push(team.display_name()),
            }
            (self.sleep)(self.config.pacing);
        }

        if fetch.rosters.is_empty() {
            return Err(Error::AllTeamsFailed(fetch.failed));
        }
        if let Some(summary) = fetch.failure_summary() {
            log::warn!("{}", summary);
        }
        log::debug!(
            "{} rosters fetched, {} player entries",
            fetch.rosters.len(),
            fetch.player_count()
        );
        Ok(fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Fails a team a set number of times before answering
    struct Flaky {
        failures: HashMap<u32, u32>,
        calls: RefCell<HashMap<u32, u32>>,
    }

    impl RosterSource for Flaky {
        fn fetch_roster(&self, team: &Team, _season: &str) -> Result<Vec<RosterEntry>> {
            let mut calls = self.calls.borrow_mut();
            let n = calls.entry(team.id).or_insert(0);
            *n += 1;
            if *n <= self.failures.get(&team.id).copied().unwrap_or(0) {
                return Err(Error::RosterFormat(format!("transient {}", n)));
            }
            Ok(vec![RosterEntry::new(&format!("{}01", team.id), "G")])
        }
    }

    fn teams() -> Vec<Team> {
        vec![Team::new(1, "Alpha", "ALP"), Team::new(2, "Beta", "BET")]
    }

    #[test]
    fn recovers_within_attempt_cap() {
        let source = Flaky {
            failures: HashMap::from([(1, 3)]),
            calls: RefCell::new(HashMap::new()),
        };
        let fetcher = RosterFetcher::new(&source, FetchConfig::immediate());
        let fetch = fetcher.fetch_all(&teams(), "2024-25").unwrap();

        assert!(fetch.failed.is_empty());
        assert_eq!(fetch.rosters.len(), 2);
        assert_eq!(source.calls.borrow()[&1], 4);
        assert_eq!(source.calls.borrow()[&2], 1);
    }

    #[test]
    fn exhausted_team_is_skipped() {
        let source = Flaky {
            failures: HashMap::from([(2, 4)]),
            calls: RefCell::new(HashMap::new()),
        };
        let fetcher = RosterFetcher::new(&source, FetchConfig::immediate());
        let fetch = fetcher.fetch_all(&teams(), "2024-25").unwrap();

        assert_eq!(fetch.failed, vec!["Beta".to_string()]);
        assert_eq!(fetch.rosters.len(), 1);
        assert_eq!(fetch.rosters[0].team.id, 1);
        assert_eq!(source.calls.borrow()[&2], 4);
    }

    #[test]
    fn every_team_failing_is_fatal() {
        let source = Flaky {
            failures: HashMap::from([(1, 10), (2, 10)]),
            calls: RefCell::new(HashMap::new()),
        };
        let fetcher = RosterFetcher::new(&source, FetchConfig::immediate());
        match fetcher.fetch_all(&teams(), "2024-25") {
            Err(Error::AllTeamsFailed(names)) => assert_eq!(names, vec!["Alpha", "Beta"]),
            other => panic!("expected AllTeamsFailed, got {:?}", other.map(|f| f.failed)),
        }
    }

    #[test]
    fn backoff_then_pacing_after_every_team() {
        let source = Flaky {
            failures: HashMap::from([(1, 10)]),
            calls: RefCell::new(HashMap::new()),
        };
        let teams = vec![
            Team::new(1, "Alpha", "ALP"),
            Team::new(2, "Beta", "BET"),
            Team::new(3, "Gamma", "GAM"),
        ];
        let config = FetchConfig {
            max_attempts: 4,
            base_delay: Duration::from_millis(20),
            pacing: Duration::from_millis(50),
        };
        let slept = RefCell::new(Vec::new());
        let fetch = RosterFetcher::new(&source, config)
            .with_sleep(|d| slept.borrow_mut().push(d.as_millis()))
            .fetch_all(&teams, "2024-25")
            .unwrap();

        assert_eq!(fetch.failed, vec!["Alpha".to_string()]);
        assert_eq!(*slept.borrow(), vec![20, 40, 60, 50, 50, 50]);
    }

    #[test]
    fn failure_summary_names_teams() {
        let mut fetch = RosterFetch::default();
        assert_eq!(fetch.failure_summary(), None);
        fetch.failed = vec!["Alpha".to_string(), "Beta".to_string()];
        assert_eq!(
            fetch.failure_summary().as_deref(),
            Some("Could not fetch roster for: Alpha, Beta")
        );
    }
}
