use crate::{error::Error, teams::Team, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const ROSTER_URL: &str = "https://stats.nba.com/stats/commonteamroster";
const ROSTER_RESULT_SET: &str = "CommonTeamRoster";

/// One player line of a team roster, as reported by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub position: Option<String>,
}

impl RosterEntry {
    pub fn new(player_id: &str, position: &str) -> Self {
        RosterEntry {
            player_id: Some(player_id.to_string()),
            player_name: None,
            position: Some(position.to_string()),
        }
    }
}

/// Anything that can list a team's players and their position codes for a season
pub trait RosterSource {
    fn fetch_roster(&self, team: &Team, season: &str) -> Result<Vec<RosterEntry>>;
}

/// Roster source backed by the stats.nba.com `commonteamroster` endpoint
pub struct NbaStatsSource {
    client: Client,
}

impl NbaStatsSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0")
            .default_headers(stats_headers())
            .timeout(timeout)
            .build()?;
        Ok(NbaStatsSource { client })
    }
}

// stats.nba.com stalls requests that don't look like they come from nba.com
fn stats_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
    headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
    headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));
    headers
}

impl RosterSource for NbaStatsSource {
    fn fetch_roster(&self, team: &Team, season: &str) -> Result<Vec<RosterEntry>> {
        log::trace!("source::fetch_roster {} {}", team.id, season);
        let team_id = team.id.to_string();
        let body = self
            .client
            .get(ROSTER_URL)
            .query(&[
                ("LeagueID", "00"),
                ("Season", season),
                ("TeamID", team_id.as_str()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        parse_roster_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Parses a `commonteamroster` payload into roster entries
pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterEntry>> {
    let response: RosterResponse = serde_json::from_str(raw)?;
    let set = response
        .result_sets
        .into_iter()
        .find(|s| s.name == ROSTER_RESULT_SET)
        .ok_or_else(|| Error::RosterFormat(format!("no {} result set", ROSTER_RESULT_SET)))?;

    let column = |name: &str| {
        set.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::RosterFormat(format!("missing {} header", name)))
    };
    let id_idx = column("PLAYER_ID")?;
    let name_idx = column("PLAYER")?;
    let pos_idx = column("POSITION")?;

    let entries = set
        .row_set
        .iter()
        .map(|row| RosterEntry {
            player_id: row.get(id_idx).and_then(value_to_string),
            player_name: row.get(name_idx).and_then(value_to_string),
            position: row.get(pos_idx).and_then(value_to_string),
        })
        .collect();
    Ok(entries)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => Some(n.to_string()),
        },
        _ => None,
    }
}
