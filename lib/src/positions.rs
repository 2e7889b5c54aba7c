use crate::fetch::TeamRoster;
use parse_display::{Display, FromStr};
use std::collections::BTreeMap;

/// Human readable on-court position
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, FromStr)]
pub enum Position {
    Guard,
    Forward,
    Center,
    #[display("Small Forward")]
    SmallForward,
    #[display("Power Forward")]
    PowerForward,
    Unknown,
}

impl Position {
    /// Maps a raw roster code to a label. Total: unmapped or missing codes are `Unknown`.
    pub fn from_code(code: Option<&str>) -> Position {
        match code.map(str::trim) {
            Some("G") | Some("G-F") => Position::Guard,
            Some("F") => Position::Forward,
            Some("C") | Some("C-F") => Position::Center,
            Some("F-G") => Position::SmallForward,
            Some("F-C") => Position::PowerForward,
            _ => Position::Unknown,
        }
    }
}

/// Player id to raw position code, merged across every fetched roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    codes: BTreeMap<String, Option<String>>,
    duplicates: Vec<String>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `player_id`. The most recently processed roster wins;
    /// an overwritten id is remembered in [`duplicates`](Self::duplicates).
    pub fn insert(&mut self, player_id: &str, code: Option<&str>) {
        let code = code.map(str::to_string);
        if self.codes.insert(player_id.to_string(), code).is_some() {
            self.duplicates.push(player_id.to_string());
        }
    }

    /// Merges rosters in processing order, dropping entries without a player id
    pub fn from_rosters<'a, I>(rosters: I) -> Self
    where
        I: IntoIterator<Item = &'a TeamRoster>,
    {
        let mut map = PositionMap::new();
        let mut dropped = 0;
        for roster in rosters {
            for entry in &roster.entries {
                match entry.player_id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => map.insert(id, entry.position.as_deref()),
                    _ => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            log::debug!("Dropped {} roster entries without a player id", dropped);
        }
        if !map.duplicates.is_empty() {
            log::warn!(
                "{} players listed on more than one roster, keeping the last one seen: {}",
                map.duplicates.len(),
                map.duplicates.join(", ")
            );
        }
        log::debug!("{} players with a position code", map.len());
        map
    }

    pub fn get(&self, player_id: &str) -> Option<Option<&str>> {
        self.codes.get(player_id).map(|c| c.as_deref())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Player ids that appeared on more than one roster, in the order they were overwritten
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn normalize(&self) -> NormalizedPositionMap {
        let entries = self
            .codes
            .iter()
            .map(|(id, code)| {
                let position = Position::from_code(code.as_deref());
                (id.clone(), (code.clone(), position))
            })
            .collect();
        NormalizedPositionMap { entries }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PositionMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut map = PositionMap::new();
        for (id, code) in iter {
            map.insert(id, Some(code));
        }
        map
    }
}

/// Player id to (raw code, label)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPositionMap {
    entries: BTreeMap<String, (Option<String>, Position)>,
}

impl NormalizedPositionMap {
    pub fn get(&self, player_id: &str) -> Option<(Option<&str>, Position)> {
        self.entries
            .get(player_id)
            .map(|(code, position)| (code.as_deref(), *position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>, Position)> {
        self.entries
            .iter()
            .map(|(id, (code, position))| (id.as_str(), code.as_deref(), *position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{source::RosterEntry, teams::Team};

    #[test]
    fn fixed_labels() {
        let cases = [
            ("G", "Guard"),
            ("F", "Forward"),
            ("C", "Center"),
            ("G-F", "Guard"),
            ("F-G", "Small Forward"),
            ("F-C", "Power Forward"),
            ("C-F", "Center"),
        ];
        for (code, label) in cases {
            assert_eq!(Position::from_code(Some(code)).to_string(), label, "{}", code);
        }
    }

    #[test]
    fn everything_else_is_unknown() {
        for code in ["", "g", "PG", "F-C-G", "Guard"] {
            assert_eq!(Position::from_code(Some(code)), Position::Unknown, "{:?}", code);
        }
        assert_eq!(Position::from_code(None), Position::Unknown);
        assert_eq!(Position::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn label_parses_back() {
        assert_eq!("Small Forward".parse::<Position>().unwrap(), Position::SmallForward);
    }

    fn roster(id: u32, entries: Vec<RosterEntry>) -> TeamRoster {
        TeamRoster {
            team: Team::new(id, &format!("Team {}", id), ""),
            entries,
        }
    }

    #[test]
    fn last_roster_wins() {
        let rosters = vec![
            roster(1, vec![RosterEntry::new("7", "G"), RosterEntry::new("8", "C")]),
            roster(2, vec![RosterEntry::new("7", "F-C")]),
        ];
        let map = PositionMap::from_rosters(&rosters);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("7"), Some(Some("F-C")));
        assert_eq!(map.get("8"), Some(Some("C")));
        assert_eq!(map.duplicates(), ["7".to_string()]);
    }

    #[test]
    fn entries_without_id_are_dropped() {
        let nameless = RosterEntry {
            player_id: None,
            player_name: Some("Ghost".into()),
            position: Some("G".into()),
        };
        let blank = RosterEntry::new("  ", "F");
        let rosters = vec![roster(1, vec![nameless, blank, RosterEntry::new("9", "F")])];
        let map = PositionMap::from_rosters(&rosters);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("9"), Some(Some("F")));
    }

    #[test]
    fn normalize_keeps_raw_code() {
        let map: PositionMap = [("101", "G"), ("102", "F-C"), ("104", "X")]
            .into_iter()
            .collect();
        let normalized = map.normalize();
        assert_eq!(normalized.get("101"), Some((Some("G"), Position::Guard)));
        assert_eq!(normalized.get("102"), Some((Some("F-C"), Position::PowerForward)));
        assert_eq!(normalized.get("104"), Some((Some("X"), Position::Unknown)));
        assert_eq!(normalized.get("103"), None);
    }
}
