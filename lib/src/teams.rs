/// A franchise whose roster can be requested from a [`RosterSource`](crate::source::RosterSource)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub full_name: String,
    pub abbreviation: String,
}

impl Team {
    pub fn new(id: u32, full_name: &str, abbreviation: &str) -> Self {
        Team {
            id,
            full_name: full_name.to_string(),
            abbreviation: abbreviation.to_string(),
        }
    }

    /// Full name, falling back to the abbreviation and then the numeric id
    pub fn display_name(&self) -> String {
        if !self.full_name.is_empty() {
            self.full_name.clone()
        } else if !self.abbreviation.is_empty() {
            self.abbreviation.clone()
        } else {
            self.id.to_string()
        }
    }
}

static NBA_TEAMS: &[(u32, &str, &str)] = &[
    (1610612737, "Atlanta Hawks", "ATL"),
    (1610612738, "Boston Celtics", "BOS"),
    (1610612739, "Cleveland Cavaliers", "CLE"),
    (1610612740, "New Orleans Pelicans", "NOP"),
    (1610612741, "Chicago Bulls", "CHI"),
    (1610612742, "Dallas Mavericks", "DAL"),
    (1610612743, "Denver Nuggets", "DEN"),
    (1610612744, "Golden State Warriors", "GSW"),
    (1610612745, "Houston Rockets", "HOU"),
    (1610612746, "Los Angeles Clippers", "LAC"),
    (1610612747, "Los Angeles Lakers", "LAL"),
    (1610612748, "Miami Heat", "MIA"),
    (1610612749, "Milwaukee Bucks", "MIL"),
    (1610612750, "Minnesota Timberwolves", "MIN"),
    (1610612751, "Brooklyn Nets", "BKN"),
    (1610612752, "New York Knicks", "NYK"),
    (1610612753, "Orlando Magic", "ORL"),
    (1610612754, "Indiana Pacers", "IND"),
    (1610612755, "Philadelphia 76ers", "PHI"),
    (1610612756, "Phoenix Suns", "PHX"),
    (1610612757, "Portland Trail Blazers", "POR"),
    (1610612758, "Sacramento Kings", "SAC"),
    (1610612759, "San Antonio Spurs", "SAS"),
    (1610612760, "Oklahoma City Thunder", "OKC"),
    (1610612761, "Toronto Raptors", "TOR"),
    (1610612762, "Utah Jazz", "UTA"),
    (1610612763, "Memphis Grizzlies", "MEM"),
    (1610612764, "Washington Wizards", "WAS"),
    (1610612765, "Detroit Pistons", "DET"),
    (1610612766, "Charlotte Hornets", "CHA"),
];

/// The 30 NBA franchises, in league id order
pub fn nba_teams() -> Vec<Team> {
    NBA_TEAMS
        .iter()
        .map(|&(id, name, abbr)| Team::new(id, name, abbr))
        .collect()
}
