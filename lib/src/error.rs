use polars::error::PolarsError;
use std::io::Error as IoError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed roster response: {0}")]
    RosterFormat(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported table format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("No roster could be fetched, every team failed: {}", .0.join(", "))]
    AllTeamsFailed(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_teams_failed_lists_every_team() {
        let err = Error::AllTeamsFailed(vec!["Boston Celtics".into(), "Utah Jazz".into()]);
        assert_eq!(
            err.to_string(),
            "No roster could be fetched, every team failed: Boston Celtics, Utah Jazz"
        );
    }
}
