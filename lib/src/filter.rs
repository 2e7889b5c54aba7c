use crate::{Position, GP_COL, MIN_PG_COL, POSITION_COL, TEAM_COL};
use polars::prelude::*;

/// Builds a row predicate over an enriched statistics table
#[derive(Clone, Default)]
pub struct PlayerFilter {
    filter_expr: Option<Expr>,
}

impl PlayerFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    pub fn team(mut self, team: &str) -> Self {
        let expr = col(TEAM_COL).eq(lit(team));
        self.extend_filter(expr)
    }

    pub fn position(mut self, position: Position) -> Self {
        let expr = col(POSITION_COL).eq(lit(position.to_string()));
        self.extend_filter(expr)
    }

    // Rows whose label resolved to something other than Unknown
    pub fn known_position(mut self) -> Self {
        let expr = col(POSITION_COL).neq(lit(Position::Unknown.to_string()));
        self.extend_filter(expr)
    }

    /// Strictly more than `minutes` per game
    pub fn min_minutes(mut self, minutes: f64) -> Self {
        let expr = col(MIN_PG_COL).gt(lit(minutes));
        self.extend_filter(expr)
    }

    /// Strictly more than `games` played
    pub fn games_played_over(mut self, games: u32) -> Self {
        let expr = col(GP_COL).gt(lit(games));
        self.extend_filter(expr)
    }

    // Combines the current filter with a new one using AND logic
    fn extend_filter(&mut self, new_expr: Expr) -> Self {
        self.filter_expr = match self.filter_expr.take() {
            Some(existing_expr) => Some(existing_expr.and(new_expr)),
            None => Some(new_expr),
        };
        self.clone()
    }

    // Builds the final filter expression
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}
