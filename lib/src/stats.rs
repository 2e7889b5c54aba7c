use crate::{
    error::Error,
    filter::PlayerFilter,
    positions::{NormalizedPositionMap, Position},
    Result, MIN_PG_COL, PLAYER_ID_COL, POSITION_COL, POS_COL,
};
use derive_deref::Deref;
use polars::prelude::*;
use std::path::Path;

const ROW_COL: &str = "__row";
const KEY_COL: &str = "__player_key";

/// Per-player statistics for one competition phase
#[derive(Clone, Deref)]
pub struct PlayerStatsDf(DataFrame);

impl PlayerStatsDf {
    pub fn new(df: DataFrame) -> Self {
        PlayerStatsDf(df)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = crate::load_table(path)?;
        Ok(PlayerStatsDf(df))
    }

    /// Left-joins raw position codes and labels onto every row.
    ///
    /// Row count and order are kept; players missing from `positions` get a
    /// null `POS` and an `Unknown` `POSITION`. Existing `POS`/`POSITION`
    /// columns are replaced.
    pub fn enrich(&self, positions: &NormalizedPositionMap) -> Result<EnrichedStatsDf> {
        log::trace!("stats::enrich");
        let mut df = self.0.clone();
        for name in [POS_COL, POSITION_COL] {
            if df.get_column_index(name).is_some() {
                df = df.drop(name)?;
            }
        }

        let key = player_key(&df)?;
        let mut df = df.with_row_index(ROW_COL, None)?;
        df.with_column(key)?;

        let right = positions_frame(positions)?;
        let join_args = JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns);
        let merged_df = df
            .join(&right, [KEY_COL], [KEY_COL], join_args)?
            .lazy()
            .sort([ROW_COL], SortMultipleOptions::default())
            .with_column(col(POSITION_COL).fill_null(lit(Position::Unknown.to_string())))
            .collect()?
            .drop(ROW_COL)?
            .drop(KEY_COL)?;

        debug_assert_eq!(merged_df.height(), self.0.height());
        log::debug!(
            "{} of {} players matched a roster position",
            merged_df.column(POS_COL)?.len() - merged_df.column(POS_COL)?.null_count(),
            merged_df.height()
        );
        Ok(EnrichedStatsDf(merged_df))
    }
}

/// Player statistics with `POS` and `POSITION` columns attached
#[derive(Clone, Deref)]
pub struct EnrichedStatsDf(DataFrame);

impl EnrichedStatsDf {
    pub fn into_inner(self) -> DataFrame {
        self.0
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(EnrichedStatsDf(df))
    }

    /// Drops players without a known position and, when the table carries
    /// minutes per game, players at or under `min_minutes`.
    pub fn clean(self, min_minutes: f64) -> Result<Self> {
        let before = self.height();
        let mut filter = PlayerFilter::new().known_position();
        if self.get_column_index(MIN_PG_COL).is_some() {
            filter = filter.min_minutes(min_minutes);
        }
        let cleaned = self.filter(filter.build())?;
        log::debug!("Cleaning kept {} of {} players", cleaned.height(), before);
        Ok(cleaned)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.0.clone();
        crate::write_table(&mut df, path)
    }
}

/// The player id column rendered as strings, so ids join regardless of the
/// table's numeric type. Whole float ids are rendered as integers; fractional
/// ones get a null key and never match.
fn player_key(df: &DataFrame) -> Result<Series> {
    let ids = df
        .column(PLAYER_ID_COL)
        .map_err(|_| Error::MissingColumn(PLAYER_ID_COL.to_string()))?;
    if !ids.dtype().is_float() {
        return Ok(ids.cast(&DataType::String)?.with_name(KEY_COL));
    }

    let floats = ids.cast(&DataType::Float64)?;
    let mut fractional = 0;
    let key: StringChunked = floats
        .f64()?
        .into_iter()
        .map(|id| match id {
            Some(v) if v.fract() == 0.0 => Some(format!("{}", v as i64)),
            Some(_) => {
                fractional += 1;
                None
            }
            None => None,
        })
        .collect();
    if fractional > 0 {
        log::warn!("{} players have a non-integral {}, left unmatched", fractional, PLAYER_ID_COL);
    }
    Ok(key.into_series().with_name(KEY_COL))
}

fn positions_frame(positions: &NormalizedPositionMap) -> Result<DataFrame> {
    let mut ids: Vec<String> = Vec::with_capacity(positions.len());
    let mut codes: Vec<Option<String>> = Vec::with_capacity(positions.len());
    let mut labels: Vec<String> = Vec::with_capacity(positions.len());
    for (id, code, position) in positions.iter() {
        ids.push(id.to_string());
        codes.push(code.map(str::to_string));
        labels.push(position.to_string());
    }
    let df = df!(
        KEY_COL => ids,
        POS_COL => codes,
        POSITION_COL => labels,
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::PositionMap;

    fn stats() -> PlayerStatsDf {
        PlayerStatsDf::new(
            df!(
                PLAYER_ID_COL => &[101i64, 102, 103],
                "PTS" => &[20.0, 15.0, 8.0],
            )
            .unwrap(),
        )
    }

    #[test]
    fn attaches_code_and_label() {
        let map: PositionMap = [("101", "G"), ("102", "F-C")].into_iter().collect();
        let enriched = stats().enrich(&map.normalize()).unwrap();

        let expected = df!(
            PLAYER_ID_COL => &[101i64, 102, 103],
            "PTS" => &[20.0, 15.0, 8.0],
            POS_COL => &[Some("G"), Some("F-C"), None],
            POSITION_COL => &["Guard", "Power Forward", "Unknown"],
        )
        .unwrap();
        assert!(enriched.equals_missing(&expected), "{}", *enriched);
    }

    #[test]
    fn missing_player_id_column() {
        let df = PlayerStatsDf::new(df!("PTS" => &[1.0]).unwrap());
        let res = df.enrich(&PositionMap::new().normalize());
        assert!(matches!(res, Err(Error::MissingColumn(_))));
    }

    #[test]
    fn float_ids_match_integer_codes() {
        let df = PlayerStatsDf::new(df!(PLAYER_ID_COL => &[101.0, 7.0]).unwrap());
        let map: PositionMap = [("101", "C")].into_iter().collect();
        let enriched = df.enrich(&map.normalize()).unwrap();
        let labels: Vec<Option<&str>> = enriched.column(POSITION_COL).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some("Center"), Some("Unknown")]);
        assert_eq!(enriched.column(PLAYER_ID_COL).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn fractional_float_ids_never_match() {
        let df = PlayerStatsDf::new(df!(PLAYER_ID_COL => &[Some(101.7), Some(101.0), None]).unwrap());
        let map: PositionMap = [("101", "G")].into_iter().collect();
        let enriched = df.enrich(&map.normalize()).unwrap();
        let codes: Vec<Option<&str>> = enriched.column(POS_COL).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(codes, vec![None, Some("G"), None]);
        assert_eq!(enriched.height(), 3);
    }

    #[test]
    fn clean_drops_unknown_and_low_minutes() {
        let df = PlayerStatsDf::new(
            df!(
                PLAYER_ID_COL => &[1i64, 2, 3, 4],
                MIN_PG_COL => &[30.0, 4.0, 5.0, 12.0],
            )
            .unwrap(),
        );
        let map: PositionMap = [("1", "G"), ("2", "F"), ("3", "C")].into_iter().collect();
        let cleaned = df.enrich(&map.normalize()).unwrap().clean(5.0).unwrap();
        let ids: Vec<Option<i64>> = cleaned.column(PLAYER_ID_COL).unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1)]);
    }

    #[test]
    fn clean_without_minutes_column() {
        let map: PositionMap = [("101", "G")].into_iter().collect();
        let cleaned = stats().enrich(&map.normalize()).unwrap().clean(5.0).unwrap();
        assert_eq!(cleaned.height(), 1);
    }
}
