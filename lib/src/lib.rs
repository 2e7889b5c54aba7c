use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::path::Path;

pub mod enrich;
mod error;
pub mod fetch;
pub mod filter;
pub mod positions;
pub mod retry;
pub mod source;
pub mod stats;
pub mod teams;

pub use enrich::{EnrichConfig, Enrichment};
pub use error::Error;
pub use positions::{Position, PositionMap};

pub type Result<T> = std::result::Result<T, error::Error>;

pub const PLAYER_ID_COL: &str = "PLAYER_ID";
pub const POS_COL: &str = "POS";
pub const POSITION_COL: &str = "POSITION";
pub const MIN_PG_COL: &str = "MIN_PG";
pub const GP_COL: &str = "GP";
pub const TEAM_COL: &str = "TEAM";

/// Competition phase a statistics table covers
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Display, FromStr)]
#[display(style = "kebab-case")]
pub enum Phase {
    RegularSeason,
    Playoffs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("parquet") => Ok(TableFormat::Parquet),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Loads a CSV or Parquet table, picking the reader from the file extension
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    match TableFormat::from_path(path)? {
        TableFormat::Csv => load_csv(path),
        TableFormat::Parquet => load_parquet(path),
    }
}

/// Writes a table in the format implied by the file extension
pub fn write_table<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;
    let mut file = std::fs::File::create(path)?;
    match format {
        TableFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(df)?,
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
    }
    log::debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
