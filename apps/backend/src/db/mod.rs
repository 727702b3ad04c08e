//! Sheet store: named tables of string rows, loaded and saved whole.
//!
//! Every table is a list of rows keyed by column name. Loading a table that
//! does not exist yields no rows, and columns a row lacks are filled with
//! empty strings. Saving overwrites the whole table; the last writer wins.

mod memory;
mod postgres;
pub mod tables;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemorySheetStore;
pub use postgres::PgSheetStore;
pub use tables::{SheetRecord, Sheets};

/// One sheet row: column name to cell text.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Full-table load/save access to the academy's tables.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// All rows of `table` in stored order, each carrying every column in
    /// `columns`.
    async fn load(&self, table: &str, columns: &[&str]) -> Result<Vec<Row>, StoreError>;

    /// Replace the contents of `table` with `rows`.
    async fn save(&self, table: &str, rows: &[Row]) -> Result<(), StoreError>;
}

/// Add an empty cell for every column the row is missing.
pub fn fill_columns(mut row: Row, columns: &[&str]) -> Row {
    for column in columns {
        row.entry((*column).to_string()).or_default();
    }
    row
}

/// Build a row from (column, value) pairs.
pub fn row<I, K, V>(cells: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
