//! In-process sheet store for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{fill_columns, Row, SheetStore, StoreError};

#[derive(Default)]
pub struct MemorySheetStore {
    sheets: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn load(&self, table: &str, columns: &[&str]) -> Result<Vec<Row>, StoreError> {
        let sheets = self.sheets.read().await;
        Ok(sheets
            .get(table)
            .map(|rows| {
                rows.iter()
                    .cloned()
                    .map(|r| fill_columns(r, columns))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        self.sheets
            .write()
            .await
            .insert(table.to_string(), rows.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row;

    #[test]
    fn test_missing_table_is_empty() {
        let store = MemorySheetStore::new();
        let rows = tokio_test::block_on(store.load("nothing", &["id"])).unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_table() {
        let store = MemorySheetStore::new();
        store
            .save("users", &[row([("id", "a")]), row([("id", "b")])])
            .await
            .unwrap();
        store.save("users", &[row([("id", "c")])]).await.unwrap();

        let rows = store.load("users", &["id", "name"]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "c");
        assert_eq!(rows[0]["name"], "");
    }
}
