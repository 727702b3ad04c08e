//! PostgreSQL sheet store

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row as _};

use super::{fill_columns, Row, SheetStore, StoreError};

/// Sheet store backed by the `sheet_rows` table, one JSONB document per row.
#[derive(Clone)]
pub struct PgSheetStore {
    pool: PgPool,
}

impl PgSheetStore {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SheetStore for PgSheetStore {
    async fn load(&self, table: &str, columns: &[&str]) -> Result<Vec<Row>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM sheet_rows
            WHERE sheet = $1
            ORDER BY position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> Result<Row, StoreError> {
                let Json(data): Json<Row> = r.try_get("data")?;
                Ok(fill_columns(data, columns))
            })
            .collect()
    }

    async fn save(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sheet_rows WHERE sheet = $1")
            .bind(table)
            .execute(&mut *tx)
            .await?;

        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sheet_rows (sheet, position, data)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(table)
            .bind(position as i32)
            .bind(Json(row))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(table, rows = rows.len(), "Saved sheet");
        Ok(())
    }
}
