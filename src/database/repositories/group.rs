//! Group settings repository implementation

use chrono::Utc;
use sqlx::any::AnyRow;
use sqlx::FromRow;
use crate::database::{Backend, DatabasePool};
use crate::models::group::{GroupSettings, SettingField, StoredValue};
use crate::utils::errors::{AdhkarError, Result};

const COLUMNS: &str = "chat_id, enabled, morning, evening, friday_kahf, friday_dua, sleep, diverse, \
    morning_time, evening_time, sleep_time, diverse_interval_minutes, diverse_media_type, \
    send_media_with_morning, send_media_with_evening, send_media_with_friday, created_at";

#[derive(Clone)]
pub struct GroupRepository {
    pool: DatabasePool,
    backend: Backend,
}

impl GroupRepository {
    pub fn new(pool: DatabasePool, backend: Backend) -> Self {
        Self { pool, backend }
    }

    /// Find settings by chat ID
    pub async fn find(&self, chat_id: i64) -> Result<Option<GroupSettings>> {
        let sql = self.backend.render(&format!(
            "SELECT {} FROM group_settings WHERE chat_id = $1",
            COLUMNS
        ));

        let row: Option<AnyRow> = sqlx::query(&sql)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| GroupSettings::from_row(&r)).transpose()?)
    }

    /// Insert the default row unless one exists; returns whether a row was created
    pub async fn insert_default(&self, chat_id: i64) -> Result<bool> {
        let sql = self.backend.render(
            "INSERT INTO group_settings (chat_id, created_at) VALUES ($1, $2) \
             ON CONFLICT (chat_id) DO NOTHING",
        );

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(chat_id)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write one whitelisted column, creating the row if needed.
    ///
    /// A single upsert statement, so readers never observe a half-written row.
    pub async fn upsert_field(&self, chat_id: i64, field: SettingField, value: StoredValue) -> Result<()> {
        let column = field.column();
        let sql = self.backend.render(&format!(
            "INSERT INTO group_settings (chat_id, {column}, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (chat_id) DO UPDATE SET {column} = excluded.{column}"
        ));

        let query = sqlx::query(&sql).bind(chat_id);
        let query = match value {
            StoredValue::Int(n) => query.bind(n),
            StoredValue::Text(text) => query.bind(text),
        };

        let mut tx = self.pool.begin().await?;
        let result = query
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(AdhkarError::Internal(format!(
                "Update of {} for chat {} affected no rows",
                column, chat_id
            )));
        }
        tx.commit().await?;

        Ok(())
    }

    /// Chat IDs of all enabled groups
    pub async fn list_enabled(&self) -> Result<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT chat_id FROM group_settings WHERE enabled = 1 ORDER BY chat_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Count total groups
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM group_settings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count enabled groups
    pub async fn count_enabled(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM group_settings WHERE enabled = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
