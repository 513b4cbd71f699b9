//! Admin cache repository implementation

use chrono::Utc;
use sqlx::any::AnyRow;
use sqlx::FromRow;
use tracing::debug;
use crate::database::{Backend, DatabasePool};
use crate::models::admin::{AdminDisplay, AdminEntry, AdminRecord};
use crate::utils::errors::Result;

const COLUMNS: &str = "chat_id, user_id, username, first_name, last_name, is_primary, added_at";

#[derive(Clone)]
pub struct AdminRepository {
    pool: DatabasePool,
    backend: Backend,
}

impl AdminRepository {
    pub fn new(pool: DatabasePool, backend: Backend) -> Self {
        Self { pool, backend }
    }

    /// Create or refresh an admin row.
    ///
    /// `primary = None` keeps the stored flag. `Some(true)` is only honoured
    /// when the group has no other primary admin.
    pub async fn upsert(
        &self,
        chat_id: i64,
        user_id: i64,
        display: &AdminDisplay,
        primary: Option<bool>,
    ) -> Result<AdminRecord> {
        let mut tx = self.pool.begin().await?;

        let primary = match primary {
            Some(true) => {
                let sql = self.backend.render(
                    "SELECT COUNT(*) FROM group_admins WHERE chat_id = $1 AND user_id <> $2 AND is_primary = 1",
                );
                let (others,): (i64,) = sqlx::query_as(&sql)
                    .bind(chat_id)
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
                if others > 0 {
                    debug!(chat_id = chat_id, user_id = user_id, "Primary admin already set, keeping it");
                }
                Some(others == 0)
            }
            other => other,
        };

        let on_conflict_primary = if primary.is_some() {
            "excluded.is_primary"
        } else {
            "group_admins.is_primary"
        };

        let sql = self.backend.render(&format!(
            "INSERT INTO group_admins (chat_id, user_id, username, first_name, last_name, is_primary, added_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (chat_id, user_id) DO UPDATE SET \
                 username = excluded.username, \
                 first_name = excluded.first_name, \
                 last_name = excluded.last_name, \
                 is_primary = {on_conflict_primary}"
        ));

        sqlx::query(&sql)
            .bind(chat_id)
            .bind(user_id)
            .bind(display.username.clone())
            .bind(display.first_name.clone())
            .bind(display.last_name.clone())
            .bind(i64::from(primary.unwrap_or(false)))
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

        let record = Self::fetch_in(&mut tx, self.backend, chat_id, user_id).await?;
        tx.commit().await?;

        Ok(record)
    }

    async fn fetch_in(
        tx: &mut sqlx::Transaction<'static, sqlx::Any>,
        backend: Backend,
        chat_id: i64,
        user_id: i64,
    ) -> Result<AdminRecord> {
        let sql = backend.render(&format!(
            "SELECT {} FROM group_admins WHERE chat_id = $1 AND user_id = $2",
            COLUMNS
        ));
        let row: AnyRow = sqlx::query(&sql)
            .bind(chat_id)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(AdminRecord::from_row(&row)?)
    }

    /// Replace the admin set of a group with the platform's current list.
    ///
    /// Stale rows are removed and `primary` moves to the reported owner.
    pub async fn sync(&self, chat_id: i64, admins: &[AdminEntry]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().timestamp();

        let existing_sql = self.backend.render("SELECT user_id FROM group_admins WHERE chat_id = $1");
        let existing: Vec<(i64,)> = sqlx::query_as(&existing_sql)
            .bind(chat_id)
            .fetch_all(&mut *tx)
            .await?;

        let delete_sql = self.backend.render("DELETE FROM group_admins WHERE chat_id = $1 AND user_id = $2");
        for (user_id,) in existing {
            if !admins.iter().any(|a| a.user_id == user_id) {
                sqlx::query(&delete_sql)
                    .bind(chat_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let upsert_sql = self.backend.render(
            "INSERT INTO group_admins (chat_id, user_id, username, first_name, last_name, is_primary, added_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (chat_id, user_id) DO UPDATE SET \
                 username = excluded.username, \
                 first_name = excluded.first_name, \
                 last_name = excluded.last_name, \
                 is_primary = excluded.is_primary",
        );

        let primary_user = admins.iter().find(|a| a.is_owner).map(|a| a.user_id);
        for admin in admins {
            sqlx::query(&upsert_sql)
                .bind(chat_id)
                .bind(admin.user_id)
                .bind(admin.display.username.clone())
                .bind(admin.display.first_name.clone())
                .bind(admin.display.last_name.clone())
                .bind(i64::from(primary_user == Some(admin.user_id)))
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(admins.len())
    }

    /// Check if a user is a cached admin of a group
    pub async fn is_admin(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        let sql = self.backend.render(
            "SELECT COUNT(*) FROM group_admins WHERE chat_id = $1 AND user_id = $2",
        );
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(chat_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// List cached admins of a group, primary first
    pub async fn list(&self, chat_id: i64) -> Result<Vec<AdminRecord>> {
        let sql = self.backend.render(&format!(
            "SELECT {} FROM group_admins WHERE chat_id = $1 ORDER BY is_primary DESC, user_id ASC",
            COLUMNS
        ));
        let rows: Vec<AnyRow> = sqlx::query(&sql)
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(AdminRecord::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
