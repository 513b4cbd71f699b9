//! Database service layer
//!
//! `SettingsStore` is the only owner of row state. Every other component
//! reads through it and mutates via its operations.

use tracing::{debug, info};
use crate::config::Settings;
use crate::database::{
    connection, Backend, DatabaseConfig, DatabasePool, GroupRepository, AdminRepository,
};
use crate::models::{AdminDisplay, AdminEntry, AdminRecord, GroupSettings, SettingField, SettingValue};
use crate::utils::errors::{AdhkarError, Result};

#[derive(Clone)]
pub struct SettingsStore {
    pool: DatabasePool,
    pub groups: GroupRepository,
    pub admins: AdminRepository,
}

impl SettingsStore {
    pub fn new(pool: DatabasePool, backend: Backend) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone(), backend),
            admins: AdminRepository::new(pool.clone(), backend),
            pool,
        }
    }

    /// Connect using application settings and create the schema
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let config = DatabaseConfig {
            url: settings.database_url()?,
            max_connections: settings.database.max_connections,
            min_connections: settings.database.min_connections,
            ..DatabaseConfig::default()
        };
        Self::connect_with(&config).await
    }

    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self> {
        let (pool, backend) = connection::create_pool(config).await?;
        connection::run_migrations(&pool, backend).await?;
        Ok(Self::new(pool, backend))
    }

    /// Settings of a group, inserting the defaults on first contact
    pub async fn get_group(&self, chat_id: i64) -> Result<GroupSettings> {
        if let Some(settings) = self.groups.find(chat_id).await? {
            return Ok(settings);
        }

        if self.groups.insert_default(chat_id).await? {
            info!(chat_id = chat_id, "Created default settings for group");
        }

        self.groups
            .find(chat_id)
            .await?
            .ok_or_else(|| AdhkarError::Internal(format!("Settings row for {} vanished", chat_id)))
    }

    /// Write one field named by its column.
    ///
    /// Unknown names fail with `InvalidField` and invalid values fail before
    /// anything is written.
    pub async fn update_group(&self, chat_id: i64, field: &str, value: SettingValue) -> Result<GroupSettings> {
        let field: SettingField = field.parse()?;
        self.update_field(chat_id, field, value).await
    }

    /// Typed variant of [`SettingsStore::update_group`]
    pub async fn update_field(&self, chat_id: i64, field: SettingField, value: SettingValue) -> Result<GroupSettings> {
        let stored = field.normalize(&value)?;
        self.groups.upsert_field(chat_id, field, stored).await?;
        debug!(chat_id = chat_id, field = field.column(), value = %value, "Group setting updated");

        self.get_group(chat_id).await
    }

    /// Flip the master switch
    pub async fn set_enabled(&self, chat_id: i64, enabled: bool) -> Result<GroupSettings> {
        self.update_field(chat_id, SettingField::Enabled, SettingValue::Flag(enabled)).await
    }

    pub async fn list_enabled_groups(&self) -> Result<Vec<i64>> {
        self.groups.list_enabled().await
    }

    /// Create or refresh a cached admin; `primary = None` keeps the stored flag
    pub async fn upsert_admin(
        &self,
        chat_id: i64,
        user_id: i64,
        display: &AdminDisplay,
        primary: Option<bool>,
    ) -> Result<AdminRecord> {
        self.admins.upsert(chat_id, user_id, display, primary).await
    }

    pub async fn is_admin(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        self.admins.is_admin(chat_id, user_id).await
    }

    /// Replace the cached admin set with the platform's list
    pub async fn sync_admins(&self, chat_id: i64, admins: &[AdminEntry]) -> Result<usize> {
        let count = self.admins.sync(chat_id, admins).await?;
        info!(chat_id = chat_id, admins = count, "Admin cache re-synced");
        Ok(count)
    }

    pub async fn list_admins(&self, chat_id: i64) -> Result<Vec<AdminRecord>> {
        self.admins.list(chat_id).await
    }

    pub async fn count_groups(&self) -> Result<i64> {
        self.groups.count().await
    }

    pub async fn count_enabled_groups(&self) -> Result<i64> {
        self.groups.count_enabled().await
    }

    pub async fn health_check(&self) -> Result<()> {
        connection::health_check(&self.pool).await
    }

    /// Close the pool; pending acquires fail afterwards
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
