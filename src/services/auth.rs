//! Admin verification
//!
//! Read-through over the store's admin cache: a cached entry is trusted
//! without calling the platform, and a miss fetches the administrator list
//! once and upserts it.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::database::SettingsStore;
use crate::models::{AdminDisplay, AdminEntry};
use crate::utils::errors::{AdhkarError, Result};

/// Source of truth for a group's administrators
#[async_trait]
pub trait AdminSource: Send + Sync {
    async fn fetch_admins(&self, chat_id: i64) -> Result<Vec<AdminEntry>>;
}

#[async_trait]
impl AdminSource for Bot {
    async fn fetch_admins(&self, chat_id: i64) -> Result<Vec<AdminEntry>> {
        let members = self.get_chat_administrators(ChatId(chat_id)).await?;

        Ok(members
            .into_iter()
            .map(|member| AdminEntry {
                user_id: member.user.id.0 as i64,
                is_owner: member.is_owner(),
                display: AdminDisplay {
                    username: member.user.username.clone(),
                    first_name: Some(member.user.first_name.clone()),
                    last_name: member.user.last_name.clone(),
                },
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: SettingsStore,
    source: Arc<dyn AdminSource>,
}

impl AuthService {
    pub fn new(store: SettingsStore, source: Arc<dyn AdminSource>) -> Self {
        Self { store, source }
    }

    /// Whether `user_id` administers `chat_id`.
    ///
    /// A platform failure on a cache miss counts as "not an admin".
    pub async fn is_admin(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        if self.store.is_admin(chat_id, user_id).await? {
            debug!(chat_id = chat_id, user_id = user_id, "Admin cache hit");
            return Ok(true);
        }

        let admins = match self.source.fetch_admins(chat_id).await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(chat_id = chat_id, user_id = user_id, error = %e, "Could not fetch administrators");
                return Ok(false);
            }
        };

        for admin in &admins {
            let primary = admin.is_owner.then_some(true);
            self.store
                .upsert_admin(chat_id, admin.user_id, &admin.display, primary)
                .await?;
        }
        debug!(chat_id = chat_id, admins = admins.len(), "Admin cache filled from platform");

        Ok(admins.iter().any(|admin| admin.user_id == user_id))
    }

    /// Fail with `NotAdmin` unless the user administers the group
    pub async fn require_admin(&self, chat_id: i64, user_id: i64) -> Result<()> {
        if self.is_admin(chat_id, user_id).await? {
            Ok(())
        } else {
            Err(AdhkarError::NotAdmin { chat_id, user_id })
        }
    }

    /// Replace the cached admin set with the platform's current list
    pub async fn resync(&self, chat_id: i64) -> Result<usize> {
        let admins = self.source.fetch_admins(chat_id).await?;
        let count = self.store.sync_admins(chat_id, &admins).await?;
        info!(chat_id = chat_id, admins = count, "Administrators re-synced");
        Ok(count)
    }
}
