//! Services module
//!
//! Delivery, admin verification and the control surface, plus the
//! process-wide context shared by handlers and the HTTP surface.

pub mod auth;
pub mod control;
pub mod gateway;

// Re-export commonly used services
pub use auth::{AdminSource, AuthService};
pub use control::{resolve_target, ControlSurface, Mutation};
pub use gateway::{DeliveryOutcome, Gateway, TelegramGateway};

use std::sync::Arc;

use crate::config::Settings;
use crate::content::ContentCatalog;
use crate::database::SettingsStore;
use crate::i18n::I18n;
use crate::scheduler::Scheduler;

/// Long-lived resources built once during startup
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub store: SettingsStore,
    pub content: Arc<ContentCatalog>,
    pub scheduler: Scheduler,
    pub control: ControlSurface,
    pub i18n: Arc<I18n>,
    /// Bot username without `@`, used for deep links
    pub bot_username: String,
}

impl AppContext {
    /// Wire the context from its parts
    pub fn new(
        settings: Settings,
        store: SettingsStore,
        content: Arc<ContentCatalog>,
        gateway: Arc<dyn Gateway>,
        admins: Arc<dyn AdminSource>,
        i18n: I18n,
        bot_username: String,
    ) -> Self {
        let scheduler = Scheduler::new(store.clone(), Arc::clone(&content), gateway, &settings.scheduler);
        let auth = AuthService::new(store.clone(), admins);
        let control = ControlSurface::new(store.clone(), auth, scheduler.clone());

        Self {
            settings: Arc::new(settings),
            store,
            content,
            scheduler,
            control,
            i18n: Arc::new(i18n),
            bot_username,
        }
    }

    /// Short alias for translations
    pub fn t(&self, key: &str) -> String {
        self.i18n.t(key, None)
    }
}
