//! Test helpers module
//!
//! Temporary stores, scripted platform doubles and a wired application
//! context for integration tests.

#![allow(dead_code)]

pub mod database;
pub mod doubles;
pub mod telegram_mock;

pub use database::*;
pub use doubles::*;
pub use telegram_mock::*;

use std::sync::{Arc, Once};

use AdhkarBot::config::Settings;
use AdhkarBot::content::ContentCatalog;
use AdhkarBot::database::SettingsStore;
use AdhkarBot::i18n::I18n;
use AdhkarBot::services::AppContext;

pub const TEST_GROUP_ID: i64 = -1001234567890;
pub const TEST_ADMIN_ID: i64 = 111;
pub const TEST_MEMBER_ID: i64 = 222;

static INIT: Once = Once::new();

/// Install a test subscriber once per binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Small catalogue whose batches are predictable
pub const SAMPLE_CATALOGUE: &str = r#"{
    "morning": { "entries": ["m1", "m2", "m3"], "batch_size": 3, "media": { "audio": ["https://cdn.example/morning.mp3"] } },
    "evening": { "entries": ["e1", "e2", "e3"], "batch_size": 3 },
    "friday_kahf": { "entries": ["kahf"] },
    "friday_dua": { "entries": ["dua"] },
    "sleep": { "entries": ["sleep1", "sleep2"] },
    "diverse": { "entries": ["d1", "d2"], "media": { "image": ["https://cdn.example/d.png"] } }
}"#;

pub fn sample_catalogue() -> ContentCatalog {
    ContentCatalog::from_json(SAMPLE_CATALOGUE).expect("sample catalogue")
}

pub fn arabic_i18n() -> I18n {
    I18n::from_json(include_str!("../../translations/ar.json")).expect("translations")
}

/// Settings with short pacing and backoff
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.bot.token = TEST_BOT_TOKEN.to_string();
    settings.scheduler.pacing_ms = 50;
    settings.scheduler.transient_backoff_ms = 20;
    settings
}

/// Fully wired context over a temporary store and scripted gateway
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub gateway: Arc<ScriptedGateway>,
    pub store: SettingsStore,
    _store: TestStore,
}

impl TestApp {
    pub async fn new(admins: StaticAdmins) -> Self {
        Self::with_gateway(admins, ScriptedGateway::new()).await
    }

    pub async fn with_gateway(admins: StaticAdmins, gateway: ScriptedGateway) -> Self {
        Self::with_catalogue(admins, gateway, sample_catalogue()).await
    }

    pub async fn with_catalogue(admins: StaticAdmins, gateway: ScriptedGateway, catalogue: ContentCatalog) -> Self {
        init_tracing();
        let test_store = TestStore::new().await;
        let store = test_store.store.clone();
        let gateway = Arc::new(gateway);

        let ctx = AppContext::new(
            fast_settings(),
            store.clone(),
            Arc::new(catalogue),
            gateway.clone(),
            Arc::new(admins),
            arabic_i18n(),
            "adhkar_test_bot".to_string(),
        );

        Self { ctx: Arc::new(ctx), gateway, store, _store: test_store }
    }

    /// Admin of [`TEST_GROUP_ID`] is [`TEST_ADMIN_ID`]
    pub async fn with_default_admin() -> Self {
        Self::new(StaticAdmins::new().with_admin(TEST_GROUP_ID, TEST_ADMIN_ID, true)).await
    }

    /// Ids of the jobs registered for `group_id`
    pub fn job_ids_for(&self, group_id: i64) -> Vec<String> {
        let suffix = format!("_{}", group_id);
        self.ctx
            .scheduler
            .jobs()
            .into_iter()
            .map(|job| job.id)
            .filter(|id| id.ends_with(&suffix))
            .collect()
    }
}
