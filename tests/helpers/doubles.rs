//! Scripted platform doubles

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use AdhkarBot::content::ContentItem;
use AdhkarBot::models::{AdminDisplay, AdminEntry, Category};
use AdhkarBot::services::{AdminSource, DeliveryOutcome, Gateway};
use AdhkarBot::Result;

/// One call to [`ScriptedGateway::send`]
#[derive(Debug, Clone)]
pub struct SendRecord {
    pub chat_id: i64,
    pub category: Category,
    pub body: String,
    pub has_media: bool,
    pub outcome: DeliveryOutcome,
    pub at: Instant,
}

/// Gateway answering from a script; `Ok` once the script runs out
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<DeliveryOutcome>>,
    sent: Mutex<Vec<SendRecord>>,
    latency: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(outcomes: impl IntoIterator<Item = DeliveryOutcome>) -> Self {
        let gateway = Self::new();
        gateway.push(outcomes);
        gateway
    }

    /// Every send takes `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, outcomes: impl IntoIterator<Item = DeliveryOutcome>) {
        self.script.lock().unwrap().extend(outcomes);
    }

    /// Every attempt in call order
    pub fn attempts(&self) -> Vec<SendRecord> {
        self.sent.lock().unwrap().clone()
    }

    /// Successful attempts in call order
    pub fn delivered(&self) -> Vec<SendRecord> {
        self.attempts()
            .into_iter()
            .filter(|record| record.outcome == DeliveryOutcome::Ok)
            .collect()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn send(&self, chat_id: i64, category: Category, item: &ContentItem) -> DeliveryOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(DeliveryOutcome::Ok);
        self.sent.lock().unwrap().push(SendRecord {
            chat_id,
            category,
            body: item.body.clone(),
            has_media: item.media.is_some(),
            outcome: outcome.clone(),
            at: Instant::now(),
        });
        outcome
    }
}

/// Fixed administrator lists per chat
#[derive(Default)]
pub struct StaticAdmins {
    chats: HashMap<i64, Vec<AdminEntry>>,
}

impl StaticAdmins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user_id` as an administrator of `chat_id`
    pub fn with_admin(mut self, chat_id: i64, user_id: i64, is_owner: bool) -> Self {
        self.chats.entry(chat_id).or_default().push(admin_entry(user_id, is_owner));
        self
    }
}

#[async_trait]
impl AdminSource for StaticAdmins {
    async fn fetch_admins(&self, chat_id: i64) -> Result<Vec<AdminEntry>> {
        Ok(self.chats.get(&chat_id).cloned().unwrap_or_default())
    }
}

pub fn admin_entry(user_id: i64, is_owner: bool) -> AdminEntry {
    AdminEntry {
        user_id,
        is_owner,
        display: AdminDisplay {
            username: Some(format!("admin{}", user_id)),
            first_name: Some("Admin".to_string()),
            last_name: None,
        },
    }
}
