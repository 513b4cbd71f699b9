//! One execution of a job
//!
//! Gateway failures are handled here and never leave a fire: the caller only
//! learns what happened through the returned [`FireReport`].

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::content::{ContentCatalog, ContentItem};
use crate::database::SettingsStore;
use crate::models::Category;
use crate::services::gateway::{DeliveryOutcome, Gateway};
use crate::utils::logging::log_group_demoted;

/// Retry and pacing policy of a fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirePolicy {
    /// Pause between successive messages of a batch
    pub pacing: Duration,
    pub max_rate_limit_retries: u32,
    pub transient_retries: u32,
    /// First transient backoff; doubled on every further attempt
    pub transient_backoff: Duration,
}

/// Upper bound of a single transient backoff
const MAX_TRANSIENT_BACKOFF: Duration = Duration::from_secs(300);

impl FirePolicy {
    /// Backoff before the `attempt`-th (1-based) transient retry
    pub fn transient_backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.transient_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_TRANSIENT_BACKOFF)
            .min(MAX_TRANSIENT_BACKOFF)
    }
}

impl From<&SchedulerConfig> for FirePolicy {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            pacing: Duration::from_millis(config.pacing_ms),
            max_rate_limit_retries: config.max_rate_limit_retries,
            transient_retries: config.transient_retries,
            transient_backoff: Duration::from_millis(config.transient_backoff_ms),
        }
    }
}

impl Default for FirePolicy {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(1500),
            max_rate_limit_retries: 5,
            transient_retries: 3,
            transient_backoff: Duration::from_secs(2),
        }
    }
}

/// How a fire ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// Every message of the batch was handed over
    Completed,
    /// Group or feature switched off since the job was registered
    Skipped,
    /// Delivery showed the bot can no longer post; the group is now disabled
    GroupDisabled(DeliveryOutcome),
    /// The rest of the batch was dropped
    Abandoned(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub group_id: i64,
    pub category: Category,
    pub delivered: usize,
    pub outcome: FireOutcome,
}

enum Step {
    Delivered,
    Dropped,
    Disable(DeliveryOutcome),
    GiveUp(String),
}

/// Collaborators a fire needs
pub struct FireContext<'a> {
    pub store: &'a SettingsStore,
    pub content: &'a ContentCatalog,
    pub gateway: &'a dyn Gateway,
    pub policy: FirePolicy,
}

impl FireContext<'_> {
    /// Deliver the batch of `category` to `group_id`
    pub async fn run(&self, group_id: i64, category: Category) -> FireReport {
        let report = |delivered, outcome| FireReport { group_id, category, delivered, outcome };

        let settings = match self.store.get_group(group_id).await {
            Ok(settings) => settings,
            Err(e) => {
                error!(chat_id = group_id, category = %category, error = %e, "Store unavailable, abandoning fire");
                return report(0, FireOutcome::Abandoned(e.to_string()));
            }
        };

        if !settings.enabled || !settings.is_on(category) {
            debug!(chat_id = group_id, category = %category, "Feature switched off, skipping fire");
            return report(0, FireOutcome::Skipped);
        }

        let items = match self.content.batch_for(category, &settings) {
            Ok(items) => items,
            Err(e) => {
                warn!(chat_id = group_id, category = %category, error = %e, "No content to send");
                return report(0, FireOutcome::Abandoned(e.to_string()));
            }
        };

        let mut delivered = 0;
        let mut sent_any = false;
        for item in &items {
            let mut handed_over = true;
            for part in item.parts() {
                if sent_any {
                    sleep(self.policy.pacing).await;
                }
                sent_any = true;

                match self.deliver(group_id, category, &part).await {
                    Step::Delivered => {}
                    Step::Dropped => handed_over = false,
                    Step::Disable(outcome) => {
                        self.demote(group_id, &outcome).await;
                        return report(delivered, FireOutcome::GroupDisabled(outcome));
                    }
                    Step::GiveUp(reason) => return report(delivered, FireOutcome::Abandoned(reason)),
                }
            }
            if handed_over {
                delivered += 1;
            }
        }

        info!(chat_id = group_id, category = %category, delivered = delivered, "Fire completed");
        report(delivered, FireOutcome::Completed)
    }

    /// Send one part, retrying only that part
    async fn deliver(&self, group_id: i64, category: Category, part: &ContentItem) -> Step {
        let mut rate_limited = 0;
        let mut transient = 0;

        loop {
            let outcome = self.gateway.send(group_id, category, part).await;
            if outcome.disables_group() {
                return Step::Disable(outcome);
            }

            match outcome {
                DeliveryOutcome::Ok => return Step::Delivered,
                DeliveryOutcome::RateLimited(after) => {
                    rate_limited += 1;
                    if rate_limited > self.policy.max_rate_limit_retries {
                        return Step::GiveUp(format!("rate limited {} times", rate_limited));
                    }
                    info!(chat_id = group_id, category = %category, retry_after = ?after, "Rate limited, pausing batch");
                    sleep(after).await;
                }
                DeliveryOutcome::Transient(detail) => {
                    transient += 1;
                    if transient > self.policy.transient_retries {
                        return Step::GiveUp(format!("transient failure: {}", detail));
                    }
                    let backoff = self.policy.transient_backoff_for(transient);
                    debug!(chat_id = group_id, attempt = transient, backoff = ?backoff, "Retrying after transient failure");
                    sleep(backoff).await;
                }
                DeliveryOutcome::Forbidden(detail) => {
                    return Step::GiveUp(format!("forbidden: {}", detail));
                }
                rejected => {
                    warn!(chat_id = group_id, category = %category, outcome = %rejected, "Message rejected, continuing batch");
                    return Step::Dropped;
                }
            }
        }
    }

    async fn demote(&self, group_id: i64, outcome: &DeliveryOutcome) {
        log_group_demoted(group_id, outcome.label());
        if let Err(e) = self.store.set_enabled(group_id, false).await {
            error!(chat_id = group_id, error = %e, "Failed to disable group after delivery failure");
        }
    }
}
