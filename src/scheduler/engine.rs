//! Timeline and worker pool
//!
//! A single timeline task wakes at the earliest pending fire and hands due
//! jobs to workers bounded by a semaphore. `reschedule()` rebuilds the job
//! set from the store and swaps it in while fires keep running.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::content::ContentCatalog;
use crate::database::SettingsStore;
use crate::models::Category;
use crate::services::gateway::Gateway;
use crate::utils::errors::Result;

use super::fire::{FireContext, FireOutcome, FirePolicy, FireReport};
use super::job::{job_id, jobs_for, Job};
use super::registry::JobRegistry;

/// Longest the timeline sleeps without re-checking the registry
const MAX_IDLE: Duration = Duration::from_secs(30);

/// How long shutdown waits for in-flight fires
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

struct Inner {
    store: SettingsStore,
    content: Arc<ContentCatalog>,
    gateway: Arc<dyn Gateway>,
    policy: FirePolicy,
    registry: JobRegistry,
    /// Serialises whole reschedule passes
    gate: tokio::sync::Mutex<()>,
    wake: Notify,
    running: AtomicBool,
    workers: Arc<Semaphore>,
    worker_count: usize,
    in_flight: Mutex<HashSet<String>>,
    timeline: Mutex<Option<JoinHandle<()>>>,
}

/// Removes a job from the in-flight set when its fire ends
struct InFlightGuard {
    inner: Arc<Inner>,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        store: SettingsStore,
        content: Arc<ContentCatalog>,
        gateway: Arc<dyn Gateway>,
        config: &SchedulerConfig,
    ) -> Self {
        let worker_count = config.workers.max(1);
        Self {
            inner: Arc::new(Inner {
                store,
                content,
                gateway,
                policy: FirePolicy::from(config),
                registry: JobRegistry::new(),
                gate: tokio::sync::Mutex::new(()),
                wake: Notify::new(),
                running: AtomicBool::new(false),
                workers: Arc::new(Semaphore::new(worker_count)),
                worker_count,
                in_flight: Mutex::new(HashSet::new()),
                timeline: Mutex::new(None),
            }),
        }
    }

    /// Start the timeline task; a second call is a no-op
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { Inner::run_timeline(inner).await });
        *self.inner.timeline.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!(workers = self.inner.worker_count, "Scheduler started");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Rebuild every job from the store and swap the set in atomically.
    ///
    /// Returns the number of registered jobs.
    pub async fn reschedule(&self) -> Result<usize> {
        Inner::reschedule(&self.inner).await
    }

    /// Registered jobs ordered by id
    pub fn jobs(&self) -> Vec<Job> {
        self.inner.registry.snapshot()
    }

    pub fn job(&self, category: Category, group_id: i64) -> Option<Job> {
        self.inner.registry.get(&job_id(category, group_id))
    }

    pub fn job_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Run one fire now, outside the timeline.
    ///
    /// Follows the same demotion path as a timed fire.
    pub async fn fire(&self, group_id: i64, category: Category) -> FireReport {
        Inner::fire(&self.inner, group_id, category).await
    }

    /// Stop the timeline and wait briefly for in-flight fires
    pub async fn shutdown(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.wake.notify_one();

        let handle = self.inner.timeline.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduler timeline ended abnormally");
            }
        }

        let permits = u32::try_from(self.inner.worker_count).unwrap_or(u32::MAX);
        match tokio::time::timeout(SHUTDOWN_GRACE, self.inner.workers.acquire_many(permits)).await {
            Ok(_) => debug!("All fires finished"),
            Err(_) => warn!("Shutting down with fires still in flight"),
        }

        self.inner.registry.clear();
        info!("Scheduler stopped");
    }
}

impl Inner {
    async fn reschedule(self: &Arc<Self>) -> Result<usize> {
        let _pass = self.gate.lock().await;
        let now = Utc::now();

        let mut fresh = BTreeMap::new();
        for group_id in self.store.list_enabled_groups().await? {
            let settings = match self.store.get_group(group_id).await {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(chat_id = group_id, error = %e, "Skipping group during reschedule");
                    continue;
                }
            };
            for job in jobs_for(&settings, now) {
                fresh.insert(job.id.clone(), job);
            }
        }

        let count = self.registry.replace(fresh);
        self.wake.notify_one();
        info!(jobs = count, "Jobs rescheduled");
        Ok(count)
    }

    async fn fire(self: &Arc<Self>, group_id: i64, category: Category) -> FireReport {
        let context = FireContext {
            store: &self.store,
            content: &self.content,
            gateway: self.gateway.as_ref(),
            policy: self.policy,
        };
        let report = context.run(group_id, category).await;

        if matches!(report.outcome, FireOutcome::GroupDisabled(_)) {
            if let Err(e) = self.reschedule().await {
                error!(chat_id = group_id, error = %e, "Reschedule after demotion failed");
            }
        }
        report
    }

    async fn run_timeline(self: Arc<Self>) {
        debug!("Scheduler timeline running");

        while self.running.load(Ordering::SeqCst) {
            let now = Utc::now();
            for job in self.registry.take_due(now) {
                self.dispatch(job);
            }

            let idle = self
                .registry
                .next_due()
                .and_then(|at| (at - Utc::now()).to_std().ok())
                .unwrap_or(MAX_IDLE)
                .min(MAX_IDLE);

            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = self.wake.notified() => {}
            }
        }

        debug!("Scheduler timeline stopped");
    }

    /// Hand a due job to a worker unless its previous fire is still running.
    ///
    /// Returns whether a fire was started.
    fn dispatch(self: &Arc<Self>, job: Job) -> bool {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if !in_flight.insert(job.id.clone()) {
                warn!(job_id = %job.id, "Previous fire still running, skipping this instant");
                return false;
            }
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = InFlightGuard { inner: Arc::clone(&inner), id: job.id.clone() };
            let _permit = match Arc::clone(&inner.workers).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            debug!(job_id = %job.id, "Firing job");
            let report = inner.fire(job.group_id, job.category).await;
            debug!(job_id = %job.id, delivered = report.delivered, outcome = ?report.outcome, "Job fire finished");
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::content::ContentItem;
    use crate::database::DatabaseConfig;
    use crate::scheduler::trigger::Trigger;
    use crate::services::gateway::DeliveryOutcome;

    const GROUP: i64 = -1001234567890;

    const CATALOGUE: &str = r#"{
        "morning": { "entries": ["m1"] },
        "evening": { "entries": ["e1"] },
        "friday_kahf": { "entries": ["kahf"] },
        "friday_dua": { "entries": ["dua"] },
        "sleep": { "entries": ["sleep"] },
        "diverse": { "entries": ["d1"] }
    }"#;

    /// Counts sends, each taking `latency`
    struct SlowGateway {
        latency: Duration,
        sends: AtomicUsize,
    }

    #[async_trait]
    impl Gateway for SlowGateway {
        async fn send(&self, _chat_id: i64, _category: Category, _item: &ContentItem) -> DeliveryOutcome {
            tokio::time::sleep(self.latency).await;
            self.sends.fetch_add(1, Ordering::SeqCst);
            DeliveryOutcome::Ok
        }
    }

    async fn scheduler(latency: Duration) -> (Scheduler, Arc<SlowGateway>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("engine.db").display()),
            max_connections: 2,
            min_connections: 1,
            ..DatabaseConfig::default()
        };
        let store = SettingsStore::connect_with(&config).await.unwrap();
        store.set_enabled(GROUP, true).await.unwrap();

        let gateway = Arc::new(SlowGateway { latency, sends: AtomicUsize::new(0) });
        let scheduler = Scheduler::new(
            store,
            Arc::new(ContentCatalog::from_json(CATALOGUE).unwrap()),
            gateway.clone(),
            &SchedulerConfig {
                pacing_ms: 0,
                workers: 2,
                max_rate_limit_retries: 1,
                transient_retries: 1,
                transient_backoff_ms: 10,
            },
        );
        (scheduler, gateway, dir)
    }

    fn due_job() -> Job {
        let now = Utc::now();
        let mut job = Job::new(GROUP, Category::Diverse, Trigger::Interval { minutes: 60 }, now);
        job.next_fire = now - chrono::Duration::seconds(1);
        job
    }

    async fn wait_for_sends(gateway: &SlowGateway, count: usize) {
        for _ in 0..100 {
            if gateway.sends.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_timeline_fires_due_job_and_rearms_it() {
        let (scheduler, gateway, _dir) = scheduler(Duration::ZERO).await;
        let job = due_job();
        let id = job.id.clone();
        scheduler.inner.registry.replace(BTreeMap::from([(id.clone(), job)]));

        let started = Utc::now();
        scheduler.start();
        wait_for_sends(&gateway, 1).await;

        assert_eq!(gateway.sends.load(Ordering::SeqCst), 1);
        let rearmed = scheduler.inner.registry.get(&id).unwrap();
        assert!(rearmed.next_fire > started + chrono::Duration::minutes(59));

        scheduler.shutdown().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_overlapping_fire_of_same_job_is_coalesced() {
        let (scheduler, gateway, _dir) = scheduler(Duration::from_millis(300)).await;
        let inner = &scheduler.inner;

        assert!(inner.dispatch(due_job()));
        assert!(!inner.dispatch(due_job()));

        wait_for_sends(&gateway, 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 1);

        // The guard released the job once its fire ended
        assert!(inner.dispatch(due_job()));
        wait_for_sends(&gateway, 2).await;
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 2);
    }
}
