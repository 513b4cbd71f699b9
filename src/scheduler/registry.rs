//! Live job set
//!
//! The registry is only ever replaced wholesale, so the timeline never sees a
//! half-built job set.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::job::Job;

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<BTreeMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in a freshly built job set.
    ///
    /// Jobs whose trigger did not change keep their pending fire time.
    pub fn replace(&self, mut fresh: BTreeMap<String, Job>) -> usize {
        let mut jobs = self.lock();
        for (id, job) in fresh.iter_mut() {
            if let Some(existing) = jobs.get(id) {
                if existing.trigger == job.trigger {
                    job.next_fire = existing.next_fire;
                }
            }
        }
        *jobs = fresh;
        jobs.len()
    }

    /// Remove and return the jobs due at `now`, re-armed for their next instant
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<Job> {
        let mut jobs = self.lock();
        jobs.values_mut()
            .filter(|job| job.next_fire <= now)
            .map(|job| {
                let due = job.clone();
                job.next_fire = job.trigger.advance(due.next_fire, now);
                due
            })
            .collect()
    }

    /// Earliest pending fire time
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.lock().values().map(|job| job.next_fire).min()
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Job> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
