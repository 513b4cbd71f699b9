//! Jobs materialised from group settings

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::models::{Category, GroupSettings, TimeSlot};
use crate::utils::helpers::{parse_hhmm, validate_interval};
use super::trigger::Trigger;

/// Job identifier: `<category>_<group_id>`
pub fn job_id(category: Category, group_id: i64) -> String {
    format!("{}_{}", category.as_str(), group_id)
}

/// One registered (group, category) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: String,
    pub group_id: i64,
    pub category: Category,
    pub trigger: Trigger,
    pub next_fire: DateTime<Utc>,
}

impl Job {
    pub fn new(group_id: i64, category: Category, trigger: Trigger, now: DateTime<Utc>) -> Self {
        Self {
            id: job_id(category, group_id),
            group_id,
            category,
            trigger,
            next_fire: trigger.next_after(now),
        }
    }
}

/// Trigger for `category` read from the group row.
///
/// `None` when the stored time or interval fails validation.
pub fn trigger_for(settings: &GroupSettings, category: Category) -> Option<Trigger> {
    let daily = |slot: TimeSlot| {
        let raw = settings.time_of(slot);
        match parse_hhmm(raw) {
            Ok(at) => Some(Trigger::Daily { at }),
            Err(e) => {
                warn!(chat_id = settings.chat_id, category = %category, value = raw, error = %e, "Skipping job with invalid time");
                None
            }
        }
    };

    match category {
        Category::Morning => daily(TimeSlot::Morning),
        Category::Evening => daily(TimeSlot::Evening),
        Category::Sleep => daily(TimeSlot::Sleep),
        Category::FridayKahf => Some(Trigger::friday_kahf()),
        Category::FridayDua => Some(Trigger::friday_dua()),
        Category::Diverse => match validate_interval(settings.diverse_interval_minutes) {
            Ok(minutes) => Some(Trigger::Interval { minutes }),
            Err(e) => {
                warn!(chat_id = settings.chat_id, category = %category, error = %e, "Skipping job with invalid interval");
                None
            }
        },
    }
}

/// Jobs an enabled group should have; empty for a disabled group
pub fn jobs_for(settings: &GroupSettings, now: DateTime<Utc>) -> Vec<Job> {
    if !settings.enabled {
        return Vec::new();
    }

    Category::ALL
        .into_iter()
        .filter(|category| settings.is_on(*category))
        .filter_map(|category| {
            trigger_for(settings, category).map(|trigger| Job::new(settings.chat_id, category, trigger, now))
        })
        .collect()
}
