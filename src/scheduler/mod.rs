//! Scheduler core
//!
//! Holds one job per enabled (group, category) pair and fires it on a timeline
//! in the fixed `Asia/Riyadh` zone.

pub mod engine;
pub mod fire;
pub mod job;
pub mod registry;
pub mod trigger;

pub use engine::Scheduler;
pub use fire::{FireOutcome, FirePolicy, FireReport};
pub use job::{job_id, jobs_for, Job};
pub use trigger::{local_offset, Trigger, TIMEZONE_NAME};
