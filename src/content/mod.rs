//! Content provider
//!
//! Devotional texts per category, loaded once at startup.

pub mod catalog;

pub use catalog::{ContentCatalog, ContentItem, MediaRef};
