//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod group;
pub mod admin;

// Re-export commonly used models
pub use group::{Category, FieldKind, GroupSettings, MediaType, SettingField, SettingValue, StoredValue, TimeSlot};
pub use admin::{AdminDisplay, AdminEntry, AdminRecord};
