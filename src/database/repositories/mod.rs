//! Database repositories module
//! 
//! This module contains all repository implementations for data access

pub mod group;
pub mod admin;

// Re-export repositories
pub use group::GroupRepository;
pub use admin::AdminRepository;
