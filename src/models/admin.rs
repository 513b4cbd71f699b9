//! Admin cache model

use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row, ValueRef};

/// Display fields of an administrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDisplay {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Cached administrator of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_primary: bool,
    pub added_at: i64,
}

/// Administrator as reported by the platform during a re-sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEntry {
    pub user_id: i64,
    pub display: AdminDisplay,
    /// Chat owner; becomes the group's primary admin
    pub is_owner: bool,
}

impl<'r> FromRow<'r, AnyRow> for AdminRecord {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            chat_id: row.try_get("chat_id")?,
            user_id: row.try_get("user_id")?,
            username: optional_text(row, "username")?,
            first_name: optional_text(row, "first_name")?,
            last_name: optional_text(row, "last_name")?,
            is_primary: row.try_get::<i64, _>("is_primary")? != 0,
            added_at: row.try_get("added_at")?,
        })
    }
}

/// The Any driver cannot decode NULL into `Option<String>`, so check the raw value first
fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, sqlx::Error> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    row.try_get(column).map(Some)
}
