//! Group settings model
//!
//! One row per chat. The writable columns are named by [`SettingField`],
//! which is the whitelist every mutation goes through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};

use crate::utils::errors::{AdhkarError, Result};
use crate::utils::helpers::{format_hhmm, parse_hhmm, validate_interval};

/// Content streams the bot can post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Morning,
    Evening,
    FridayKahf,
    FridayDua,
    Sleep,
    Diverse,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Morning,
        Category::Evening,
        Category::Sleep,
        Category::FridayKahf,
        Category::FridayDua,
        Category::Diverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Morning => "morning",
            Category::Evening => "evening",
            Category::FridayKahf => "friday_kahf",
            Category::FridayDua => "friday_dua",
            Category::Sleep => "sleep",
            Category::Diverse => "diverse",
        }
    }

    /// Toggle column controlling this stream
    pub fn toggle(&self) -> SettingField {
        match self {
            Category::Morning => SettingField::Morning,
            Category::Evening => SettingField::Evening,
            Category::FridayKahf => SettingField::FridayKahf,
            Category::FridayDua => SettingField::FridayDua,
            Category::Sleep => SettingField::Sleep,
            Category::Diverse => SettingField::Diverse,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AdhkarError::InvalidValue { field: "category".into(), value: s.into() })
    }
}

/// Preferred attachment kind for the random stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Audio,
    Video,
    Document,
}

impl MediaType {
    pub const ALL: [MediaType; 5] = [
        MediaType::Text,
        MediaType::Image,
        MediaType::Audio,
        MediaType::Video,
        MediaType::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "text",
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Document => "document",
        }
    }
}

impl FromStr for MediaType {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AdhkarError::InvalidValue {
                field: SettingField::DiverseMediaType.column().into(),
                value: s.into(),
            })
    }
}

/// Daily time slots configurable by administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Evening,
    Sleep,
}

impl TimeSlot {
    pub fn field(&self) -> SettingField {
        match self {
            TimeSlot::Morning => SettingField::MorningTime,
            TimeSlot::Evening => SettingField::EveningTime,
            TimeSlot::Sleep => SettingField::SleepTime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Evening => "evening",
            TimeSlot::Sleep => "sleep",
        }
    }
}

impl FromStr for TimeSlot {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(TimeSlot::Morning),
            "evening" => Ok(TimeSlot::Evening),
            "sleep" => Ok(TimeSlot::Sleep),
            other => Err(AdhkarError::InvalidField(other.to_string())),
        }
    }
}

/// Whitelisted writable columns of `group_settings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    Enabled,
    Morning,
    Evening,
    FridayKahf,
    FridayDua,
    Sleep,
    Diverse,
    MorningTime,
    EveningTime,
    SleepTime,
    DiverseInterval,
    DiverseMediaType,
    SendMediaWithMorning,
    SendMediaWithEvening,
    SendMediaWithFriday,
}

/// Value domain of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Flag,
    Time,
    Interval,
    Media,
}

impl SettingField {
    pub const ALL: [SettingField; 15] = [
        SettingField::Enabled,
        SettingField::Morning,
        SettingField::Evening,
        SettingField::FridayKahf,
        SettingField::FridayDua,
        SettingField::Sleep,
        SettingField::Diverse,
        SettingField::MorningTime,
        SettingField::EveningTime,
        SettingField::SleepTime,
        SettingField::DiverseInterval,
        SettingField::DiverseMediaType,
        SettingField::SendMediaWithMorning,
        SettingField::SendMediaWithEvening,
        SettingField::SendMediaWithFriday,
    ];

    /// Column name; the only identifiers ever interpolated into SQL
    pub fn column(&self) -> &'static str {
        match self {
            SettingField::Enabled => "enabled",
            SettingField::Morning => "morning",
            SettingField::Evening => "evening",
            SettingField::FridayKahf => "friday_kahf",
            SettingField::FridayDua => "friday_dua",
            SettingField::Sleep => "sleep",
            SettingField::Diverse => "diverse",
            SettingField::MorningTime => "morning_time",
            SettingField::EveningTime => "evening_time",
            SettingField::SleepTime => "sleep_time",
            SettingField::DiverseInterval => "diverse_interval_minutes",
            SettingField::DiverseMediaType => "diverse_media_type",
            SettingField::SendMediaWithMorning => "send_media_with_morning",
            SettingField::SendMediaWithEvening => "send_media_with_evening",
            SettingField::SendMediaWithFriday => "send_media_with_friday",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            SettingField::MorningTime | SettingField::EveningTime | SettingField::SleepTime => FieldKind::Time,
            SettingField::DiverseInterval => FieldKind::Interval,
            SettingField::DiverseMediaType => FieldKind::Media,
            _ => FieldKind::Flag,
        }
    }

    /// Whether a change to this field requires re-materialising jobs
    pub fn affects_schedule(&self) -> bool {
        !matches!(
            self,
            SettingField::DiverseMediaType
                | SettingField::SendMediaWithMorning
                | SettingField::SendMediaWithEvening
                | SettingField::SendMediaWithFriday
        )
    }

    /// Check a value against this field's domain and produce the stored form
    pub fn normalize(&self, value: &SettingValue) -> Result<StoredValue> {
        let invalid = || AdhkarError::InvalidValue {
            field: self.column().to_string(),
            value: value.to_string(),
        };

        match (self.kind(), value) {
            (FieldKind::Flag, SettingValue::Flag(on)) => Ok(StoredValue::Int(i64::from(*on))),
            (FieldKind::Time, SettingValue::Text(text)) => {
                Ok(StoredValue::Text(format_hhmm(parse_hhmm(text.trim())?)))
            }
            (FieldKind::Interval, SettingValue::Int(minutes)) => {
                Ok(StoredValue::Int(i64::from(validate_interval(*minutes)?)))
            }
            (FieldKind::Media, SettingValue::Text(text)) => {
                Ok(StoredValue::Text(text.trim().parse::<MediaType>()?.as_str().to_string()))
            }
            _ => Err(invalid()),
        }
    }
}

impl FromStr for SettingField {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self> {
        SettingField::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| AdhkarError::InvalidField(s.to_string()))
    }
}

/// Value supplied for a settings mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Flag(bool),
    Text(String),
    Int(i64),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Flag(on) => write!(f, "{}", on),
            SettingValue::Text(text) => f.write_str(text),
            SettingValue::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Database representation of a validated value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

/// Per-group configuration row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub chat_id: i64,
    pub enabled: bool,
    pub morning: bool,
    pub evening: bool,
    pub friday_kahf: bool,
    pub friday_dua: bool,
    pub sleep: bool,
    pub diverse: bool,
    pub morning_time: String,
    pub evening_time: String,
    pub sleep_time: String,
    pub diverse_interval_minutes: i64,
    pub diverse_media_type: MediaType,
    pub send_media_with_morning: bool,
    pub send_media_with_evening: bool,
    pub send_media_with_friday: bool,
    pub created_at: i64,
}

impl GroupSettings {
    pub const DEFAULT_MORNING_TIME: &'static str = "05:00";
    pub const DEFAULT_EVENING_TIME: &'static str = "17:00";
    pub const DEFAULT_SLEEP_TIME: &'static str = "22:00";
    pub const DEFAULT_INTERVAL_MINUTES: i64 = 60;

    /// Defaults applied on first contact
    pub fn defaults(chat_id: i64, created_at: i64) -> Self {
        Self {
            chat_id,
            enabled: false,
            morning: true,
            evening: true,
            friday_kahf: true,
            friday_dua: true,
            sleep: true,
            diverse: true,
            morning_time: Self::DEFAULT_MORNING_TIME.to_string(),
            evening_time: Self::DEFAULT_EVENING_TIME.to_string(),
            sleep_time: Self::DEFAULT_SLEEP_TIME.to_string(),
            diverse_interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
            diverse_media_type: MediaType::Text,
            send_media_with_morning: false,
            send_media_with_evening: false,
            send_media_with_friday: false,
            created_at,
        }
    }

    /// Feature toggle for a content stream
    pub fn is_on(&self, category: Category) -> bool {
        match category {
            Category::Morning => self.morning,
            Category::Evening => self.evening,
            Category::FridayKahf => self.friday_kahf,
            Category::FridayDua => self.friday_dua,
            Category::Sleep => self.sleep,
            Category::Diverse => self.diverse,
        }
    }

    /// Current value of a boolean field; `None` for non-flag fields
    pub fn flag(&self, field: SettingField) -> Option<bool> {
        match field {
            SettingField::Enabled => Some(self.enabled),
            SettingField::Morning => Some(self.morning),
            SettingField::Evening => Some(self.evening),
            SettingField::FridayKahf => Some(self.friday_kahf),
            SettingField::FridayDua => Some(self.friday_dua),
            SettingField::Sleep => Some(self.sleep),
            SettingField::Diverse => Some(self.diverse),
            SettingField::SendMediaWithMorning => Some(self.send_media_with_morning),
            SettingField::SendMediaWithEvening => Some(self.send_media_with_evening),
            SettingField::SendMediaWithFriday => Some(self.send_media_with_friday),
            _ => None,
        }
    }

    /// Whether the batch for `category` should carry an attachment
    pub fn attaches_media(&self, category: Category) -> bool {
        match category {
            Category::Morning => self.send_media_with_morning,
            Category::Evening => self.send_media_with_evening,
            Category::FridayKahf | Category::FridayDua => self.send_media_with_friday,
            Category::Diverse => self.diverse_media_type != MediaType::Text,
            Category::Sleep => false,
        }
    }

    pub fn time_of(&self, slot: TimeSlot) -> &str {
        match slot {
            TimeSlot::Morning => &self.morning_time,
            TimeSlot::Evening => &self.evening_time,
            TimeSlot::Sleep => &self.sleep_time,
        }
    }
}

impl<'r> FromRow<'r, AnyRow> for GroupSettings {
    fn from_row(row: &'r AnyRow) -> std::result::Result<Self, sqlx::Error> {
        let flag = |column: &str| -> std::result::Result<bool, sqlx::Error> {
            Ok(row.try_get::<i64, _>(column)? != 0)
        };
        let media: String = row.try_get("diverse_media_type")?;

        Ok(Self {
            chat_id: row.try_get("chat_id")?,
            enabled: flag("enabled")?,
            morning: flag("morning")?,
            evening: flag("evening")?,
            friday_kahf: flag("friday_kahf")?,
            friday_dua: flag("friday_dua")?,
            sleep: flag("sleep")?,
            diverse: flag("diverse")?,
            morning_time: row.try_get("morning_time")?,
            evening_time: row.try_get("evening_time")?,
            sleep_time: row.try_get("sleep_time")?,
            diverse_interval_minutes: row.try_get("diverse_interval_minutes")?,
            diverse_media_type: media.parse().unwrap_or(MediaType::Text),
            send_media_with_morning: flag("send_media_with_morning")?,
            send_media_with_evening: flag("send_media_with_evening")?,
            send_media_with_friday: flag("send_media_with_friday")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
