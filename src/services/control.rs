//! Control surface
//!
//! Every administrator action goes through [`ControlSurface::apply`]:
//! verify the caller, write through the store whitelist, then re-materialise
//! jobs when the change touches the schedule.

use tracing::error;

use crate::database::SettingsStore;
use crate::models::{GroupSettings, MediaType, SettingField, SettingValue, TimeSlot};
use crate::scheduler::Scheduler;
use crate::utils::errors::{AdhkarError, Result};
use crate::utils::helpers::decode_group_payload;
use crate::utils::logging::log_admin_action;

use super::auth::AuthService;

/// A settings change requested by an administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Enable,
    Disable,
    /// Invert a boolean field
    Toggle(SettingField),
    SetTime(TimeSlot, String),
    SetInterval(i64),
    SetMediaType(MediaType),
}

impl Mutation {
    /// Field and value to write given the current row
    pub fn resolve(&self, current: &GroupSettings) -> Result<(SettingField, SettingValue)> {
        Ok(match self {
            Mutation::Enable => (SettingField::Enabled, SettingValue::Flag(true)),
            Mutation::Disable => (SettingField::Enabled, SettingValue::Flag(false)),
            Mutation::Toggle(field) => {
                let on = current
                    .flag(*field)
                    .ok_or_else(|| AdhkarError::InvalidField(field.column().to_string()))?;
                (*field, SettingValue::Flag(!on))
            }
            Mutation::SetTime(slot, time) => (slot.field(), SettingValue::Text(time.clone())),
            Mutation::SetInterval(minutes) => (SettingField::DiverseInterval, SettingValue::Int(*minutes)),
            Mutation::SetMediaType(media) => {
                (SettingField::DiverseMediaType, SettingValue::Text(media.as_str().to_string()))
            }
        })
    }

    fn action_name(&self) -> &'static str {
        match self {
            Mutation::Enable => "enable",
            Mutation::Disable => "disable",
            Mutation::Toggle(_) => "toggle",
            Mutation::SetTime(..) => "set_time",
            Mutation::SetInterval(_) => "set_interval",
            Mutation::SetMediaType(_) => "set_media_type",
        }
    }
}

/// Group an action applies to.
///
/// Inside a group it is the group itself; from a private chat it is the group
/// carried by a `group_<base64>` payload.
pub fn resolve_target(chat_id: i64, is_private: bool, payload: Option<&str>) -> Option<i64> {
    if is_private {
        payload.and_then(decode_group_payload)
    } else {
        Some(chat_id)
    }
}

#[derive(Clone)]
pub struct ControlSurface {
    store: SettingsStore,
    auth: AuthService,
    scheduler: Scheduler,
}

impl ControlSurface {
    pub fn new(store: SettingsStore, auth: AuthService, scheduler: Scheduler) -> Self {
        Self { store, auth, scheduler }
    }

    /// Apply an administrator's change to `group_id` and return the new row
    pub async fn apply(&self, group_id: i64, user_id: i64, mutation: Mutation) -> Result<GroupSettings> {
        self.auth.require_admin(group_id, user_id).await?;

        let current = self.store.get_group(group_id).await?;
        let (field, value) = mutation.resolve(&current)?;
        let details = format!("{}={}", field.column(), value);
        let updated = self.store.update_field(group_id, field, value).await?;

        if field.affects_schedule() {
            if let Err(e) = self.scheduler.reschedule().await {
                error!(chat_id = group_id, error = %e, "Reschedule after settings change failed");
            }
        }

        log_admin_action(group_id, user_id, mutation.action_name(), Some(&details));
        Ok(updated)
    }

    /// Current settings for the control panel; admin only
    pub async fn panel(&self, group_id: i64, user_id: i64) -> Result<GroupSettings> {
        self.auth.require_admin(group_id, user_id).await?;
        self.store.get_group(group_id).await
    }

    /// Current settings for `/status`
    pub async fn status(&self, group_id: i64) -> Result<GroupSettings> {
        self.store.get_group(group_id).await
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_inverts_current_value() {
        let settings = GroupSettings::defaults(-1, 0);
        let (field, value) = Mutation::Toggle(SettingField::Sleep).resolve(&settings).unwrap();
        assert_eq!(field, SettingField::Sleep);
        assert_eq!(value, SettingValue::Flag(false));
    }

    #[test]
    fn test_toggle_of_non_flag_is_invalid_field() {
        let settings = GroupSettings::defaults(-1, 0);
        assert!(matches!(
            Mutation::Toggle(SettingField::MorningTime).resolve(&settings),
            Err(AdhkarError::InvalidField(_))
        ));
    }

    #[test]
    fn test_private_target_comes_from_payload() {
        let payload = crate::utils::helpers::encode_group_payload(-100123);
        assert_eq!(resolve_target(555, true, Some(&payload)), Some(-100123));
        assert_eq!(resolve_target(555, true, None), None);
        assert_eq!(resolve_target(-42, false, Some(&payload)), Some(-42));
    }
}
