//! Settings store tests against a temporary SQLite database

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use AdhkarBot::models::{AdminDisplay, GroupSettings, MediaType, SettingValue};
use AdhkarBot::AdhkarError;

#[tokio::test]
async fn test_fresh_group_gets_defaults() {
    let test = TestStore::new().await;
    let settings = test.store.get_group(TEST_GROUP_ID).await.unwrap();

    assert_eq!(settings.chat_id, TEST_GROUP_ID);
    assert!(!settings.enabled);
    assert!(settings.morning && settings.evening && settings.sleep && settings.diverse);
    assert!(settings.friday_kahf && settings.friday_dua);
    assert_eq!(settings.morning_time, "05:00");
    assert_eq!(settings.evening_time, "17:00");
    assert_eq!(settings.sleep_time, "22:00");
    assert_eq!(settings.diverse_interval_minutes, 60);
    assert_eq!(settings.diverse_media_type, MediaType::Text);
    assert!(!settings.send_media_with_morning);
}

#[tokio::test]
async fn test_get_group_is_idempotent() {
    let test = TestStore::new().await;
    let first = test.store.get_group(-100123).await.unwrap();
    let second = test.store.get_group(-100123).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(test.store.count_groups().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_field_never_mutates_the_row() {
    let test = TestStore::new().await;
    let before = test.store.get_group(TEST_GROUP_ID).await.unwrap();

    let result = test
        .store
        .update_group(TEST_GROUP_ID, "chat_id; DROP TABLE group_settings", SettingValue::Int(1))
        .await;
    assert_matches!(result, Err(AdhkarError::InvalidField(_)));

    let result = test.store.update_group(TEST_GROUP_ID, "created_at", SettingValue::Int(1)).await;
    assert_matches!(result, Err(AdhkarError::InvalidField(_)));

    assert_eq!(test.store.get_group(TEST_GROUP_ID).await.unwrap(), before);
}

#[tokio::test]
async fn test_invalid_values_are_rejected_before_writing() {
    let test = TestStore::new().await;
    let before = test.store.get_group(TEST_GROUP_ID).await.unwrap();

    for bad in ["24:00", "12:60", "12", "12:30:45"] {
        let result = test
            .store
            .update_group(TEST_GROUP_ID, "morning_time", SettingValue::Text(bad.to_string()))
            .await;
        assert_matches!(result, Err(AdhkarError::InvalidTime(_)), "{}", bad);
    }

    for bad in [0, 1441, -5] {
        let result = test
            .store
            .update_group(TEST_GROUP_ID, "diverse_interval_minutes", SettingValue::Int(bad))
            .await;
        assert_matches!(result, Err(AdhkarError::InvalidInterval(_)));
    }

    let result = test
        .store
        .update_group(TEST_GROUP_ID, "morning", SettingValue::Text("yes".to_string()))
        .await;
    assert_matches!(result, Err(AdhkarError::InvalidValue { .. }));

    assert_eq!(test.store.get_group(TEST_GROUP_ID).await.unwrap(), before);
}

#[tokio::test]
async fn test_time_boundaries_are_stored_verbatim() {
    let test = TestStore::new().await;

    for (field, time) in [("morning_time", "00:00"), ("sleep_time", "23:59")] {
        test.store
            .update_group(TEST_GROUP_ID, field, SettingValue::Text(time.to_string()))
            .await
            .unwrap();
    }

    let settings = test.store.get_group(TEST_GROUP_ID).await.unwrap();
    assert_eq!(settings.morning_time, "00:00");
    assert_eq!(settings.sleep_time, "23:59");
}

#[tokio::test]
async fn test_enabled_groups_listing() {
    let test = TestStore::new().await;
    test.store.set_enabled(-1, true).await.unwrap();
    test.store.set_enabled(-2, true).await.unwrap();
    test.store.get_group(-3).await.unwrap();
    test.store.set_enabled(-2, false).await.unwrap();

    assert_eq!(test.store.list_enabled_groups().await.unwrap(), vec![-1]);
    assert_eq!(test.store.count_enabled_groups().await.unwrap(), 1);
    assert_eq!(test.store.count_groups().await.unwrap(), 3);
}

#[tokio::test]
async fn test_first_primary_admin_is_kept() {
    let test = TestStore::new().await;
    let display = AdminDisplay::default();

    let first = test.store.upsert_admin(TEST_GROUP_ID, 1, &display, Some(true)).await.unwrap();
    let second = test.store.upsert_admin(TEST_GROUP_ID, 2, &display, Some(true)).await.unwrap();
    assert!(first.is_primary);
    assert!(!second.is_primary);

    // Refreshing without a primary preference keeps the stored flag
    let refreshed = test
        .store
        .upsert_admin(
            TEST_GROUP_ID,
            1,
            &AdminDisplay { username: Some("renamed".to_string()), ..AdminDisplay::default() },
            None,
        )
        .await
        .unwrap();
    assert!(refreshed.is_primary);
    assert_eq!(refreshed.username.as_deref(), Some("renamed"));

    let admins = test.store.list_admins(TEST_GROUP_ID).await.unwrap();
    assert_eq!(admins.len(), 2);
    assert_eq!(admins.iter().filter(|a| a.is_primary).count(), 1);
}

#[tokio::test]
async fn test_sync_replaces_admin_set_and_moves_primary_to_owner() {
    let test = TestStore::new().await;
    let display = AdminDisplay::default();
    test.store.upsert_admin(TEST_GROUP_ID, 1, &display, Some(true)).await.unwrap();
    test.store.upsert_admin(TEST_GROUP_ID, 2, &display, None).await.unwrap();

    let count = test
        .store
        .sync_admins(TEST_GROUP_ID, &[admin_entry(2, false), admin_entry(3, true)])
        .await
        .unwrap();
    assert_eq!(count, 2);

    assert!(!test.store.is_admin(TEST_GROUP_ID, 1).await.unwrap());
    let admins = test.store.list_admins(TEST_GROUP_ID).await.unwrap();
    let primaries: Vec<i64> = admins.iter().filter(|a| a.is_primary).map(|a| a.user_id).collect();
    assert_eq!(primaries, vec![3]);
    assert_eq!(admins.len(), 2);
}

#[tokio::test]
async fn test_admins_are_scoped_per_group() {
    let test = TestStore::new().await;
    test.store
        .upsert_admin(-1, TEST_ADMIN_ID, &AdminDisplay::default(), None)
        .await
        .unwrap();

    assert!(test.store.is_admin(-1, TEST_ADMIN_ID).await.unwrap());
    assert!(!test.store.is_admin(-2, TEST_ADMIN_ID).await.unwrap());
}

#[tokio::test]
async fn test_row_matches_model_defaults() {
    let test = TestStore::new().await;
    let stored = test.store.get_group(TEST_GROUP_ID).await.unwrap();
    let expected = GroupSettings::defaults(TEST_GROUP_ID, stored.created_at);
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn test_supergroup_ids_survive_a_round_trip() {
    let test = TestStore::new().await;
    let big_user = 7_000_000_001;

    let settings = test.store.set_enabled(TEST_GROUP_ID, true).await.unwrap();
    assert_eq!(settings.chat_id, TEST_GROUP_ID);
    assert_eq!(test.store.list_enabled_groups().await.unwrap(), vec![TEST_GROUP_ID]);

    let admin = test
        .store
        .upsert_admin(TEST_GROUP_ID, big_user, &AdminDisplay::default(), Some(true))
        .await
        .unwrap();
    assert_eq!(admin.chat_id, TEST_GROUP_ID);
    assert_eq!(admin.user_id, big_user);
    assert!(test.store.is_admin(TEST_GROUP_ID, big_user).await.unwrap());
    assert_eq!(test.store.count_groups().await.unwrap(), 1);
}

#[tokio::test]
async fn test_admin_without_optional_names_is_listed() {
    let test = TestStore::new().await;
    let display = AdminDisplay { username: None, first_name: Some("Admin".to_string()), last_name: None };

    let record = test.store.upsert_admin(TEST_GROUP_ID, TEST_ADMIN_ID, &display, None).await.unwrap();
    assert_eq!(record.username, None);
    assert_eq!(record.last_name, None);

    let admins = test.store.list_admins(TEST_GROUP_ID).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].first_name.as_deref(), Some("Admin"));
    assert_eq!(admins[0].username, None);
}
