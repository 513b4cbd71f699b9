//! Telegram gateway classification against a mocked Bot API

mod helpers;

use std::time::Duration;

use helpers::*;
use serde_json::json;
use serial_test::serial;
use AdhkarBot::content::{ContentItem, MediaRef};
use AdhkarBot::models::{Category, MediaType};
use AdhkarBot::services::{AdminSource, DeliveryOutcome, Gateway, TelegramGateway};

#[tokio::test]
#[serial]
async fn test_successful_send() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message_ok(TEST_GROUP_ID).await;

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway
        .send(TEST_GROUP_ID, Category::Morning, &ContentItem::text("سبحان الله"))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Ok);
    assert_eq!(mock.calls_to("SendMessage").await, 1);
}

#[tokio::test]
#[serial]
async fn test_blocked_bot_is_classified() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message_error(403, "Forbidden: bot was blocked by the user", None).await;

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway.send(TEST_GROUP_ID, Category::Diverse, &ContentItem::text("x")).await;

    assert_eq!(outcome, DeliveryOutcome::Blocked);
    assert!(outcome.disables_group());
}

#[tokio::test]
#[serial]
async fn test_kicked_bot_is_classified() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message_error(403, "Forbidden: bot was kicked from the supergroup chat", None)
        .await;

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway.send(TEST_GROUP_ID, Category::Evening, &ContentItem::text("x")).await;

    assert_eq!(outcome, DeliveryOutcome::Kicked);
}

#[tokio::test]
#[serial]
async fn test_flood_control_carries_retry_after() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message_error(429, "Too Many Requests: retry after 3", Some(json!({ "retry_after": 3 })))
        .await;

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway.send(TEST_GROUP_ID, Category::Morning, &ContentItem::text("x")).await;

    assert_eq!(outcome, DeliveryOutcome::RateLimited(Duration::from_secs(3)));
    assert!(!outcome.disables_group());
}

#[tokio::test]
#[serial]
async fn test_bad_request_is_rejected_without_disabling() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message_error(400, "Bad Request: message text is empty", None).await;

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway.send(TEST_GROUP_ID, Category::Sleep, &ContentItem::text("")).await;

    assert_eq!(outcome.label(), "rejected");
    assert!(!outcome.disables_group());
}

#[tokio::test]
#[serial]
async fn test_administrators_come_from_the_platform() {
    let mock = TelegramMockServer::new().await;
    mock.mock_get_chat_administrators(TEST_ADMIN_ID, 333).await;

    let admins = mock.bot().fetch_admins(TEST_GROUP_ID).await.unwrap();

    assert_eq!(admins.len(), 2);
    assert!(admins.iter().any(|a| a.user_id == TEST_ADMIN_ID && a.is_owner));
    assert!(admins.iter().any(|a| a.user_id == 333 && !a.is_owner));
}

#[tokio::test]
#[serial]
async fn test_each_part_is_a_single_request() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_photo_ok(TEST_GROUP_ID).await;
    mock.mock_send_message_ok(TEST_GROUP_ID).await;

    let item = ContentItem {
        body: "ص".repeat(1500),
        media: Some(MediaRef { kind: MediaType::Image, url: "https://example.org/a.jpg".to_string() }),
    };
    let parts = item.parts();
    assert_eq!(parts.len(), 2);

    let gateway = TelegramGateway::new(mock.bot());
    let outcome = gateway.send(TEST_GROUP_ID, Category::Diverse, &parts[0]).await;

    assert_eq!(outcome, DeliveryOutcome::Ok);
    assert_eq!(mock.calls_to("SendPhoto").await, 1);
    assert_eq!(mock.calls_to("SendMessage").await, 0);

    let outcome = gateway.send(TEST_GROUP_ID, Category::Diverse, &parts[1]).await;

    assert_eq!(outcome, DeliveryOutcome::Ok);
    assert_eq!(mock.calls_to("SendPhoto").await, 1);
    assert_eq!(mock.calls_to("SendMessage").await, 1);
}
