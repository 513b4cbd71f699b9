//! Mock Telegram API Server for testing
//!
//! A wiremock server answering Bot API calls the way the real platform
//! does, including its error envelopes.

use serde_json::{json, Value};
use teloxide::types::Me;
use teloxide::Bot;
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Token every mocked bot uses
pub const TEST_BOT_TOKEN: &str = "12345:test_token";

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    /// Create a new mock Telegram API server
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Identity of the mocked bot as returned by `getMe`
    pub fn me() -> Me {
        serde_json::from_value(json!({
            "id": 12345,
            "is_bot": true,
            "first_name": "AdhkarBot",
            "username": "adhkar_test_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        }))
        .expect("bot identity")
    }

    /// Bot pointed at this server
    pub fn bot(&self) -> Bot {
        let url = Url::parse(&self.server.uri()).expect("mock server uri");
        Bot::new(TEST_BOT_TOKEN).set_api_url(url)
    }

    /// Path of a Bot API method; teloxide names methods in PascalCase
    fn endpoint(name: &str) -> String {
        format!("/bot{}/{}", TEST_BOT_TOKEN, name)
    }

    /// Successful `SendMessage`
    pub async fn mock_send_message_ok(&self, chat_id: i64) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("SendMessage")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "message_id": 123,
                    "from": {
                        "id": 12345,
                        "is_bot": true,
                        "first_name": "AdhkarBot",
                        "username": "adhkar_test_bot"
                    },
                    "chat": {
                        "id": chat_id,
                        "title": "Test Group",
                        "type": "supergroup"
                    },
                    "date": 1640995200,
                    "text": "سبحان الله"
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Successful `SendPhoto`
    pub async fn mock_send_photo_ok(&self, chat_id: i64) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("SendPhoto")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "message_id": 124,
                    "from": {
                        "id": 12345,
                        "is_bot": true,
                        "first_name": "AdhkarBot",
                        "username": "adhkar_test_bot"
                    },
                    "chat": {
                        "id": chat_id,
                        "title": "Test Group",
                        "type": "supergroup"
                    },
                    "date": 1640995200,
                    "photo": [
                        {
                            "file_id": "photo_file_id",
                            "file_unique_id": "photo_unique_id",
                            "width": 100,
                            "height": 100,
                            "file_size": 1024
                        }
                    ]
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// `SendMessage` failing with an API error envelope
    pub async fn mock_send_message_error(&self, status: u16, description: &str, parameters: Option<Value>) {
        let mut body = json!({
            "ok": false,
            "error_code": status,
            "description": description
        });
        if let Some(parameters) = parameters {
            body["parameters"] = parameters;
        }

        Mock::given(method("POST"))
            .and(path(Self::endpoint("SendMessage")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `GetChatAdministrators` listing one owner and one administrator
    pub async fn mock_get_chat_administrators(&self, owner_id: i64, admin_id: i64) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("GetChatAdministrators")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {
                        "status": "creator",
                        "user": { "id": owner_id, "is_bot": false, "first_name": "Owner", "username": "owner" },
                        "is_anonymous": false
                    },
                    {
                        "status": "administrator",
                        "user": { "id": admin_id, "is_bot": false, "first_name": "Admin" },
                        "can_be_edited": false,
                        "is_anonymous": false,
                        "can_manage_chat": true,
                        "can_delete_messages": true,
                        "can_manage_video_chats": false,
                        "can_restrict_members": true,
                        "can_promote_members": false,
                        "can_change_info": true,
                        "can_invite_users": true,
                        "can_post_messages": false,
                        "can_edit_messages": false,
                        "can_pin_messages": true,
                        "can_manage_topics": false,
                        "can_post_stories": false,
                        "can_edit_stories": false,
                        "can_delete_stories": false
                    }
                ]
            })))
            .mount(&self.server)
            .await;
    }

    /// `GetWebhookInfo` reporting `url` as the active webhook
    pub async fn mock_get_webhook_info(&self, url: &str) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint("GetWebhookInfo")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "url": url,
                    "has_custom_certificate": false,
                    "pending_update_count": 2
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for a method
    pub async fn calls_to(&self, name: &str) -> usize {
        let endpoint = Self::endpoint(name);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }
}
