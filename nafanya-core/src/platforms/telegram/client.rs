use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use nafanya_common::models::ChatAction;
use crate::platforms::ChatTransport;
use crate::Error;

use super::models::{ChatMember, TelegramResponse, Update, User};

/// All method calls are POSTed to `{TELEGRAM_API_BASE}{token}/{method}`.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";

/// Seconds the server holds a `getUpdates` call open.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 60;

/// Thin HTTPS JSON client for the Bot API methods the bot needs.
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    api_base: String,
    http: Client,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        // Must outlive the long-poll window.
        let http = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 15))
            .build()?;
        Ok(Self {
            token: token.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
            http,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, Error> {
        debug!("telegram: {}", method);
        let response = self
            .http
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await?;
        let parsed: TelegramResponse<T> = response.json().await?;
        parsed.into_result(method)
    }

    pub async fn get_me(&self) -> Result<User, Error> {
        self.call("getMe", json!({})).await
    }

    /// Long-polls for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, Error> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

fn with_reply(mut body: Value, reply_to: Option<i64>) -> Value {
    if let Some(id) = reply_to {
        body["reply_parameters"] = json!({
            "message_id": id,
            "allow_sending_without_reply": true,
        });
    }
    body
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), Error> {
        let body = with_reply(json!({ "chat_id": chat_id, "text": text }), reply_to);
        let _: Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, reply_to: Option<i64>, photo_url: &str) -> Result<(), Error> {
        let body = with_reply(json!({ "chat_id": chat_id, "photo": photo_url }), reply_to);
        let _: Value = self.call("sendPhoto", body).await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), Error> {
        let _: bool = self
            .call("sendChatAction", json!({ "chat_id": chat_id, "action": action.as_str() }))
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), Error> {
        let _: bool = self
            .call("deleteMessage", json!({ "chat_id": chat_id, "message_id": message_id }))
            .await?;
        Ok(())
    }

    async fn chat_administrators(&self, chat_id: i64) -> Result<Vec<i64>, Error> {
        let members: Vec<ChatMember> = self
            .call("getChatAdministrators", json!({ "chat_id": chat_id }))
            .await?;
        Ok(members
            .into_iter()
            .filter(|m| m.status == "creator" || m.status == "administrator")
            .map(|m| m.user.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_method_urls() {
        let c = TelegramClient::new("123:abc").unwrap();
        assert_eq!(c.api_url("getMe"), "https://api.telegram.org/bot123:abc/getMe");
    }

    #[test]
    fn reply_parameters_only_when_replying() {
        let plain = with_reply(json!({ "chat_id": 1 }), None);
        assert!(plain.get("reply_parameters").is_none());
        let reply = with_reply(json!({ "chat_id": 1 }), Some(77));
        assert_eq!(reply["reply_parameters"]["message_id"], 77);
    }
}
