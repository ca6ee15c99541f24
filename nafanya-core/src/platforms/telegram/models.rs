//! Wire types of the Telegram Bot API (only the fields the bot reads).

use serde::Deserialize;

use nafanya_common::models::{BotCommand, ChatKind, InboundMessage, MessageAuthor, RepliedMessage};
use crate::Error;

/// `{ "ok": true, "result": ... }` or `{ "ok": false, "error_code": .., "description": .. }`.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

impl<T> TelegramResponse<T> {
    pub fn into_result(self, method: &str) -> Result<T, Error> {
        if !self.ok {
            return Err(Error::Platform(format!(
                "Telegram {} failed (code {}): {}",
                method,
                self.error_code.unwrap_or(-1),
                self.description.as_deref().unwrap_or("unknown error")
            )));
        }
        self.result
            .ok_or_else(|| Error::Platform(format!("Telegram {} returned no result", method)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub user: User,
    pub status: String,
}

impl From<&User> for MessageAuthor {
    fn from(u: &User) -> Self {
        MessageAuthor {
            user_id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            username: u.username.clone(),
            is_bot: u.is_bot,
        }
    }
}

impl Message {
    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or_default()
    }

    fn starts_with_command(&self) -> bool {
        self.entities
            .iter()
            .any(|e| e.kind == "bot_command" && e.offset == 0)
    }

    /// `/name@bot args` -> `name`, `args`. Commands addressed to another bot
    /// are not ours.
    pub fn command(&self, bot_username: &str) -> Option<BotCommand> {
        if !self.starts_with_command() {
            return None;
        }
        let text = self.body();
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (text, ""),
        };
        let head = head.strip_prefix('/')?;
        let name = match head.split_once('@') {
            Some((name, addressee)) => {
                if !addressee.eq_ignore_ascii_case(bot_username) {
                    return None;
                }
                name
            }
            None => head,
        };
        if name.is_empty() {
            return None;
        }
        Some(BotCommand {
            name: name.to_string(),
            arguments: rest.to_string(),
        })
    }

    /// Transport-neutral view. `None` for messages without a sender
    /// (channel posts) or with an unsupported chat type.
    pub fn to_inbound(&self, bot_username: &str) -> Option<InboundMessage> {
        let from = self.from.as_ref()?;
        let chat_kind = self.chat.kind.parse::<ChatKind>().ok()?;
        let reply_to = self.reply_to_message.as_ref().map(|r| RepliedMessage {
            message_id: r.message_id,
            from: r.from.as_ref().map(MessageAuthor::from),
            text: r.body().to_string(),
        });

        Some(InboundMessage {
            message_id: self.message_id,
            chat_id: self.chat.id,
            chat_kind,
            chat_title: self.chat.title.clone(),
            chat_first_name: self.chat.first_name.clone(),
            chat_last_name: self.chat.last_name.clone(),
            from: MessageAuthor::from(from),
            text: self.body().to_string(),
            command: self.command(bot_username),
            reply_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Message {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn decodes_group_reply() {
        let msg = decode(r#"{
            "message_id": 55,
            "from": { "id": 7, "is_bot": false, "first_name": "Ivan", "last_name": "Petrov", "username": "ivan" },
            "chat": { "id": -1001, "type": "supergroup", "title": "Friends" },
            "text": "Нафаня, как дела?",
            "reply_to_message": {
                "message_id": 54,
                "from": { "id": 99, "is_bot": true, "first_name": "Нафаня", "username": "nafanya_bot" },
                "chat": { "id": -1001, "type": "supergroup", "title": "Friends" },
                "text": "Привет"
            }
        }"#);
        let inbound = msg.to_inbound("nafanya_bot").unwrap();
        assert_eq!(inbound.chat_id, -1001);
        assert_eq!(inbound.chat_kind, ChatKind::Supergroup);
        assert_eq!(inbound.chat_display_name(), "Friends");
        assert_eq!(inbound.from.full_name(), "Ivan Petrov");
        assert!(inbound.command.is_none());
        let reply = inbound.reply_to.unwrap();
        assert_eq!(reply.message_id, 54);
        assert!(reply.from.unwrap().is_bot);
        assert_eq!(reply.text, "Привет");
    }

    #[test]
    fn parses_command_and_strips_bot_suffix() {
        let msg = decode(r#"{
            "message_id": 1,
            "from": { "id": 7, "first_name": "Ivan" },
            "chat": { "id": 7, "type": "private", "first_name": "Ivan", "last_name": "Petrov" },
            "text": "/chatSetAgro@Nafanya_Bot  42 ",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 24 }]
        }"#);
        let inbound = msg.to_inbound("nafanya_bot").unwrap();
        let cmd = inbound.command.clone().unwrap();
        assert_eq!(cmd.name, "chatSetAgro");
        assert_eq!(cmd.arguments, "42");
        assert_eq!(inbound.chat_display_name(), "Ivan Petrov");
    }

    #[test]
    fn command_for_another_bot_is_ignored() {
        let msg = decode(r#"{
            "message_id": 1,
            "from": { "id": 7, "first_name": "Ivan" },
            "chat": { "id": -5, "type": "group", "title": "g" },
            "text": "/start@other_bot",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 16 }]
        }"#);
        assert!(msg.command("nafanya_bot").is_none());
    }

    #[test]
    fn slash_without_entity_is_plain_text() {
        let msg = decode(r#"{
            "message_id": 1,
            "from": { "id": 7, "first_name": "Ivan" },
            "chat": { "id": -5, "type": "group", "title": "g" },
            "text": "/shrug"
        }"#);
        assert!(msg.command("nafanya_bot").is_none());
    }

    #[test]
    fn error_response_becomes_platform_error() {
        let resp: TelegramResponse<bool> = serde_json::from_str(
            r#"{ "ok": false, "error_code": 403, "description": "Forbidden: bot was kicked" }"#,
        ).unwrap();
        let err = resp.into_result("sendMessage").unwrap_err();
        assert!(matches!(err, Error::Platform(ref m) if m.contains("403") && m.contains("kicked")));
    }
}
