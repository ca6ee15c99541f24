use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use nafanya_common::models::{BotCommand, ChatProfile, InboundMessage, PromptKind, ProviderKind};
use nafanya_common::traits::telemetry_traits::ErrorReporter;
use crate::cache::ChatConfigCache;
use crate::platforms::ChatTransport;
use crate::repositories::{AdminRosterRepository, ChatProfileRepository};
use crate::scheduler::InterjectionScheduler;
use crate::Error;

pub const GREETING: &str = "Hello, I'm Nafanya Bot!";

/// Keeps each outbound message under Telegram's 4096 character limit.
const MAX_REPLY_CHARS: usize = 4000;

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Everyone,
    /// Bot admin, a Telegram administrator of the chat, or the private-chat owner.
    ChatAdmin,
    /// Member of the global admin roster.
    BotAdmin,
}

pub fn access_for(command: &str) -> Option<Access> {
    match command {
        "start" => Some(Access::Everyone),
        "chatConfig" | "chatSetAgro" | "chatSetAgroCooldown" | "chatSetPreviewDeletion"
        | "chatUpdateQuestionPrompt" | "chatUpdateRandomPrompt" | "chatSetModel" => {
            Some(Access::ChatAdmin)
        }
        "listChats" | "chat" | "chatAddDays" | "chatMakeVIP" | "addAdmin" => Some(Access::BotAdmin),
        _ => None,
    }
}

fn usage(command: &str) -> &'static str {
    match command {
        "chat" => "Usage: /chat <chat id>",
        "chatAddDays" => "Usage: /chatAddDays <chat id> <days>",
        "chatMakeVIP" => "Usage: /chatMakeVIP <chat id>",
        "addAdmin" => "Usage: /addAdmin <user id>",
        "chatSetAgro" => "Usage: /chatSetAgro <0..100>",
        "chatSetAgroCooldown" => "Usage: /chatSetAgroCooldown <10..1440 minutes>",
        "chatSetPreviewDeletion" => "Usage: /chatSetPreviewDeletion <true|false>",
        "chatUpdateQuestionPrompt" => "Usage: /chatUpdateQuestionPrompt <prompt, 10..1000 symbols>",
        "chatUpdateRandomPrompt" => "Usage: /chatUpdateRandomPrompt <prompt, 10..1000 symbols>",
        "chatSetModel" => "Usage: /chatSetModel <oai|google|deepseek>",
        _ => "Unknown command",
    }
}

/// Outcome of one command: either text to send back or a usage hint.
enum Reply {
    Text(String),
    Usage(String),
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Splits `text` on line boundaries into chunks of at most `limit` characters.
/// A line longer than `limit` is cut on character boundaries.
fn chunk_lines(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() && current_len + chars.len() + 1 > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += chars.len();
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub struct AdminCommandService {
    cache: Arc<ChatConfigCache>,
    scheduler: Arc<InterjectionScheduler>,
    chat_repo: Arc<dyn ChatProfileRepository>,
    admin_repo: Arc<dyn AdminRosterRepository>,
    transport: Arc<dyn ChatTransport>,
    reporter: Arc<dyn ErrorReporter>,
}

impl AdminCommandService {
    pub fn new(
        cache: Arc<ChatConfigCache>,
        scheduler: Arc<InterjectionScheduler>,
        chat_repo: Arc<dyn ChatProfileRepository>,
        admin_repo: Arc<dyn AdminRosterRepository>,
        transport: Arc<dyn ChatTransport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        debug!("Initializing AdminCommandService");
        Self {
            cache,
            scheduler,
            chat_repo,
            admin_repo,
            transport,
            reporter,
        }
    }

    /// Runs the command carried by `msg`. Unauthorised callers and unknown
    /// commands are ignored. Store failures are logged and reported and the
    /// command is dropped without a reply; only fatal errors propagate.
    pub async fn handle_command(&self, msg: &InboundMessage) -> Result<(), Error> {
        let Some(cmd) = &msg.command else {
            return Ok(());
        };
        let Some(access) = access_for(&cmd.name) else {
            debug!("ignoring unknown command '/{}'", cmd.name);
            return Ok(());
        };

        if !self.is_allowed(msg, access).await? {
            debug!("user {} may not run '/{}' in chat {}", msg.from.user_id, cmd.name, msg.chat_id);
            return Ok(());
        }

        let reply = match self.execute(msg, cmd).await {
            Ok(reply) => reply,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("command '/{}' in chat {} failed: {}", cmd.name, msg.chat_id, e);
                self.reporter.capture_error(&e);
                return Ok(());
            }
        };

        let text = match reply {
            Reply::Text(t) => t,
            Reply::Usage(t) => {
                debug!("bad arguments for '/{}': {:?}", cmd.name, cmd.arguments);
                t
            }
        };
        for chunk in chunk_lines(&text, MAX_REPLY_CHARS) {
            self.transport.send_message(msg.chat_id, Some(msg.message_id), &chunk).await?;
        }
        Ok(())
    }

    async fn is_allowed(&self, msg: &InboundMessage, access: Access) -> Result<bool, Error> {
        let user_id = msg.from.user_id;
        match access {
            Access::Everyone => Ok(true),
            Access::BotAdmin => Ok(self.cache.is_admin(user_id)),
            Access::ChatAdmin => {
                if self.cache.is_admin(user_id) || !msg.chat_kind.is_multi_party() {
                    return Ok(true);
                }
                match self.transport.chat_administrators(msg.chat_id).await {
                    Ok(admins) => Ok(admins.contains(&user_id)),
                    Err(e) => {
                        error!("could not fetch administrators of chat {}: {}", msg.chat_id, e);
                        self.reporter.capture_error(&e);
                        Ok(false)
                    }
                }
            }
        }
    }

    async fn execute(&self, msg: &InboundMessage, cmd: &BotCommand) -> Result<Reply, Error> {
        let args = cmd.arguments.trim();
        let name = cmd.name.as_str();
        let usage_reply = || -> Result<Reply, Error> { Ok(Reply::Usage(usage(name).to_string())) };

        match name {
            "start" => Ok(Reply::Text(GREETING.to_string())),

            "listChats" => Ok(Reply::Text(self.list_chats())),

            "chat" => {
                let Ok(chat_id) = args.parse::<i64>() else { return usage_reply() };
                match self.chat_repo.get_chat_profile(chat_id).await? {
                    Some(profile) => Ok(Reply::Text(serde_json::to_string_pretty(&profile)?)),
                    None => Ok(Reply::Text(format!("Chat {} not found", chat_id))),
                }
            }

            "chatAddDays" => {
                let mut parts = args.split_whitespace();
                let parsed = (
                    parts.next().and_then(|s| s.parse::<i64>().ok()),
                    parts.next().and_then(|s| s.parse::<i64>().ok()),
                );
                let (Some(chat_id), Some(days)) = parsed else { return usage_reply() };
                if days <= 0 {
                    return usage_reply();
                }
                let now = Utc::now();
                self.mutate_chat(chat_id, |p| {
                    p.extend_entitlement(days, now)?;
                    Ok(format!("Chat {} is billed to {}", p.chat_id, format_time(p.billed_to)))
                })
                .await
            }

            "chatMakeVIP" => {
                let Ok(chat_id) = args.parse::<i64>() else { return usage_reply() };
                self.mutate_chat(chat_id, |p| {
                    p.grant_lifetime();
                    Ok(format!("Chat {} is VIP now, billed to {}", p.chat_id, format_time(p.billed_to)))
                })
                .await
            }

            "addAdmin" => {
                let Ok(user_id) = args.parse::<i64>() else { return usage_reply() };
                self.admin_repo.add_admin(user_id).await?;
                self.cache.reload().await?;
                info!("user {} added to the admin roster by {}", user_id, msg.from.user_id);
                Ok(Reply::Text(format!("User {} is an admin now", user_id)))
            }

            "chatConfig" => match self.chat_repo.get_chat_profile(msg.chat_id).await? {
                Some(profile) => Ok(Reply::Text(render_config(&profile))),
                None => Ok(Reply::Text(format!("Chat {} not found", msg.chat_id))),
            },

            "chatSetAgro" => {
                let Ok(level) = args.parse::<i32>() else { return usage_reply() };
                self.mutate_chat(msg.chat_id, |p| {
                    p.set_agro_level(level)?;
                    Ok(format!("Agro level set to {}", level))
                })
                .await
            }

            "chatSetAgroCooldown" => {
                let Ok(minutes) = args.parse::<i32>() else { return usage_reply() };
                self.mutate_chat(msg.chat_id, |p| {
                    p.set_agro_cooldown(minutes)?;
                    Ok(format!("Agro cooldown set to {} minutes", minutes))
                })
                .await
            }

            "chatSetPreviewDeletion" => {
                let Ok(flag) = args.to_lowercase().parse::<bool>() else { return usage_reply() };
                self.mutate_chat(msg.chat_id, |p| {
                    p.delete_preview_messages = flag;
                    Ok(format!("Preview deletion set to {}", flag))
                })
                .await
            }

            "chatUpdateQuestionPrompt" | "chatUpdateRandomPrompt" => {
                let kind = if name == "chatUpdateQuestionPrompt" {
                    PromptKind::Question
                } else {
                    PromptKind::RandomInterference
                };
                self.mutate_chat(msg.chat_id, |p| {
                    p.set_prompt(kind, args)?;
                    Ok("Prompt updated".to_string())
                })
                .await
            }

            "chatSetModel" => {
                let Ok(model) = args.parse::<ProviderKind>() else { return usage_reply() };
                self.mutate_chat(msg.chat_id, |p| {
                    p.model = model.to_string();
                    Ok(format!("Model set to {}", model))
                })
                .await
            }

            _ => Ok(Reply::Usage(usage(name).to_string())),
        }
    }

    /// Read-modify-write of one row followed by a cache reload. A rejected
    /// edit (`Error::Parse`) turns into a usage reply and nothing is written.
    async fn mutate_chat<F>(&self, chat_id: i64, edit: F) -> Result<Reply, Error>
    where
        F: FnOnce(&mut ChatProfile) -> Result<String, Error>,
    {
        let Some(mut profile) = self.chat_repo.get_chat_profile(chat_id).await? else {
            return Ok(Reply::Text(format!("Chat {} not found", chat_id)));
        };

        let confirmation = match edit(&mut profile) {
            Ok(text) => text,
            Err(Error::Parse(reason)) => return Ok(Reply::Usage(reason)),
            Err(e) => return Err(e),
        };

        self.chat_repo.update_chat_profile(&profile).await?;
        self.cache.reload().await?;
        info!("chat {} updated", chat_id);
        Ok(Reply::Text(confirmation))
    }

    fn list_chats(&self) -> String {
        let table = self.cache.snapshot();
        let profiles = table.sorted_profiles();
        if profiles.is_empty() {
            return "No chats yet".to_string();
        }
        profiles
            .iter()
            .map(|p| {
                let last = self
                    .scheduler
                    .last_interjection(p.chat_id)
                    .map(format_time)
                    .unwrap_or_else(|| "never".to_string());
                format!(
                    "{} | {} | {} | last interjection: {} | billed to: {}",
                    p.chat_id,
                    p.chat_name,
                    p.chat_type,
                    last,
                    format_time(p.billed_to)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_config(p: &ChatProfile) -> String {
    format!(
        "Chat: {} ({})\nModel: {}\nAgro level: {}%\nAgro cooldown: {} min\nDelete preview messages: {}\nBilled to: {}\n\nQuestion prompt:\n{}\n\nRandom prompt:\n{}",
        p.chat_name,
        p.chat_id,
        p.model,
        p.agro_level,
        p.agro_cooldown,
        p.delete_preview_messages,
        format_time(p.billed_to),
        p.question_prompt,
        p.random_prompt
    )
}
