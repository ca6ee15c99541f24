// File: nafanya-common/src/models/chat.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::ai::ProviderKind;

pub const MIN_AGRO_LEVEL: i32 = 0;
pub const MAX_AGRO_LEVEL: i32 = 100;
pub const MIN_AGRO_COOLDOWN: i32 = 10;
pub const MAX_AGRO_COOLDOWN: i32 = 1440;
pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 1000;

pub const DEFAULT_AGRO_LEVEL: i32 = 5;
pub const DEFAULT_AGRO_COOLDOWN: i32 = 10;

/// Token replaced by a randomly rolled mood when a prompt is compiled.
pub const EMOTION_TOKEN: &str = "{emotion}";

pub const DEFAULT_QUESTION_PROMPT: &str = "Ты Нафаня, домовёнок, который живёт в этом чате. \
Тебе задали вопрос. Ответь на него {emotion}, коротко и по делу.";

pub const DEFAULT_RANDOM_PROMPT: &str = "Ты Нафаня, домовёнок, который живёт в этом чате. \
Ты случайно подслушал разговор. Вмешайся в него {emotion}, одной-двумя фразами.";

/// Kind of a chat as reported by the messaging platform.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Group-like chats are the only place spontaneous interjections happen.
    pub fn is_multi_party(&self) -> bool {
        !matches!(self, ChatKind::Private)
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatKind::Private => write!(f, "private"),
            ChatKind::Group => write!(f, "group"),
            ChatKind::Supergroup => write!(f, "supergroup"),
            ChatKind::Channel => write!(f, "channel"),
        }
    }
}

impl FromStr for ChatKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(ChatKind::Private),
            "group" => Ok(ChatKind::Group),
            "supergroup" => Ok(ChatKind::Supergroup),
            "channel" => Ok(ChatKind::Channel),
            other => Err(Error::Parse(format!("Unknown chat kind: {}", other))),
        }
    }
}

/// Per-chat settings, one row per chat the bot has ever seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatProfile {
    pub chat_id: i64,
    pub chat_type: ChatKind,
    pub chat_name: String,
    pub question_prompt: String,
    pub random_prompt: String,
    /// Percent chance (0..=100) that a qualifying message triggers an interjection.
    pub agro_level: i32,
    /// Minutes (10..=1440) between two interjections in the same chat.
    pub agro_cooldown: i32,
    /// The chat is served only while `now < billed_to`.
    pub billed_to: DateTime<Utc>,
    pub delete_preview_messages: bool,
    /// Name of the provider answering in this chat (see [`ProviderKind`]).
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatProfile {
    /// Profile provisioned on first contact with an unseen chat.
    /// Entitlement starts out already lapsed (`billed_to == now`).
    pub fn new_default(
        chat_id: i64,
        chat_type: ChatKind,
        chat_name: impl Into<String>,
        model: ProviderKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            chat_id,
            chat_type,
            chat_name: chat_name.into(),
            question_prompt: DEFAULT_QUESTION_PROMPT.to_string(),
            random_prompt: DEFAULT_RANDOM_PROMPT.to_string(),
            agro_level: DEFAULT_AGRO_LEVEL,
            agro_cooldown: DEFAULT_AGRO_COOLDOWN,
            billed_to: now,
            delete_preview_messages: false,
            model: model.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_entitled_at(&self, now: DateTime<Utc>) -> bool {
        now < self.billed_to
    }

    pub fn cooldown(&self) -> Duration {
        Duration::minutes(i64::from(self.agro_cooldown))
    }

    /// Extends entitlement by `days`. A lapsed entitlement restarts from
    /// `now`; an active one is extended from its current expiry.
    pub fn extend_entitlement(&mut self, days: i64, now: DateTime<Utc>) -> Result<(), Error> {
        let base = if self.billed_to < now { now } else { self.billed_to };
        self.billed_to = Duration::try_days(days)
            .and_then(|d| base.checked_add_signed(d))
            .ok_or_else(|| Error::Parse(format!("{} days is out of range", days)))?;
        Ok(())
    }

    pub fn grant_lifetime(&mut self) {
        self.billed_to = lifetime_expiry();
    }

    pub fn set_agro_level(&mut self, level: i32) -> Result<(), Error> {
        if !(MIN_AGRO_LEVEL..=MAX_AGRO_LEVEL).contains(&level) {
            return Err(Error::Parse(format!(
                "agro level must be between {} and {}, got {}",
                MIN_AGRO_LEVEL, MAX_AGRO_LEVEL, level
            )));
        }
        self.agro_level = level;
        Ok(())
    }

    pub fn set_agro_cooldown(&mut self, minutes: i32) -> Result<(), Error> {
        if !(MIN_AGRO_COOLDOWN..=MAX_AGRO_COOLDOWN).contains(&minutes) {
            return Err(Error::Parse(format!(
                "agro cooldown must be between {} and {} minutes, got {}",
                MIN_AGRO_COOLDOWN, MAX_AGRO_COOLDOWN, minutes
            )));
        }
        self.agro_cooldown = minutes;
        Ok(())
    }

    pub fn set_prompt(&mut self, kind: PromptKind, prompt: &str) -> Result<(), Error> {
        let len = prompt.chars().count();
        if len > MAX_PROMPT_CHARS {
            return Err(Error::Parse(format!(
                "Prompt is too long, max length is {} symbols", MAX_PROMPT_CHARS
            )));
        }
        if len < MIN_PROMPT_CHARS {
            return Err(Error::Parse(format!(
                "Prompt is too short, min length is {} symbols", MIN_PROMPT_CHARS
            )));
        }
        match kind {
            PromptKind::Question => self.question_prompt = prompt.to_string(),
            PromptKind::RandomInterference => self.random_prompt = prompt.to_string(),
        }
        Ok(())
    }

    pub fn prompt(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Question => &self.question_prompt,
            PromptKind::RandomInterference => &self.random_prompt,
        }
    }
}

/// Which of the two chat templates a response is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Question,
    RandomInterference,
}

/// "VIP" chats are billed until this date.
pub fn lifetime_expiry() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2077, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(now: DateTime<Utc>) -> ChatProfile {
        ChatProfile::new_default(-100, ChatKind::Supergroup, "test chat", ProviderKind::OpenAi, now)
    }

    #[test]
    fn default_profile_is_not_entitled() {
        let now = Utc::now();
        let p = profile(now);
        assert_eq!(p.agro_level, 5);
        assert_eq!(p.agro_cooldown, 10);
        assert_eq!(p.billed_to, now);
        assert!(!p.is_entitled_at(now));
        assert!(p.question_prompt.contains(EMOTION_TOKEN));
        assert!(p.random_prompt.contains(EMOTION_TOKEN));
    }

    #[test]
    fn extending_lapsed_entitlement_starts_from_now() {
        let now = Utc::now();
        let mut p = profile(now - Duration::days(90));
        p.billed_to = now - Duration::days(10);
        p.extend_entitlement(30, now).unwrap();
        assert_eq!(p.billed_to, now + Duration::days(30));
    }

    #[test]
    fn extending_active_entitlement_stacks() {
        let now = Utc::now();
        let mut p = profile(now);
        p.billed_to = now + Duration::days(5);
        p.extend_entitlement(30, now).unwrap();
        assert_eq!(p.billed_to, now + Duration::days(35));
    }

    #[test]
    fn oversized_extension_is_rejected() {
        let now = Utc::now();
        let mut p = profile(now);
        let before = p.billed_to;
        assert!(matches!(p.extend_entitlement(100_000_000_000, now), Err(Error::Parse(_))));
        assert!(matches!(p.extend_entitlement(i64::MAX, now), Err(Error::Parse(_))));
        assert_eq!(p.billed_to, before);
    }

    #[test]
    fn lifetime_is_2077() {
        let mut p = profile(Utc::now());
        p.grant_lifetime();
        assert_eq!(p.billed_to.to_rfc3339(), "2077-01-01T00:00:00+00:00");
    }

    #[test]
    fn setters_enforce_bounds() {
        let mut p = profile(Utc::now());
        assert!(p.set_agro_level(101).is_err());
        assert!(p.set_agro_level(-1).is_err());
        p.set_agro_level(100).unwrap();
        assert_eq!(p.agro_level, 100);

        assert!(p.set_agro_cooldown(9).is_err());
        assert!(p.set_agro_cooldown(1441).is_err());
        p.set_agro_cooldown(1440).unwrap();
        assert_eq!(p.agro_cooldown, 1440);

        assert!(p.set_prompt(PromptKind::Question, "short").is_err());
        assert!(p.set_prompt(PromptKind::Question, &"x".repeat(1001)).is_err());
        p.set_prompt(PromptKind::RandomInterference, "be grumpy {emotion}").unwrap();
        assert_eq!(p.prompt(PromptKind::RandomInterference), "be grumpy {emotion}");
    }

    #[test]
    fn prompt_length_counts_characters_not_bytes() {
        let mut p = profile(Utc::now());
        // 10 cyrillic letters are 20 bytes
        p.set_prompt(PromptKind::Question, "абвгдежзик").unwrap();
    }

    #[test]
    fn only_private_chats_are_single_party() {
        assert!(!ChatKind::Private.is_multi_party());
        assert!(ChatKind::Group.is_multi_party());
        assert!(ChatKind::Supergroup.is_multi_party());
        assert!(ChatKind::Channel.is_multi_party());
        assert_eq!("SuperGroup".parse::<ChatKind>().unwrap(), ChatKind::Supergroup);
        assert!("forum".parse::<ChatKind>().is_err());
    }
}
