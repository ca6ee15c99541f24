use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error, info, warn};

use nafanya_ai::ResponseRouter;
use nafanya_common::models::{ChatAction, ChatProfile, InboundMessage, PromptKind};
use nafanya_common::traits::telemetry_traits::ErrorReporter;
use crate::cache::ChatConfigCache;
use crate::crypto::RandomSource;
use crate::platforms::ChatTransport;
use crate::scheduler::{is_interjection_candidate, InterjectionScheduler};
use crate::services::link_preview::{contains_supported_link, fix_links, saved_click_message};
use crate::services::prompt::{build_user_input, compile_system_prompt};
use crate::services::AdminCommandService;
use crate::Error;

/// Sent instead of an answer when the provider call fails.
pub const APOLOGY: &str = "Something went wrong with AI API";

pub const DRAW_KEYWORD: &str = "нарисуй";
const MIN_DRAW_CHARS: usize = 16;
const MIN_DRAW_WORDS: usize = 2;

#[derive(Debug, Clone)]
pub struct MessageSettings {
    /// Names the bot answers to at the start of a message, matched case-insensitively.
    pub bot_names: Vec<String>,
    /// Telegram user id of the bot itself, used to recognise replies to it.
    pub bot_user_id: i64,
    pub max_tokens: u32,
}

/// How an inbound message gets handled. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command,
    Personal,
    LinkPreview,
    InterjectionCandidate,
    Ignore,
}

/// Entry point for every inbound chat message.
pub struct MessageService {
    cache: Arc<ChatConfigCache>,
    scheduler: Arc<InterjectionScheduler>,
    router: Arc<ResponseRouter>,
    commands: Arc<AdminCommandService>,
    transport: Arc<dyn ChatTransport>,
    reporter: Arc<dyn ErrorReporter>,
    rng: Arc<dyn RandomSource>,
    settings: MessageSettings,
}

impl MessageService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<ChatConfigCache>,
        scheduler: Arc<InterjectionScheduler>,
        router: Arc<ResponseRouter>,
        commands: Arc<AdminCommandService>,
        transport: Arc<dyn ChatTransport>,
        reporter: Arc<dyn ErrorReporter>,
        rng: Arc<dyn RandomSource>,
        settings: MessageSettings,
    ) -> Self {
        debug!("MessageService::new() called");
        Self {
            cache,
            scheduler,
            router,
            commands,
            transport,
            reporter,
            rng,
            settings,
        }
    }

    /// Handles one message end to end. Recoverable failures are logged and
    /// reported here; only fatal errors are returned.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<(), Error> {
        self.reporter.add_breadcrumb(
            "message",
            &format!("chat {} user {}", msg.chat_id, msg.from.user_id),
        );

        match self.process(&msg).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!("failed to handle message {} in chat {}: {}", msg.message_id, msg.chat_id, e);
                self.reporter.capture_error(&e);
                Ok(())
            }
        }
    }

    pub fn reporter(&self) -> Arc<dyn ErrorReporter> {
        self.reporter.clone()
    }

    pub fn route(&self, msg: &InboundMessage) -> Route {
        if msg.is_command() {
            Route::Command
        } else if self.is_personal(msg) {
            Route::Personal
        } else if contains_supported_link(&msg.text) {
            Route::LinkPreview
        } else if is_interjection_candidate(&msg.text) {
            Route::InterjectionCandidate
        } else {
            Route::Ignore
        }
    }

    async fn process(&self, msg: &InboundMessage) -> Result<(), Error> {
        let profile = self.cache.lookup_or_register(msg).await?;

        match self.route(msg) {
            Route::Command => self.commands.handle_command(msg).await,
            Route::Personal => {
                if !self.cache.is_entitled(msg.chat_id) {
                    debug!("chat {} is not entitled, ignoring personal message", msg.chat_id);
                    return Ok(());
                }
                self.answer_personal(msg, &profile).await
            }
            Route::LinkPreview => self.fix_previews(msg, &profile).await,
            Route::InterjectionCandidate => {
                if !self.cache.is_entitled(msg.chat_id) {
                    return Ok(());
                }
                if !self.scheduler.should_interject(msg.chat_id)? {
                    return Ok(());
                }
                info!("interjecting in chat {}", msg.chat_id);
                self.interject(msg, &profile).await
            }
            Route::Ignore => Ok(()),
        }
    }

    /// Starts with one of the bot's names, or replies to one of its messages.
    pub fn is_personal(&self, msg: &InboundMessage) -> bool {
        let lowered = msg.text.to_lowercase();
        let named = self
            .settings
            .bot_names
            .iter()
            .any(|name| !name.is_empty() && lowered.starts_with(&name.to_lowercase()));
        let replied_to_bot = msg
            .reply_to
            .as_ref()
            .and_then(|r| r.from.as_ref())
            .is_some_and(|author| author.user_id == self.settings.bot_user_id);
        named || replied_to_bot
    }

    async fn answer_personal(&self, msg: &InboundMessage, profile: &ChatProfile) -> Result<(), Error> {
        if is_draw_request(&msg.text) {
            return self.draw(msg).await;
        }

        self.show_action(msg.chat_id, ChatAction::Typing).await;
        let system_prompt = compile_system_prompt(profile.prompt(PromptKind::Question), self.rng.as_ref())?;
        let user_input = build_user_input(msg, &msg.text);
        self.reply_with_completion(msg, profile, &system_prompt, &user_input).await
    }

    async fn interject(&self, msg: &InboundMessage, profile: &ChatProfile) -> Result<(), Error> {
        self.show_action(msg.chat_id, ChatAction::Typing).await;
        let system_prompt = compile_system_prompt(profile.prompt(PromptKind::RandomInterference), self.rng.as_ref())?;
        let user_input = build_user_input(msg, &msg.text);
        self.reply_with_completion(msg, profile, &system_prompt, &user_input).await
    }

    async fn reply_with_completion(
        &self,
        msg: &InboundMessage,
        profile: &ChatProfile,
        system_prompt: &str,
        user_input: &str,
    ) -> Result<(), Error> {
        // The router has already logged and reported any failure.
        let text = match self
            .router
            .get_response(system_prompt, user_input, &profile.model, self.settings.max_tokens)
            .await
        {
            Ok(answer) => answer,
            Err(_) => APOLOGY.to_string(),
        };
        self.transport.send_message(msg.chat_id, Some(msg.message_id), &text).await
    }

    async fn draw(&self, msg: &InboundMessage) -> Result<(), Error> {
        let prompt = strip_draw_prefix(&msg.text, &self.settings.bot_names)?;
        self.show_action(msg.chat_id, ChatAction::UploadPhoto).await;

        match self.router.get_image_from_prompt(&prompt).await {
            Ok(url) => self.transport.send_photo(msg.chat_id, Some(msg.message_id), &url).await,
            Err(_) => self.transport.send_message(msg.chat_id, Some(msg.message_id), APOLOGY).await,
        }
    }

    async fn fix_previews(&self, msg: &InboundMessage, profile: &ChatProfile) -> Result<(), Error> {
        let author = &msg.from;
        for link in fix_links(&msg.text) {
            let text = saved_click_message(author.username.as_deref(), &author.first_name, &link);
            if let Err(e) = self.transport.send_message(msg.chat_id, None, &text).await {
                self.report_send_failure(msg.chat_id, "fixed link", &e);
            }
        }
        if profile.delete_preview_messages {
            if let Err(e) = self.transport.delete_message(msg.chat_id, msg.message_id).await {
                self.report_send_failure(msg.chat_id, "preview deletion", &e);
            }
        }
        Ok(())
    }

    /// Chat actions are cosmetic, a failed one never stops the reply.
    async fn show_action(&self, chat_id: i64, action: ChatAction) {
        if let Err(e) = self.transport.send_chat_action(chat_id, action).await {
            self.report_send_failure(chat_id, "chat action", &e);
        }
    }

    fn report_send_failure(&self, chat_id: i64, what: &str, e: &Error) {
        warn!("{} in chat {} failed: {}", what, chat_id, e);
        self.reporter.capture_error(e);
    }
}

/// Contains the draw keyword and is long enough to carry a picture description.
pub fn is_draw_request(text: &str) -> bool {
    text.to_lowercase().contains(DRAW_KEYWORD)
        && text.chars().count() >= MIN_DRAW_CHARS
        && text.split_whitespace().count() >= MIN_DRAW_WORDS
}

/// Drops a leading "<bot name>, нарисуй" so only the picture description is left.
pub fn strip_draw_prefix(text: &str, bot_names: &[String]) -> Result<String, Error> {
    let names = bot_names
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = if names.is_empty() {
        format!(r"(?i)^\s*{}\s*", DRAW_KEYWORD)
    } else {
        format!(r"(?i)^\s*(?:(?:{})[\s,]*)?{}\s*", names, DRAW_KEYWORD)
    };
    let re = Regex::new(&pattern).map_err(|e| Error::Internal(e.to_string()))?;
    Ok(re.replace(text, "").trim().to_string())
}
