// File: nafanya-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use parking_lot::Mutex;

use nafanya_ai::{ImageProvider, ProviderSlot, ResponseRouter, TextProvider};
use nafanya_common::models::{
    BotCommand, ChatAction, ChatKind, ChatProfile, InboundMessage, MessageAuthor, ProviderKind,
};
use nafanya_common::traits::platform_traits::ChatTransport;
use nafanya_core::cache::ChatConfigCache;
use nafanya_core::crypto::RandomSource;
use nafanya_core::scheduler::InterjectionScheduler;
use nafanya_core::services::{AdminCommandService, MessageService, MessageSettings};
use nafanya_core::test_utils::fakes::{
    InMemoryAdminRepository, InMemoryChatRepository, RecordingReporter, ScriptedRandom,
};
use nafanya_core::Error;

pub const BOT_ADMIN: i64 = 1;
pub const BOT_USER_ID: i64 = 999;
pub const GROUP_CHAT: i64 = -1001;
pub const PRIVATE_CHAT: i64 = 500;

mock! {
    pub Transport {}

    #[async_trait]
    impl ChatTransport for Transport {
        async fn send_message(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), Error>;
        async fn send_photo(&self, chat_id: i64, reply_to: Option<i64>, photo_url: &str) -> Result<(), Error>;
        async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), Error>;
        async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), Error>;
        async fn chat_administrators(&self, chat_id: i64) -> Result<Vec<i64>, Error>;
    }
}

/// Everything the bot pushed to the chat platform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message { chat_id: i64, reply_to: Option<i64>, text: String },
    Photo { chat_id: i64, reply_to: Option<i64>, url: String },
    Action { chat_id: i64, action: ChatAction },
    Delete { chat_id: i64, message_id: i64 },
}

/// Transport mock that records every call. `chat_admins` is what
/// `getChatAdministrators` answers for any chat. With `failing_actions`
/// every chat action is rejected the way a rate-limited Bot API does.
pub fn recording_transport(
    chat_admins: Vec<i64>,
    failing_actions: bool,
) -> (MockTransport, Arc<Mutex<Vec<Outbound>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let mut transport = MockTransport::new();

    let log = sent.clone();
    transport.expect_send_message().returning(move |chat_id, reply_to, text| {
        log.lock().push(Outbound::Message { chat_id, reply_to, text: text.to_string() });
        Ok(())
    });
    let log = sent.clone();
    transport.expect_send_photo().returning(move |chat_id, reply_to, url| {
        log.lock().push(Outbound::Photo { chat_id, reply_to, url: url.to_string() });
        Ok(())
    });
    let log = sent.clone();
    transport.expect_send_chat_action().returning(move |chat_id, action| {
        if failing_actions {
            return Err(Error::Platform("429 Too Many Requests".to_string()));
        }
        log.lock().push(Outbound::Action { chat_id, action });
        Ok(())
    });
    let log = sent.clone();
    transport.expect_delete_message().returning(move |chat_id, message_id| {
        log.lock().push(Outbound::Delete { chat_id, message_id });
        Ok(())
    });
    transport
        .expect_chat_administrators()
        .returning(move |_| Ok(chat_admins.clone()));

    (transport, sent)
}

/// Answers every prompt with "<answer>" and remembers what it was asked.
pub struct StubProvider {
    pub answer: Option<String>,
    pub calls: Mutex<Vec<(String, String, u32)>>,
}

impl StubProvider {
    pub fn answering(answer: &str) -> Self {
        Self { answer: Some(answer.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { answer: None, calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl TextProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_text(&self, system_prompt: &str, user_input: &str, max_tokens: u32) -> anyhow::Result<String> {
        self.calls
            .lock()
            .push((system_prompt.to_string(), user_input.to_string(), max_tokens));
        self.answer
            .clone()
            .ok_or_else(|| anyhow::anyhow!("API error: upstream unavailable"))
    }
}

pub struct StubImages;

#[async_trait]
impl ImageProvider for StubImages {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!("https://img.example/{}.png", prompt.replace(' ', "_")))
    }
}

pub fn profile(chat_id: i64, kind: ChatKind, entitled: bool) -> ChatProfile {
    let now = Utc::now();
    let mut p = ChatProfile::new_default(chat_id, kind, format!("chat {chat_id}"), ProviderKind::OpenAi, now - Duration::days(60));
    p.question_prompt = "Answer {emotion}".to_string();
    p.random_prompt = "Interject {emotion}".to_string();
    p.billed_to = if entitled { now + Duration::days(30) } else { now - Duration::days(1) };
    p
}

pub fn author(user_id: i64) -> MessageAuthor {
    MessageAuthor {
        user_id,
        first_name: "Ivan".to_string(),
        last_name: Some("Petrov".to_string()),
        username: Some("ivan".to_string()),
        is_bot: false,
    }
}

pub fn message(chat_id: i64, kind: ChatKind, from: i64, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: 100,
        chat_id,
        chat_kind: kind,
        chat_title: if kind == ChatKind::Private { None } else { Some(format!("chat {chat_id}")) },
        chat_first_name: if kind == ChatKind::Private { Some("Ivan".into()) } else { None },
        chat_last_name: if kind == ChatKind::Private { Some("Petrov".into()) } else { None },
        from: author(from),
        text: text.to_string(),
        command: None,
        reply_to: None,
    }
}

pub fn command(chat_id: i64, kind: ChatKind, from: i64, name: &str, arguments: &str) -> InboundMessage {
    let mut msg = message(chat_id, kind, from, &format!("/{name} {arguments}"));
    msg.command = Some(BotCommand { name: name.to_string(), arguments: arguments.to_string() });
    msg
}

pub struct Harness {
    pub service: MessageService,
    pub commands: Arc<AdminCommandService>,
    pub cache: Arc<ChatConfigCache>,
    pub scheduler: Arc<InterjectionScheduler>,
    pub chat_repo: Arc<InMemoryChatRepository>,
    pub admin_repo: Arc<InMemoryAdminRepository>,
    pub reporter: Arc<RecordingReporter>,
    pub provider: Arc<StubProvider>,
    pub sent: Arc<Mutex<Vec<Outbound>>>,
}

pub struct HarnessBuilder {
    profiles: Vec<ChatProfile>,
    provider: StubProvider,
    rng: Arc<dyn RandomSource>,
    chat_admins: Vec<i64>,
    with_images: bool,
    failing_actions: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            profiles: Vec::new(),
            provider: StubProvider::answering("answer"),
            rng: Arc::new(ScriptedRandom::always(99)),
            chat_admins: Vec::new(),
            with_images: true,
            failing_actions: false,
        }
    }

    pub fn profile(mut self, p: ChatProfile) -> Self {
        self.profiles.push(p);
        self
    }

    pub fn provider(mut self, provider: StubProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn rng(mut self, rng: ScriptedRandom) -> Self {
        self.rng = Arc::new(rng);
        self
    }

    pub fn chat_admins(mut self, admins: Vec<i64>) -> Self {
        self.chat_admins = admins;
        self
    }

    pub fn without_images(mut self) -> Self {
        self.with_images = false;
        self
    }

    pub fn failing_actions(mut self) -> Self {
        self.failing_actions = true;
        self
    }

    pub async fn build(self) -> Result<Harness, Error> {
        let chat_repo = Arc::new(InMemoryChatRepository::with_profiles(self.profiles));
        let admin_repo = Arc::new(InMemoryAdminRepository::with_admins(vec![BOT_ADMIN]));
        let reporter = Arc::new(RecordingReporter::default());

        let cache = Arc::new(ChatConfigCache::new(chat_repo.clone(), admin_repo.clone(), ProviderKind::OpenAi));
        cache.reload().await?;

        let scheduler = Arc::new(InterjectionScheduler::new(cache.clone(), self.rng.clone()));

        let provider = Arc::new(self.provider);
        let images: Option<Arc<dyn ImageProvider>> = if self.with_images { Some(Arc::new(StubImages)) } else { None };
        let router = Arc::new(
            ResponseRouter::new(reporter.clone())
                .with_provider(ProviderKind::OpenAi, ProviderSlot::Present(provider.clone()))
                .with_image_provider(images),
        );

        let (transport, sent) = recording_transport(self.chat_admins, self.failing_actions);
        let transport: Arc<dyn ChatTransport> = Arc::new(transport);

        let commands = Arc::new(AdminCommandService::new(
            cache.clone(),
            scheduler.clone(),
            chat_repo.clone(),
            admin_repo.clone(),
            transport.clone(),
            reporter.clone(),
        ));

        let service = MessageService::new(
            cache.clone(),
            scheduler.clone(),
            router,
            commands.clone(),
            transport,
            reporter.clone(),
            self.rng,
            MessageSettings {
                bot_names: vec!["Нафаня".to_string()],
                bot_user_id: BOT_USER_ID,
                max_tokens: 1000,
            },
        );

        Ok(Harness {
            service,
            commands,
            cache,
            scheduler,
            chat_repo,
            admin_repo,
            reporter,
            provider,
            sent,
        })
    }
}

impl Harness {
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}
