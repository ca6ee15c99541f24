use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use nafanya_ai::{
    GeminiProvider, HarmThreshold, ImageProvider, OpenAiCompatibleProvider, ProviderConfig,
    ProviderSlot, ResponseRouter, SafetySetting, TextProvider,
};
use nafanya_common::models::ProviderKind;
use nafanya_common::traits::platform_traits::ChatTransport;
use nafanya_common::traits::telemetry_traits::ErrorReporter;
use nafanya_core::cache::ChatConfigCache;
use nafanya_core::crypto::{OsRandom, RandomSource};
use nafanya_core::platforms::telegram::{TelegramClient, TelegramRuntime};
use nafanya_core::repositories::{
    AdminRosterRepository, PostgresAdminRosterRepository, PostgresChatProfileRepository,
};
use nafanya_core::scheduler::InterjectionScheduler;
use nafanya_core::services::{AdminCommandService, MessageService, MessageSettings};
use nafanya_core::telemetry::TracingReporter;
use nafanya_core::{Database, Error};

use crate::config::Args;

/// Builds one adapter per configured vendor. Vendors without a token stay absent.
pub fn build_router(args: &Args, reporter: Arc<dyn ErrorReporter>) -> Result<ResponseRouter, Error> {
    let timeout = Duration::from_secs(args.provider_timeout_secs);
    let mut router = ResponseRouter::new(reporter);

    if args.token_for(args.default_provider).is_none() {
        return Err(Error::Config(format!(
            "default provider '{}' has no API token configured",
            args.default_provider
        )));
    }

    if let Some(key) = args.token_for(ProviderKind::OpenAi) {
        let openai = Arc::new(OpenAiCompatibleProvider::openai(
            ProviderConfig::new(key, &args.openai_model).with_timeout(timeout),
        )?);
        let images: Arc<dyn ImageProvider> = openai.clone();
        let text: Arc<dyn TextProvider> = openai;
        router = router
            .with_provider(ProviderKind::OpenAi, ProviderSlot::Present(text))
            .with_image_provider(Some(images));
    }

    if let Some(key) = args.token_for(ProviderKind::DeepSeek) {
        let deepseek = OpenAiCompatibleProvider::deepseek(
            ProviderConfig::new(key, &args.deepseek_model).with_timeout(timeout),
        )?;
        router = router.with_provider(ProviderKind::DeepSeek, ProviderSlot::Present(Arc::new(deepseek)));
    }

    if let Some(key) = args.token_for(ProviderKind::Google) {
        let gemini = GeminiProvider::new(
            ProviderConfig::new(key, &args.google_model).with_timeout(timeout),
            SafetySetting::uniform(HarmThreshold::BlockNone),
        )?;
        router = router.with_provider(ProviderKind::Google, ProviderSlot::Present(Arc::new(gemini)));
    }

    for kind in ProviderKind::ALL {
        if !router.available().contains(&kind) {
            warn!("provider '{}' is not configured; chats using it will get an apology", kind);
        }
    }
    Ok(router)
}

pub async fn run_server(args: Args) -> Result<(), Error> {
    // 1) Store
    let db = Database::new(&args.database_url).await?;
    db.migrate().await?;

    let chat_repo = Arc::new(PostgresChatProfileRepository::new(db.pool().clone()));
    let admin_repo = Arc::new(PostgresAdminRosterRepository::new(db.pool().clone()));
    admin_repo.ensure_admin_roster(args.default_admin).await?;

    // 2) Providers
    let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingReporter);
    let router = Arc::new(build_router(&args, reporter.clone())?);

    // 3) Cache + scheduler
    let cache = Arc::new(ChatConfigCache::new(
        chat_repo.clone(),
        admin_repo.clone(),
        args.default_provider,
    ));
    cache.reload().await?;
    info!("Loaded {} chats", cache.snapshot().chats.len());

    let rng: Arc<dyn RandomSource> = Arc::new(OsRandom);
    let scheduler = Arc::new(InterjectionScheduler::new(cache.clone(), rng.clone()));

    // 4) Telegram
    let telegram = TelegramClient::new(&args.bot_token)?;
    let me = telegram.get_me().await?;
    let bot_username = me.username.clone().unwrap_or_default();
    info!("Authorized on Telegram as @{} ({})", bot_username, me.id);
    let transport: Arc<dyn ChatTransport> = Arc::new(telegram.clone());

    // 5) Services
    let commands = Arc::new(AdminCommandService::new(
        cache.clone(),
        scheduler.clone(),
        chat_repo,
        admin_repo,
        transport.clone(),
        reporter.clone(),
    ));
    let service = Arc::new(MessageService::new(
        cache,
        scheduler,
        router,
        commands,
        transport,
        reporter,
        rng,
        MessageSettings {
            bot_names: args.bot_names.clone(),
            bot_user_id: me.id,
            max_tokens: args.max_tokens,
        },
    ));

    // 6) Handle Ctrl-C to signal shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; shutting down...");
        let _ = shutdown_tx.send(true);
    });

    // 7) Poll until shutdown
    TelegramRuntime::new(telegram, bot_username, service, shutdown_rx)
        .run()
        .await
}
