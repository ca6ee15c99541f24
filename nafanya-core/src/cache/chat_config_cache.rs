// File: src/cache/chat_config_cache.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use nafanya_common::models::{AdminRoster, ChatProfile, InboundMessage, ProviderKind};
use crate::repositories::{AdminRosterRepository, ChatProfileRepository};
use crate::Error;

/// Immutable snapshot of everything the cache serves. Replaced as a whole on
/// reload, never mutated in place.
#[derive(Debug, Default)]
pub struct ChatTable {
    pub chats: HashMap<i64, ChatProfile>,
    pub admins: AdminRoster,
}

impl ChatTable {
    /// Profiles ordered by chat id.
    pub fn sorted_profiles(&self) -> Vec<&ChatProfile> {
        let mut profiles: Vec<&ChatProfile> = self.chats.values().collect();
        profiles.sort_by_key(|p| p.chat_id);
        profiles
    }
}

/// Read-mostly in-memory view of chat settings and the admin roster.
///
/// Writers go to the repositories and then call [`ChatConfigCache::reload`];
/// until then lookups may return the previous value.
pub struct ChatConfigCache {
    chat_repo: Arc<dyn ChatProfileRepository>,
    admin_repo: Arc<dyn AdminRosterRepository>,
    default_model: ProviderKind,
    table: RwLock<Arc<ChatTable>>,
}

impl ChatConfigCache {
    /// Starts out empty; call [`reload`](Self::reload) before serving.
    pub fn new(
        chat_repo: Arc<dyn ChatProfileRepository>,
        admin_repo: Arc<dyn AdminRosterRepository>,
        default_model: ProviderKind,
    ) -> Self {
        Self {
            chat_repo,
            admin_repo,
            default_model,
            table: RwLock::new(Arc::new(ChatTable::default())),
        }
    }

    pub fn snapshot(&self) -> Arc<ChatTable> {
        self.table.read().clone()
    }

    pub fn lookup(&self, chat_id: i64) -> Option<ChatProfile> {
        self.snapshot().chats.get(&chat_id).cloned()
    }

    pub fn is_entitled(&self, chat_id: i64) -> bool {
        self.is_entitled_at(chat_id, Utc::now())
    }

    pub fn is_entitled_at(&self, chat_id: i64, now: DateTime<Utc>) -> bool {
        self.snapshot()
            .chats
            .get(&chat_id)
            .is_some_and(|p| p.is_entitled_at(now))
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.snapshot().admins.contains(user_id)
    }

    /// Full re-fetch from the store. The new table becomes visible to all
    /// readers at once.
    pub async fn reload(&self) -> Result<(), Error> {
        let profiles = self.chat_repo.get_all_chat_profiles().await?;
        let admins = self.admin_repo.get_admin_roster().await?;

        let chats: HashMap<i64, ChatProfile> =
            profiles.into_iter().map(|p| (p.chat_id, p)).collect();
        debug!("ChatConfigCache: reloaded {} chats, {} admins", chats.len(), admins.admins.len());

        *self.table.write() = Arc::new(ChatTable { chats, admins });
        Ok(())
    }

    /// Returns the chat's profile, provisioning a default one on first contact.
    pub async fn lookup_or_register(&self, msg: &InboundMessage) -> Result<ChatProfile, Error> {
        if let Some(profile) = self.lookup(msg.chat_id) {
            return Ok(profile);
        }

        let profile = ChatProfile::new_default(
            msg.chat_id,
            msg.chat_kind,
            msg.chat_display_name(),
            self.default_model,
            Utc::now(),
        );
        info!(
            "Registering new {} chat {} ('{}')",
            profile.chat_type, profile.chat_id, profile.chat_name
        );
        self.chat_repo.create_chat_profile(&profile).await?;
        self.reload().await?;

        // A concurrent registration may have won the insert.
        Ok(self.lookup(msg.chat_id).unwrap_or(profile))
    }
}
