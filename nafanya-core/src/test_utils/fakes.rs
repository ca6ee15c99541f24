// File: nafanya-core/src/test_utils/fakes.rs

//! In-memory stand-ins for the store and the random source.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use nafanya_common::models::{AdminRoster, ChatProfile};
use nafanya_common::traits::telemetry_traits::ErrorReporter;
use crate::crypto::RandomSource;
use crate::repositories::{AdminRosterRepository, ChatProfileRepository};
use crate::Error;

#[derive(Default)]
pub struct InMemoryChatRepository {
    pub chats: Mutex<HashMap<i64, ChatProfile>>,
    /// When set, every call fails with a database-style error.
    pub fail: AtomicBool,
    pub updates: AtomicUsize,
}

impl InMemoryChatRepository {
    pub fn with_profiles(profiles: Vec<ChatProfile>) -> Self {
        let repo = Self::default();
        {
            let mut chats = repo.chats.lock();
            for p in profiles {
                chats.insert(p.chat_id, p);
            }
        }
        repo
    }

    pub fn stored(&self, chat_id: i64) -> Option<ChatProfile> {
        self.chats.lock().get(&chat_id).cloned()
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatProfileRepository for InMemoryChatRepository {
    async fn get_all_chat_profiles(&self) -> Result<Vec<ChatProfile>, Error> {
        self.check()?;
        Ok(self.chats.lock().values().cloned().collect())
    }

    async fn get_chat_profile(&self, chat_id: i64) -> Result<Option<ChatProfile>, Error> {
        self.check()?;
        Ok(self.stored(chat_id))
    }

    async fn create_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error> {
        self.check()?;
        self.chats.lock().entry(profile.chat_id).or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn update_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error> {
        self.check()?;
        let mut chats = self.chats.lock();
        match chats.get_mut(&profile.chat_id) {
            Some(existing) => {
                *existing = profile.clone();
                self.updates.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(Error::NotFound(format!("chat {}", profile.chat_id))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryAdminRepository {
    pub roster: Mutex<Option<AdminRoster>>,
}

impl InMemoryAdminRepository {
    pub fn with_admins(admins: Vec<i64>) -> Self {
        Self { roster: Mutex::new(Some(AdminRoster::new(admins))) }
    }
}

#[async_trait]
impl AdminRosterRepository for InMemoryAdminRepository {
    async fn get_admin_roster(&self) -> Result<AdminRoster, Error> {
        self.roster
            .lock()
            .clone()
            .ok_or_else(|| Error::NotFound("bot_config row".to_string()))
    }

    async fn add_admin(&self, user_id: i64) -> Result<(), Error> {
        let mut roster = self.roster.lock();
        let roster = roster
            .as_mut()
            .ok_or_else(|| Error::NotFound("bot_config row".to_string()))?;
        if !roster.contains(user_id) {
            roster.admins.push(user_id);
        }
        Ok(())
    }

    async fn ensure_admin_roster(&self, default_admin: i64) -> Result<(), Error> {
        let mut roster = self.roster.lock();
        if roster.is_none() {
            *roster = Some(AdminRoster::new(vec![default_admin]));
        }
        Ok(())
    }
}

/// Plays back a fixed sequence of draws, then repeats the last one.
/// An empty script behaves like a broken entropy source.
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<u32>>,
    last: Mutex<Option<u32>>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    pub fn always(n: u32) -> Self {
        Self::new([n])
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&self, bound: u32) -> Result<u32, Error> {
        let next = self.draws.lock().pop_front();
        let mut last = self.last.lock();
        let v = match next.or(*last) {
            Some(v) => v,
            None => return Err(Error::Entropy("scripted source exhausted".to_string())),
        };
        *last = Some(v);
        Ok(v % bound.max(1))
    }
}

/// Reporter that remembers what it was given.
#[derive(Default)]
pub struct RecordingReporter {
    pub errors: Mutex<Vec<String>>,
    pub breadcrumbs: Mutex<Vec<(String, String)>>,
}

impl ErrorReporter for RecordingReporter {
    fn capture_error(&self, error: &Error) {
        self.errors.lock().push(error.to_string());
    }

    fn add_breadcrumb(&self, category: &str, message: &str) {
        self.breadcrumbs.lock().push((category.to_string(), message.to_string()));
    }
}
