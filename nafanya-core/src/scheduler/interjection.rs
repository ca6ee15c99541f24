use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::cache::ChatConfigCache;
use crate::crypto::RandomSource;
use crate::Error;

/// Messages must be longer than this many characters to be considered.
pub const MIN_CANDIDATE_CHARS: usize = 20;
/// ...and contain more than this many space-separated words.
pub const MIN_CANDIDATE_WORDS: usize = 3;

/// Cheap gate applied before the scheduler is consulted so trivial chatter
/// never rolls the dice.
pub fn is_interjection_candidate(text: &str) -> bool {
    text.chars().count() > MIN_CANDIDATE_CHARS && text.split(' ').count() > MIN_CANDIDATE_WORDS
}

/// Decides whether the bot spontaneously joins a group conversation.
///
/// Holds the last-fire time per chat. The state lives only in memory and is
/// lost on restart, which just means every chat starts with a cold cooldown.
pub struct InterjectionScheduler {
    cache: Arc<ChatConfigCache>,
    rng: Arc<dyn RandomSource>,
    last_fired: DashMap<i64, DateTime<Utc>>,
}

impl InterjectionScheduler {
    pub fn new(cache: Arc<ChatConfigCache>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            cache,
            rng,
            last_fired: DashMap::new(),
        }
    }

    pub fn should_interject(&self, chat_id: i64) -> Result<bool, Error> {
        self.should_interject_at(chat_id, Utc::now())
    }

    /// Fires when the draw `n` in `[0, 100)` satisfies `n > 100 - p` and more
    /// than the chat's cooldown has passed since the last fire.
    ///
    /// Only an entropy failure is an error.
    pub fn should_interject_at(&self, chat_id: i64, now: DateTime<Utc>) -> Result<bool, Error> {
        let profile = match self.cache.lookup(chat_id) {
            Some(p) => p,
            None => return Ok(false),
        };
        if !profile.chat_type.is_multi_party() {
            return Ok(false);
        }

        let n = i64::from(self.rng.below(100)?);
        let p = i64::from(profile.agro_level);
        if n <= 100 - p {
            return Ok(false);
        }

        // The entry guard holds the shard lock, so check-and-stamp for one
        // chat cannot interleave with another evaluation of the same chat.
        let mut last = self
            .last_fired
            .entry(chat_id)
            .or_insert(DateTime::<Utc>::UNIX_EPOCH);
        if now.signed_duration_since(*last) <= profile.cooldown() {
            debug!("chat {}: draw {} passed but cooldown is active", chat_id, n);
            return Ok(false);
        }
        *last = now;
        debug!("chat {}: interjecting (draw {}, agro {})", chat_id, n, p);
        Ok(true)
    }

    /// Time of the last spontaneous interjection, `None` if it never happened.
    pub fn last_interjection(&self, chat_id: i64) -> Option<DateTime<Utc>> {
        self.last_fired
            .get(&chat_id)
            .map(|t| *t)
            .filter(|t| *t > DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use nafanya_common::models::{ChatKind, ChatProfile, ProviderKind};
    use crate::test_utils::fakes::{InMemoryAdminRepository, InMemoryChatRepository, ScriptedRandom};

    const GROUP: i64 = -1001;
    const PRIVATE: i64 = 42;

    async fn cache_with(agro_level: i32, agro_cooldown: i32) -> Arc<ChatConfigCache> {
        let now = Utc::now();
        let mut group = ChatProfile::new_default(GROUP, ChatKind::Supergroup, "group", ProviderKind::OpenAi, now);
        group.agro_level = agro_level;
        group.agro_cooldown = agro_cooldown;
        let mut private = ChatProfile::new_default(PRIVATE, ChatKind::Private, "Ivan", ProviderKind::OpenAi, now);
        private.agro_level = 100;

        let cache = ChatConfigCache::new(
            Arc::new(InMemoryChatRepository::with_profiles(vec![group, private])),
            Arc::new(InMemoryAdminRepository::with_admins(vec![1])),
            ProviderKind::OpenAi,
        );
        cache.reload().await.unwrap();
        Arc::new(cache)
    }

    fn scheduler(cache: Arc<ChatConfigCache>, rng: ScriptedRandom) -> InterjectionScheduler {
        InterjectionScheduler::new(cache, Arc::new(rng))
    }

    #[tokio::test]
    async fn zero_probability_never_fires() {
        let cache = cache_with(0, 10).await;
        for n in 0..100 {
            let s = scheduler(cache.clone(), ScriptedRandom::always(n));
            assert!(!s.should_interject(GROUP).unwrap(), "draw {n} fired at p=0");
        }
    }

    #[tokio::test]
    async fn full_probability_fires_once_per_cooldown() {
        let cache = cache_with(100, 10).await;
        let s = scheduler(cache, ScriptedRandom::always(0));
        let t0 = Utc::now();

        assert!(s.should_interject_at(GROUP, t0).unwrap());
        assert!(!s.should_interject_at(GROUP, t0).unwrap());
        assert!(!s.should_interject_at(GROUP, t0 + Duration::minutes(10)).unwrap());
        assert!(s.should_interject_at(GROUP, t0 + Duration::minutes(10) + Duration::seconds(1)).unwrap());
        assert_eq!(s.last_interjection(GROUP), Some(t0 + Duration::minutes(10) + Duration::seconds(1)));
    }

    #[tokio::test]
    async fn draw_must_exceed_threshold() {
        let cache = cache_with(50, 10).await;
        let s = scheduler(cache.clone(), ScriptedRandom::always(80));
        assert!(s.should_interject(GROUP).unwrap());

        let s = scheduler(cache.clone(), ScriptedRandom::always(40));
        assert!(!s.should_interject(GROUP).unwrap());

        // strict comparison: n == 100 - p does not fire
        let s = scheduler(cache, ScriptedRandom::always(50));
        assert!(!s.should_interject(GROUP).unwrap());
    }

    #[tokio::test]
    async fn private_and_unknown_chats_never_fire() {
        let cache = cache_with(100, 10).await;
        let s = scheduler(cache, ScriptedRandom::always(99));
        assert!(!s.should_interject(PRIVATE).unwrap());
        assert!(!s.should_interject(555).unwrap());
        assert_eq!(s.last_interjection(GROUP), None);
    }

    #[tokio::test]
    async fn entropy_failure_is_fatal() {
        let cache = cache_with(100, 10).await;
        let s = scheduler(cache, ScriptedRandom::new([]));
        let err = s.should_interject(GROUP).unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_candidates_fire_once() {
        const TASKS: usize = 16;
        let cache = cache_with(100, 10).await;
        let s = Arc::new(scheduler(cache, ScriptedRandom::always(99)));
        let barrier = Arc::new(tokio::sync::Barrier::new(TASKS));
        let now = Utc::now();

        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let s = s.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    s.should_interject_at(GROUP, now).unwrap()
                })
            })
            .collect();

        let mut fired = 0;
        for h in handles {
            if h.await.unwrap() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn candidate_gate() {
        assert!(!is_interjection_candidate("short one"));
        assert!(!is_interjection_candidate("threewordsonly but verylongindeed"));
        assert!(is_interjection_candidate("this message is long enough to count"));
        // exactly 20 characters is not enough
        assert!(!is_interjection_candidate("aaaa bbbb cccc dddd "));
    }
}
