use async_trait::async_trait;
use crate::error::Error;
use crate::models::admin::AdminRoster;
use crate::models::chat::ChatProfile;

#[async_trait]
pub trait ChatProfileRepository: Send + Sync {
    async fn get_all_chat_profiles(&self) -> Result<Vec<ChatProfile>, Error>;
    async fn get_chat_profile(&self, chat_id: i64) -> Result<Option<ChatProfile>, Error>;
    async fn create_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error>;
    /// Full-row overwrite; last writer wins.
    async fn update_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error>;
}

#[async_trait]
pub trait AdminRosterRepository: Send + Sync {
    async fn get_admin_roster(&self) -> Result<AdminRoster, Error>;

    /// Adds `user_id` to the roster. Adding an existing admin is a no-op.
    async fn add_admin(&self, user_id: i64) -> Result<(), Error>;

    /// First-boot seeding: creates the roster with `default_admin` if no
    /// roster row exists yet, otherwise leaves it untouched.
    async fn ensure_admin_roster(&self, default_admin: i64) -> Result<(), Error>;
}
