// File: nafanya-common/src/models/admin.rs

use serde::{Deserialize, Serialize};

/// Global list of users allowed to run bot-wide administrative commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRoster {
    pub admins: Vec<i64>,
}

impl AdminRoster {
    pub fn new(admins: Vec<i64>) -> Self {
        Self { admins }
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }
}
