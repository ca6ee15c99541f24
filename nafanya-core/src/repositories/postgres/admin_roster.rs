use sqlx::{Pool, Postgres, Row};
use async_trait::async_trait;
pub(crate) use nafanya_common::traits::repository_traits::AdminRosterRepository;
use nafanya_common::models::AdminRoster;
use tracing::info;
use crate::Error;

/// The roster is the single `bot_config` row.
#[derive(Clone)]
pub struct PostgresAdminRosterRepository {
    pool: Pool<Postgres>,
}

impl PostgresAdminRosterRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRosterRepository for PostgresAdminRosterRepository {
    async fn get_admin_roster(&self) -> Result<AdminRoster, Error> {
        let row = sqlx::query(
            r#"
            SELECT admins
            FROM bot_config
            ORDER BY bot_config_id
            LIMIT 1
            "#,
        )
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let admins: Vec<i64> = r.try_get("admins")?;
                Ok(AdminRoster::new(admins))
            }
            None => Err(Error::NotFound("bot_config row".to_string())),
        }
    }

    async fn add_admin(&self, user_id: i64) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE bot_config
            SET admins = array_append(admins, $1::BIGINT)
            WHERE bot_config_id = (SELECT MIN(bot_config_id) FROM bot_config)
              AND NOT ($1 = ANY(admins))
            "#,
        )
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Either already an admin or there is no roster row at all.
            self.get_admin_roster().await?;
        }
        Ok(())
    }

    async fn ensure_admin_roster(&self, default_admin: i64) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO bot_config (admins)
            SELECT ARRAY[$1::BIGINT]
            WHERE NOT EXISTS (SELECT 1 FROM bot_config)
            "#,
        )
            .bind(default_admin)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Seeded admin roster with default admin {}", default_admin);
        }
        Ok(())
    }
}
