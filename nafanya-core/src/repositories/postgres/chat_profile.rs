use sqlx::{Pool, Postgres, Row};
use sqlx::postgres::PgRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub(crate) use nafanya_common::traits::repository_traits::ChatProfileRepository;
use nafanya_common::models::{ChatKind, ChatProfile};
use crate::Error;

#[derive(Clone)]
pub struct PostgresChatProfileRepository {
    pool: Pool<Postgres>,
}

impl PostgresChatProfileRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: &PgRow) -> Result<ChatProfile, Error> {
        let chat_type: String = row.try_get("chat_type")?;
        Ok(ChatProfile {
            chat_id: row.try_get("chat_id")?,
            chat_type: chat_type.parse::<ChatKind>()?,
            chat_name: row.try_get("chat_name")?,
            question_prompt: row.try_get("question_prompt")?,
            random_prompt: row.try_get("random_prompt")?,
            agro_level: row.try_get("agro_level")?,
            agro_cooldown: row.try_get("agro_cooldown")?,
            billed_to: row.try_get::<DateTime<Utc>, _>("billed_to")?,
            delete_preview_messages: row.try_get("delete_preview_messages")?,
            model: row.try_get("model")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl ChatProfileRepository for PostgresChatProfileRepository {
    async fn get_all_chat_profiles(&self) -> Result<Vec<ChatProfile>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT chat_id, chat_type, chat_name, question_prompt, random_prompt,
                   agro_level, agro_cooldown, billed_to, delete_preview_messages,
                   model, created_at, updated_at
            FROM chats
            ORDER BY chat_id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_profile).collect()
    }

    async fn get_chat_profile(&self, chat_id: i64) -> Result<Option<ChatProfile>, Error> {
        let row = sqlx::query(
            r#"
            SELECT chat_id, chat_type, chat_name, question_prompt, random_prompt,
                   agro_level, agro_cooldown, billed_to, delete_preview_messages,
                   model, created_at, updated_at
            FROM chats
            WHERE chat_id = $1
            "#,
        )
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_profile(&r)?)),
            None => Ok(None),
        }
    }

    async fn create_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO chats (
                chat_id, chat_type, chat_name, question_prompt, random_prompt,
                agro_level, agro_cooldown, billed_to, delete_preview_messages,
                model, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (chat_id) DO NOTHING
            "#,
        )
            .bind(profile.chat_id)
            .bind(profile.chat_type.to_string())
            .bind(&profile.chat_name)
            .bind(&profile.question_prompt)
            .bind(&profile.random_prompt)
            .bind(profile.agro_level)
            .bind(profile.agro_cooldown)
            .bind(profile.billed_to)
            .bind(profile.delete_preview_messages)
            .bind(&profile.model)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_chat_profile(&self, profile: &ChatProfile) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE chats
            SET chat_type = $2,
                chat_name = $3,
                question_prompt = $4,
                random_prompt = $5,
                agro_level = $6,
                agro_cooldown = $7,
                billed_to = $8,
                delete_preview_messages = $9,
                model = $10,
                updated_at = $11
            WHERE chat_id = $1
            "#,
        )
            .bind(profile.chat_id)
            .bind(profile.chat_type.to_string())
            .bind(&profile.chat_name)
            .bind(&profile.question_prompt)
            .bind(&profile.random_prompt)
            .bind(profile.agro_level)
            .bind(profile.agro_cooldown)
            .bind(profile.billed_to)
            .bind(profile.delete_preview_messages)
            .bind(&profile.model)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("chat {}", profile.chat_id)));
        }
        Ok(())
    }
}
