// File: nafanya-core/src/test_utils/helpers.rs

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use crate::db::Database;
use crate::Error;

/// Connects to `TEST_DATABASE_URL`, falling back to a local `nafanya_test` database.
pub async fn create_test_db_pool() -> Result<Pool<Postgres>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/nafanya_test".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;

    Ok(pool)
}

/// Wipes all bot tables so each test starts fresh.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(r#"
        TRUNCATE TABLE
            chats,
            bot_config
        RESTART IDENTITY CASCADE;
    "#)
        .execute(pool)
        .await?;

    Ok(())
}

/// Migrated and emptied test database.
pub async fn setup_test_database() -> Result<Database, Error> {
    let pool = create_test_db_pool().await?;
    let db = Database::from_pool(pool);
    db.migrate().await?;
    clean_database(db.pool()).await?;
    Ok(db)
}
