//! Database initialization
//!
//! Opens (or creates) the destination database and makes sure every
//! destination table exists. All statements are idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the destination database at `db_path`, creating it if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the destination schema
///
/// One connection only: every connection to `sqlite::memory:` gets its own
/// private database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every destination table
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_orgs_table(pool).await?;
    create_topups_tables(pool).await?;
    create_languages_table(pool).await?;
    create_channels_tables(pool).await?;
    create_contact_fields_table(pool).await?;
    create_contacts_table(pool).await?;
    create_contact_groups_tables(pool).await?;

    Ok(())
}

async fn create_orgs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orgs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            plan TEXT NOT NULL DEFAULT '',
            plan_start TEXT,
            stripe_customer TEXT,
            language TEXT,
            timezone TEXT NOT NULL DEFAULT 'UTC',
            date_format TEXT NOT NULL DEFAULT 'D',
            config TEXT NOT NULL DEFAULT '{}',
            is_anon INTEGER NOT NULL DEFAULT 0,
            surveyor_password TEXT,
            parent_id INTEGER,
            primary_language_id INTEGER REFERENCES languages(id) ON DELETE SET NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            modified_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_topups_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            price INTEGER,
            credits INTEGER NOT NULL,
            expires_on TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topup_credits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topup_id INTEGER NOT NULL REFERENCES topups(id),
            used INTEGER NOT NULL,
            is_squashed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_topups_org_active ON topups(org_id, is_active)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_languages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS languages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            name TEXT NOT NULL,
            iso_code TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_channels_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            uuid TEXT NOT NULL UNIQUE,
            channel_type TEXT NOT NULL,
            name TEXT,
            address TEXT,
            country TEXT,
            config TEXT NOT NULL DEFAULT '{}',
            role TEXT NOT NULL DEFAULT 'SR',
            schemes TEXT NOT NULL DEFAULT '[]',
            claim_code TEXT,
            secret TEXT,
            last_seen TEXT,
            device TEXT,
            os TEXT,
            alert_email TEXT,
            bod TEXT,
            tps INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channel_counts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id INTEGER NOT NULL REFERENCES channels(id),
            count_type TEXT NOT NULL,
            day TEXT,
            count INTEGER NOT NULL,
            is_squashed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id INTEGER NOT NULL REFERENCES channels(id),
            power_source TEXT NOT NULL,
            power_status TEXT NOT NULL,
            power_level INTEGER NOT NULL,
            network_type TEXT NOT NULL,
            lifetime INTEGER,
            pending_message_count INTEGER NOT NULL DEFAULT 0,
            retry_message_count INTEGER NOT NULL DEFAULT 0,
            incoming_command_count INTEGER NOT NULL DEFAULT 0,
            outgoing_command_count INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contact_fields_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_fields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            uuid TEXT NOT NULL,
            key TEXT NOT NULL,
            label TEXT NOT NULL,
            value_type TEXT NOT NULL DEFAULT 'T',
            show_in_table INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(org_id, key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            uuid TEXT NOT NULL,
            name TEXT,
            language TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_blocked INTEGER NOT NULL DEFAULT 0,
            is_stopped INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(org_id, uuid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contact_groups_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            uuid TEXT NOT NULL,
            name TEXT NOT NULL,
            query TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_group_members (
            group_id INTEGER NOT NULL REFERENCES contact_groups(id),
            contact_id INTEGER NOT NULL REFERENCES contacts(id),
            added_by TEXT NOT NULL,
            added_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (group_id, contact_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "channel_counts",
            "channels",
            "contact_fields",
            "contact_group_members",
            "contact_groups",
            "contacts",
            "languages",
            "orgs",
            "sync_events",
            "topup_credits",
            "topups",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("orgmig.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());
        pool.close().await;
    }
}
