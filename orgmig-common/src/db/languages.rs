//! Organization language persistence

use sqlx::SqlitePool;

use crate::{Error, Result};

/// Destination language
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Language {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    pub iso_code: String,
    pub is_active: bool,
}

const LANGUAGE_COLUMNS: &str = "id, org_id, name, iso_code, is_active";

pub async fn create_language(
    pool: &SqlitePool,
    org_id: i64,
    name: &str,
    iso_code: &str,
    created_by: &str,
) -> Result<Language> {
    let id = sqlx::query(
        "INSERT INTO languages (org_id, name, iso_code, created_by) VALUES (?, ?, ?, ?)",
    )
    .bind(org_id)
    .bind(name)
    .bind(iso_code)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_language(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Language {} vanished after insert", id)))
}

/// Physically delete the org's active languages
///
/// Callers clear `orgs.primary_language_id` first; the foreign key would
/// null it anyway.
pub async fn delete_active(pool: &SqlitePool, org_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM languages WHERE org_id = ? AND is_active = 1")
        .bind(org_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_language(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<Language>> {
    let language = sqlx::query_as::<_, Language>(&format!(
        "SELECT {} FROM languages WHERE id = ? AND org_id = ?",
        LANGUAGE_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(language)
}

pub async fn list_languages(pool: &SqlitePool, org_id: i64) -> Result<Vec<Language>> {
    let languages = sqlx::query_as::<_, Language>(&format!(
        "SELECT {} FROM languages WHERE org_id = ? ORDER BY id",
        LANGUAGE_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(languages)
}
