//! Contact persistence

use sqlx::SqlitePool;

use crate::{Error, Result};

/// Destination contact
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub org_id: i64,
    pub uuid: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub is_stopped: bool,
}

/// Fields for a new contact; `uuid` is kept as given
#[derive(Debug, Clone)]
pub struct NewContact {
    pub uuid: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub is_stopped: bool,
}

const CONTACT_COLUMNS: &str = "id, org_id, uuid, name, language, is_active, is_blocked, is_stopped";

pub async fn get_by_uuid(pool: &SqlitePool, org_id: i64, uuid: &str) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE org_id = ? AND uuid = ?",
        CONTACT_COLUMNS
    ))
    .bind(org_id)
    .bind(uuid)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

pub async fn create_contact(
    pool: &SqlitePool,
    org_id: i64,
    contact: &NewContact,
    created_by: &str,
) -> Result<Contact> {
    let id = sqlx::query(
        r#"
        INSERT INTO contacts (org_id, uuid, name, language, is_active, is_blocked, is_stopped, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(org_id)
    .bind(&contact.uuid)
    .bind(&contact.name)
    .bind(&contact.language)
    .bind(contact.is_active)
    .bind(contact.is_blocked)
    .bind(contact.is_stopped)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_contact(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Contact {} vanished after insert", id)))
}

/// Existing contact with `contact.uuid`, untouched, or a newly created one
pub async fn get_or_create(
    pool: &SqlitePool,
    org_id: i64,
    contact: &NewContact,
    created_by: &str,
) -> Result<(Contact, bool)> {
    if let Some(existing) = get_by_uuid(pool, org_id, &contact.uuid).await? {
        return Ok((existing, false));
    }

    let created = create_contact(pool, org_id, contact, created_by).await?;
    Ok((created, true))
}

pub async fn get_contact(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE id = ? AND org_id = ?",
        CONTACT_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

pub async fn count_contacts(pool: &SqlitePool, org_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE org_id = ?")
        .bind(org_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
