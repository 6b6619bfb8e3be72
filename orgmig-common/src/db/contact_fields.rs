//! Contact field definitions

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{Error, Result};

/// Destination contact field
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ContactField {
    pub id: i64,
    pub org_id: i64,
    pub uuid: String,
    pub key: String,
    pub label: String,
    pub value_type: String,
    pub show_in_table: bool,
    pub is_active: bool,
}

/// Definition used by `get_or_create`
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    pub value_type: String,
    pub show_in_table: bool,
}

const FIELD_COLUMNS: &str = "id, org_id, uuid, key, label, value_type, show_in_table, is_active";

pub async fn get_by_key(pool: &SqlitePool, org_id: i64, key: &str) -> Result<Option<ContactField>> {
    let field = sqlx::query_as::<_, ContactField>(&format!(
        "SELECT {} FROM contact_fields WHERE org_id = ? AND key = ?",
        FIELD_COLUMNS
    ))
    .bind(org_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(field)
}

/// Get the field with `definition.key` or create it.
///
/// An existing field takes the definition's label, value type and
/// visibility and is reactivated; its id and uuid are kept. Returns the
/// field and whether it was created.
pub async fn get_or_create(
    pool: &SqlitePool,
    org_id: i64,
    definition: &FieldDefinition,
    created_by: &str,
) -> Result<(ContactField, bool)> {
    if let Some(existing) = get_by_key(pool, org_id, &definition.key).await? {
        sqlx::query(
            "UPDATE contact_fields SET label = ?, value_type = ?, show_in_table = ?, is_active = 1 WHERE id = ?",
        )
        .bind(&definition.label)
        .bind(&definition.value_type)
        .bind(definition.show_in_table)
        .bind(existing.id)
        .execute(pool)
        .await?;

        let field = get_field(pool, existing.id, org_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("ContactField {} vanished", existing.id)))?;
        return Ok((field, false));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO contact_fields (org_id, uuid, key, label, value_type, show_in_table, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(org_id)
    .bind(Uuid::new_v4().to_string())
    .bind(&definition.key)
    .bind(&definition.label)
    .bind(&definition.value_type)
    .bind(definition.show_in_table)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let field = get_field(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("ContactField {} vanished after insert", id)))?;
    Ok((field, true))
}

/// Overwrite the stable identifier of an existing field
pub async fn set_uuid(pool: &SqlitePool, field_id: i64, uuid: &str) -> Result<()> {
    sqlx::query("UPDATE contact_fields SET uuid = ? WHERE id = ?")
        .bind(uuid)
        .bind(field_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_field(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<ContactField>> {
    let field = sqlx::query_as::<_, ContactField>(&format!(
        "SELECT {} FROM contact_fields WHERE id = ? AND org_id = ?",
        FIELD_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(field)
}

pub async fn list_fields(pool: &SqlitePool, org_id: i64) -> Result<Vec<ContactField>> {
    let fields = sqlx::query_as::<_, ContactField>(&format!(
        "SELECT {} FROM contact_fields WHERE org_id = ? ORDER BY id",
        FIELD_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(fields)
}
