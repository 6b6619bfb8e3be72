//! Contact groups and static group membership

use sqlx::SqlitePool;

use crate::{Error, Result};

/// Destination contact group
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ContactGroup {
    pub id: i64,
    pub org_id: i64,
    pub uuid: String,
    pub name: String,
    pub query: Option<String>,
    pub is_active: bool,
}

impl ContactGroup {
    /// Dynamic groups compute membership from `query`; they are never populated by hand
    pub fn is_dynamic(&self) -> bool {
        self.query.as_deref().map_or(false, |q| !q.trim().is_empty())
    }
}

const GROUP_COLUMNS: &str = "id, org_id, uuid, name, query, is_active";

pub async fn get_by_uuid(pool: &SqlitePool, org_id: i64, uuid: &str) -> Result<Option<ContactGroup>> {
    let group = sqlx::query_as::<_, ContactGroup>(&format!(
        "SELECT {} FROM contact_groups WHERE org_id = ? AND uuid = ? AND is_active = 1",
        GROUP_COLUMNS
    ))
    .bind(org_id)
    .bind(uuid)
    .fetch_optional(pool)
    .await?;

    Ok(group)
}

pub async fn get_by_name(pool: &SqlitePool, org_id: i64, name: &str) -> Result<Option<ContactGroup>> {
    let group = sqlx::query_as::<_, ContactGroup>(&format!(
        "SELECT {} FROM contact_groups WHERE org_id = ? AND lower(name) = lower(?) AND is_active = 1 ORDER BY id LIMIT 1",
        GROUP_COLUMNS
    ))
    .bind(org_id)
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(group)
}

/// Find an active group by uuid, then by name (case-insensitive), else create it.
///
/// A group found by name keeps its own uuid; callers that need the source
/// uuid overwrite it with `set_uuid`. Returns the group and whether it was
/// created.
pub async fn get_or_create(
    pool: &SqlitePool,
    org_id: i64,
    uuid: &str,
    name: &str,
    query: Option<&str>,
    created_by: &str,
) -> Result<(ContactGroup, bool)> {
    if let Some(group) = get_by_uuid(pool, org_id, uuid).await? {
        return Ok((group, false));
    }

    if let Some(group) = get_by_name(pool, org_id, name).await? {
        return Ok((group, false));
    }

    let id = sqlx::query(
        "INSERT INTO contact_groups (org_id, uuid, name, query, created_by) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(org_id)
    .bind(uuid)
    .bind(name.trim())
    .bind(query)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let group = get_group(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("ContactGroup {} vanished after insert", id)))?;
    Ok((group, true))
}

pub async fn set_uuid(pool: &SqlitePool, group_id: i64, uuid: &str) -> Result<()> {
    sqlx::query("UPDATE contact_groups SET uuid = ? WHERE id = ?")
        .bind(uuid)
        .bind(group_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_group(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<ContactGroup>> {
    let group = sqlx::query_as::<_, ContactGroup>(&format!(
        "SELECT {} FROM contact_groups WHERE id = ? AND org_id = ?",
        GROUP_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(group)
}

pub async fn list_groups(pool: &SqlitePool, org_id: i64) -> Result<Vec<ContactGroup>> {
    let groups = sqlx::query_as::<_, ContactGroup>(&format!(
        "SELECT {} FROM contact_groups WHERE org_id = ? ORDER BY id",
        GROUP_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(groups)
}

/// Add contacts to a static group; already-present members are ignored
pub async fn add_contacts(
    pool: &SqlitePool,
    group_id: i64,
    contact_ids: &[i64],
    added_by: &str,
) -> Result<u64> {
    let mut added = 0;
    for contact_id in contact_ids {
        added += sqlx::query(
            "INSERT OR IGNORE INTO contact_group_members (group_id, contact_id, added_by) VALUES (?, ?, ?)",
        )
        .bind(group_id)
        .bind(contact_id)
        .bind(added_by)
        .execute(pool)
        .await?
        .rows_affected();
    }

    Ok(added)
}

pub async fn list_member_ids(pool: &SqlitePool, group_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT contact_id FROM contact_group_members WHERE group_id = ? ORDER BY contact_id",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
