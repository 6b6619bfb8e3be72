//! Channel persistence, with per-day counts and device sync history

use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{Error, Result};

/// Destination channel
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Channel {
    pub id: i64,
    pub org_id: i64,
    pub uuid: String,
    pub channel_type: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub config: String,
    pub role: String,
    pub schemes: String,
    pub claim_code: Option<String>,
    pub secret: Option<String>,
    pub last_seen: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub alert_email: Option<String>,
    pub bod: Option<String>,
    pub tps: Option<i64>,
    pub is_active: bool,
}

impl Channel {
    pub fn config_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.config)?)
    }

    pub fn scheme_list(&self) -> Result<Vec<String>> {
        Ok(serde_json::from_str(&self.schemes)?)
    }
}

/// Fields for a new channel
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub uuid: String,
    pub channel_type: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub config: Value,
    pub role: String,
    pub schemes: Vec<String>,
    pub claim_code: Option<String>,
    pub secret: Option<String>,
    pub last_seen: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub alert_email: Option<String>,
    pub bod: Option<String>,
    pub tps: Option<i64>,
}

/// Per-day message counter attached to a channel
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChannelCount {
    pub id: i64,
    pub channel_id: i64,
    pub count_type: String,
    pub day: Option<String>,
    pub count: i64,
    pub is_squashed: bool,
}

/// Fields for a new channel count
#[derive(Debug, Clone)]
pub struct NewChannelCount {
    pub count_type: String,
    pub day: Option<String>,
    pub count: i64,
    pub is_squashed: bool,
}

/// Android relayer sync report
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SyncEvent {
    pub id: i64,
    pub channel_id: i64,
    pub power_source: String,
    pub power_status: String,
    pub power_level: i64,
    pub network_type: String,
    pub lifetime: Option<i64>,
    pub pending_message_count: i64,
    pub retry_message_count: i64,
    pub incoming_command_count: i64,
    pub outgoing_command_count: i64,
}

/// Fields for a new sync event
#[derive(Debug, Clone)]
pub struct NewSyncEvent {
    pub power_source: String,
    pub power_status: String,
    pub power_level: i64,
    pub network_type: String,
    pub lifetime: Option<i64>,
    pub pending_message_count: i64,
    pub retry_message_count: i64,
    pub incoming_command_count: i64,
    pub outgoing_command_count: i64,
}

const CHANNEL_COLUMNS: &str = "id, org_id, uuid, channel_type, name, address, country, config, \
     role, schemes, claim_code, secret, last_seen, device, os, alert_email, bod, tps, is_active";

pub async fn create_channel(
    pool: &SqlitePool,
    org_id: i64,
    channel: &NewChannel,
    created_by: &str,
) -> Result<Channel> {
    let config = serde_json::to_string(&channel.config)?;
    let schemes = serde_json::to_string(&channel.schemes)?;

    let id = sqlx::query(
        r#"
        INSERT INTO channels (
            org_id, uuid, channel_type, name, address, country, config, role, schemes,
            claim_code, secret, last_seen, device, os, alert_email, bod, tps, created_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(org_id)
    .bind(&channel.uuid)
    .bind(&channel.channel_type)
    .bind(&channel.name)
    .bind(&channel.address)
    .bind(&channel.country)
    .bind(config)
    .bind(&channel.role)
    .bind(schemes)
    .bind(&channel.claim_code)
    .bind(&channel.secret)
    .bind(&channel.last_seen)
    .bind(&channel.device)
    .bind(&channel.os)
    .bind(&channel.alert_email)
    .bind(&channel.bod)
    .bind(channel.tps)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_channel(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Channel {} vanished after insert", id)))
}

pub async fn get_channel(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<Channel>> {
    let channel = sqlx::query_as::<_, Channel>(&format!(
        "SELECT {} FROM channels WHERE id = ? AND org_id = ?",
        CHANNEL_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(channel)
}

/// Every channel of the org, active or not
pub async fn list_channels(pool: &SqlitePool, org_id: i64) -> Result<Vec<Channel>> {
    let channels = sqlx::query_as::<_, Channel>(&format!(
        "SELECT {} FROM channels WHERE org_id = ? ORDER BY id",
        CHANNEL_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(channels)
}

pub async fn list_active_channels(pool: &SqlitePool, org_id: i64) -> Result<Vec<Channel>> {
    let channels = sqlx::query_as::<_, Channel>(&format!(
        "SELECT {} FROM channels WHERE org_id = ? AND is_active = 1 ORDER BY id",
        CHANNEL_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(channels)
}

/// Retire a channel without deleting it: fresh uuid, no secret, inactive.
///
/// The fresh uuid frees the old one so the source channel carrying it can
/// be imported again. Safe to repeat.
pub async fn release(pool: &SqlitePool, channel_id: i64) -> Result<()> {
    sqlx::query("UPDATE channels SET uuid = ?, secret = NULL, is_active = 0 WHERE id = ?")
        .bind(Uuid::new_v4().to_string())
        .bind(channel_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_channel_count(
    pool: &SqlitePool,
    channel_id: i64,
    count: &NewChannelCount,
) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO channel_counts (channel_id, count_type, day, count, is_squashed) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(channel_id)
    .bind(&count.count_type)
    .bind(&count.day)
    .bind(count.count)
    .bind(count.is_squashed)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn list_channel_counts(pool: &SqlitePool, channel_id: i64) -> Result<Vec<ChannelCount>> {
    let counts = sqlx::query_as::<_, ChannelCount>(
        "SELECT id, channel_id, count_type, day, count, is_squashed FROM channel_counts WHERE channel_id = ? ORDER BY id",
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

pub async fn create_sync_event(
    pool: &SqlitePool,
    channel_id: i64,
    event: &NewSyncEvent,
    created_by: &str,
) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO sync_events (
            channel_id, power_source, power_status, power_level, network_type, lifetime,
            pending_message_count, retry_message_count, incoming_command_count,
            outgoing_command_count, created_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(channel_id)
    .bind(&event.power_source)
    .bind(&event.power_status)
    .bind(event.power_level)
    .bind(&event.network_type)
    .bind(event.lifetime)
    .bind(event.pending_message_count)
    .bind(event.retry_message_count)
    .bind(event.incoming_command_count)
    .bind(event.outgoing_command_count)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn list_sync_events(pool: &SqlitePool, channel_id: i64) -> Result<Vec<SyncEvent>> {
    let events = sqlx::query_as::<_, SyncEvent>(
        r#"
        SELECT id, channel_id, power_source, power_status, power_level, network_type, lifetime,
               pending_message_count, retry_message_count, incoming_command_count,
               outgoing_command_count
        FROM sync_events
        WHERE channel_id = ?
        ORDER BY id
        "#,
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}
