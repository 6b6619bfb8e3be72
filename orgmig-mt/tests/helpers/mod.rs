//! Shared fixtures for orgmig-mt integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use orgmig_common::db::orgs::{self, Org};
use orgmig_common::events::EventBus;

use orgmig_mt::models::MigrationTask;
use orgmig_mt::services::{MigrationOrchestrator, MigrationSettings};
use orgmig_mt::source::*;

pub const SOURCE_ORG_ID: i64 = 40;

/// In-memory database with one destination org
pub async fn setup() -> (SqlitePool, Org) {
    let db = orgmig_mt::db::open_memory_database().await.unwrap();
    let org = orgs::create_org(&db, "Destination").await.unwrap();
    (db, org)
}

pub fn orchestrator(db: &SqlitePool, source: impl SourceClient + 'static) -> MigrationOrchestrator {
    MigrationOrchestrator::new(
        db.clone(),
        Arc::new(source),
        EventBus::new(100),
        MigrationSettings::default(),
    )
}

/// Pending task for `org`, persisted
pub async fn pending_task(db: &SqlitePool, org: &Org) -> MigrationTask {
    let task = MigrationTask::new(org.id, SOURCE_ORG_ID, "migrator");
    orgmig_mt::db::tasks::save_task(db, &task).await.unwrap();
    task
}

pub fn source_org() -> SourceOrg {
    SourceOrg {
        id: SOURCE_ORG_ID,
        name: "Nyaruka".to_string(),
        plan: "topups".to_string(),
        plan_start: None,
        stripe_customer: None,
        language: Some("eng".to_string()),
        timezone: "Africa/Kigali".to_string(),
        date_format: "D".to_string(),
        config: Some(r#"{"SMTP_FROM_EMAIL": "support@nyaruka.com"}"#.to_string()),
        is_anon: false,
        surveyor_password: Some("survey".to_string()),
        parent_id: None,
        primary_language_id: None,
    }
}

/// Snapshot holding only the organization
pub fn org_snapshot() -> SourceSnapshot {
    SourceSnapshot {
        organization: Some(source_org()),
        ..Default::default()
    }
}

pub fn topup(id: i64, credits: i64) -> SourceTopUp {
    SourceTopUp {
        id,
        price: Some(credits * 10),
        credits,
        expires_on: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn language(id: i64, name: &str, iso_code: &str) -> SourceLanguage {
    SourceLanguage {
        id,
        name: name.to_string(),
        iso_code: iso_code.to_string(),
    }
}

pub fn channel(id: i64, channel_type: &str) -> SourceChannel {
    SourceChannel {
        id,
        uuid: format!("00000000-0000-4000-8000-{:012}", id),
        channel_type: channel_type.to_string(),
        name: Some(format!("Channel {}", id)),
        address: Some(format!("+25078800{:04}", id)),
        country: Some("RW".to_string()),
        config: None,
        role: "SR".to_string(),
        claim_code: None,
        secret: Some(format!("secret-{}", id)),
        last_seen: None,
        device: None,
        os: None,
        alert_email: None,
        bod: None,
    }
}

pub fn channel_count(channel_id: i64, count_type: &str, day: u32, count: i64) -> SourceChannelCount {
    SourceChannelCount {
        channel_id,
        count_type: count_type.to_string(),
        day: NaiveDate::from_ymd_opt(2020, 5, day),
        count,
        is_squashed: false,
    }
}

pub fn sync_event(channel_id: i64, power_level: i64) -> SourceSyncEvent {
    SourceSyncEvent {
        channel_id,
        power_source: "AC".to_string(),
        power_status: "CHA".to_string(),
        power_level,
        network_type: "WIFI".to_string(),
        lifetime: Some(30),
        pending_message_count: 0,
        retry_message_count: 0,
        incoming_command_count: 1,
        outgoing_command_count: 1,
    }
}

pub fn contact_field(id: i64, key: &str) -> SourceContactField {
    SourceContactField {
        id,
        uuid: format!("f0000000-0000-4000-8000-{:012}", id),
        key: key.to_string(),
        label: key.to_uppercase(),
        value_type: "T".to_string(),
        show_in_table: false,
    }
}

pub fn contact(id: i64, name: &str) -> SourceContact {
    SourceContact {
        id,
        uuid: format!("c0000000-0000-4000-8000-{:012}", id),
        name: Some(name.to_string()),
        language: Some("eng".to_string()),
        is_active: true,
        is_blocked: false,
        is_stopped: false,
    }
}

pub fn group(id: i64, name: &str, query: Option<&str>) -> SourceContactGroup {
    SourceContactGroup {
        id,
        uuid: format!("90000000-0000-4000-8000-{:012}", id),
        name: name.to_string(),
        query: query.map(str::to_string),
    }
}

pub fn member(group_id: i64, contact_id: i64) -> SourceGroupMember {
    SourceGroupMember {
        contact_group_id: group_id,
        contact_id,
    }
}

/// Snapshot source that fails every channel fetch
pub struct ChannelOutageSource {
    inner: SnapshotSource,
}

impl ChannelOutageSource {
    pub fn new(snapshot: SourceSnapshot) -> Self {
        Self {
            inner: SnapshotSource::new(snapshot),
        }
    }
}

#[async_trait]
impl SourceClient for ChannelOutageSource {
    async fn fetch_organization(&self, org_id: i64) -> SourceResult<Option<SourceOrg>> {
        self.inner.fetch_organization(org_id).await
    }

    async fn fetch_topups(&self, org_id: i64) -> SourceResult<Vec<SourceTopUp>> {
        self.inner.fetch_topups(org_id).await
    }

    async fn fetch_topup_usage(&self, topup_id: i64) -> SourceResult<Vec<SourceTopUpCredit>> {
        self.inner.fetch_topup_usage(topup_id).await
    }

    async fn fetch_languages(&self, org_id: i64) -> SourceResult<Vec<SourceLanguage>> {
        self.inner.fetch_languages(org_id).await
    }

    async fn fetch_channels(&self, _org_id: i64) -> SourceResult<Vec<SourceChannel>> {
        Err(SourceError::Api(503, "channels unavailable".to_string()))
    }

    async fn fetch_channel_counts(&self, channel_id: i64) -> SourceResult<Vec<SourceChannelCount>> {
        self.inner.fetch_channel_counts(channel_id).await
    }

    async fn fetch_channel_sync_history(&self, channel_id: i64) -> SourceResult<Vec<SourceSyncEvent>> {
        self.inner.fetch_channel_sync_history(channel_id).await
    }

    async fn fetch_contact_fields(&self, org_id: i64) -> SourceResult<Vec<SourceContactField>> {
        self.inner.fetch_contact_fields(org_id).await
    }

    async fn fetch_contacts(&self, org_id: i64) -> SourceResult<Vec<SourceContact>> {
        self.inner.fetch_contacts(org_id).await
    }

    async fn fetch_contact_groups(&self, org_id: i64) -> SourceResult<Vec<SourceContactGroup>> {
        self.inner.fetch_contact_groups(org_id).await
    }

    async fn fetch_group_members(&self, group_id: i64) -> SourceResult<Vec<SourceGroupMember>> {
        self.inner.fetch_group_members(group_id).await
    }
}
