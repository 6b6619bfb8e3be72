//! Records returned by the source system
//!
//! Field names follow the source system's JSON export. Child records carry
//! the id of their parent so a flat export can be filtered per request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOrg {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub plan: String,
    pub plan_start: Option<DateTime<Utc>>,
    pub stripe_customer: Option<String>,
    pub language: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Free-form configuration, JSON encoded
    pub config: Option<String>,
    #[serde(default)]
    pub is_anon: bool,
    pub surveyor_password: Option<String>,
    pub parent_id: Option<i64>,
    pub primary_language_id: Option<i64>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_date_format() -> String {
    "D".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTopUp {
    pub id: i64,
    pub price: Option<i64>,
    pub credits: i64,
    pub expires_on: DateTime<Utc>,
}

/// Usage entry of one top-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTopUpCredit {
    pub topup_id: i64,
    pub used: i64,
    #[serde(default)]
    pub is_squashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLanguage {
    pub id: i64,
    pub name: String,
    pub iso_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChannel {
    pub id: i64,
    pub uuid: String,
    pub channel_type: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    /// Channel configuration, JSON encoded
    pub config: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    pub claim_code: Option<String>,
    pub secret: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub device: Option<String>,
    pub os: Option<String>,
    pub alert_email: Option<String>,
    pub bod: Option<String>,
}

fn default_role() -> String {
    "SR".to_string()
}

/// Per-day message counter of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChannelCount {
    pub channel_id: i64,
    pub count_type: String,
    pub day: Option<NaiveDate>,
    pub count: i64,
    #[serde(default)]
    pub is_squashed: bool,
}

/// Device sync report of an Android channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSyncEvent {
    pub channel_id: i64,
    pub power_source: String,
    pub power_status: String,
    pub power_level: i64,
    pub network_type: String,
    pub lifetime: Option<i64>,
    #[serde(default)]
    pub pending_message_count: i64,
    #[serde(default)]
    pub retry_message_count: i64,
    #[serde(default)]
    pub incoming_command_count: i64,
    #[serde(default)]
    pub outgoing_command_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContactField {
    pub id: i64,
    pub uuid: String,
    pub key: String,
    pub label: String,
    #[serde(default = "default_value_type")]
    pub value_type: String,
    #[serde(default)]
    pub show_in_table: bool,
}

fn default_value_type() -> String {
    "T".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContact {
    pub id: i64,
    pub uuid: String,
    pub name: Option<String>,
    pub language: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_stopped: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContactGroup {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    /// Membership query; non-blank for dynamic groups
    pub query: Option<String>,
}

impl SourceContactGroup {
    pub fn is_dynamic(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
    }
}

/// One historical member of a static group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGroupMember {
    pub contact_group_id: i64,
    pub contact_id: i64,
}
