//! Entity kinds the association store knows about
//!
//! The labels are the source system's table names and are stored verbatim
//! in `migration_associations.entity_kind`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MigrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "campaigns_campaign")]
    Campaign,
    #[serde(rename = "campaigns_campaignevent")]
    CampaignEvent,
    #[serde(rename = "channels_channel")]
    Channel,
    #[serde(rename = "contacts_contact")]
    Contact,
    #[serde(rename = "contacts_contacturn")]
    ContactUrn,
    #[serde(rename = "contacts_contactgroup")]
    ContactGroup,
    #[serde(rename = "contacts_contactfield")]
    ContactField,
    #[serde(rename = "msgs_msg")]
    Msg,
    #[serde(rename = "msgs_label")]
    MsgLabel,
    #[serde(rename = "flows_flow")]
    Flow,
    #[serde(rename = "flows_flowlabel")]
    FlowLabel,
    #[serde(rename = "flows_flowrun")]
    FlowRun,
    #[serde(rename = "flows_flowstart")]
    FlowStart,
    #[serde(rename = "links_link")]
    Link,
    #[serde(rename = "schedules_schedule")]
    Schedule,
    #[serde(rename = "orgs_topups")]
    OrgTopUp,
    #[serde(rename = "orgs_language")]
    OrgLanguage,
    #[serde(rename = "triggers_trigger")]
    Trigger,
}

impl EntityKind {
    pub const ALL: [EntityKind; 18] = [
        EntityKind::Campaign,
        EntityKind::CampaignEvent,
        EntityKind::Channel,
        EntityKind::Contact,
        EntityKind::ContactUrn,
        EntityKind::ContactGroup,
        EntityKind::ContactField,
        EntityKind::Msg,
        EntityKind::MsgLabel,
        EntityKind::Flow,
        EntityKind::FlowLabel,
        EntityKind::FlowRun,
        EntityKind::FlowStart,
        EntityKind::Link,
        EntityKind::Schedule,
        EntityKind::OrgTopUp,
        EntityKind::OrgLanguage,
        EntityKind::Trigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "campaigns_campaign",
            EntityKind::CampaignEvent => "campaigns_campaignevent",
            EntityKind::Channel => "channels_channel",
            EntityKind::Contact => "contacts_contact",
            EntityKind::ContactUrn => "contacts_contacturn",
            EntityKind::ContactGroup => "contacts_contactgroup",
            EntityKind::ContactField => "contacts_contactfield",
            EntityKind::Msg => "msgs_msg",
            EntityKind::MsgLabel => "msgs_label",
            EntityKind::Flow => "flows_flow",
            EntityKind::FlowLabel => "flows_flowlabel",
            EntityKind::FlowRun => "flows_flowrun",
            EntityKind::FlowStart => "flows_flowstart",
            EntityKind::Link => "links_link",
            EntityKind::Schedule => "schedules_schedule",
            EntityKind::OrgTopUp => "orgs_topups",
            EntityKind::OrgLanguage => "orgs_language",
            EntityKind::Trigger => "triggers_trigger",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MigrationError::InvalidRequest(format!("Unknown entity kind: {}", s)))
    }
}
