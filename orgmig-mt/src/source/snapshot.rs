//! Source client backed by a JSON export of one organization

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::records::*;
use super::{SourceClient, SourceError, SourceResult};

/// Flat export of one source organization.
///
/// Org-level collections belong to `organization`; nested records point at
/// their parent through `topup_id`, `channel_id` or `contact_group_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSnapshot {
    pub organization: Option<SourceOrg>,
    pub topups: Vec<SourceTopUp>,
    pub topup_credits: Vec<SourceTopUpCredit>,
    pub languages: Vec<SourceLanguage>,
    pub channels: Vec<SourceChannel>,
    pub channel_counts: Vec<SourceChannelCount>,
    pub sync_events: Vec<SourceSyncEvent>,
    pub contact_fields: Vec<SourceContactField>,
    pub contacts: Vec<SourceContact>,
    pub contact_groups: Vec<SourceContactGroup>,
    pub group_members: Vec<SourceGroupMember>,
}

pub struct SnapshotSource {
    snapshot: SourceSnapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: SourceSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(json: &str) -> SourceResult<Self> {
        let snapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid snapshot: {}", e)))?;
        Ok(Self::new(snapshot))
    }

    pub fn from_file(path: &Path) -> SourceResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn snapshot(&self) -> &SourceSnapshot {
        &self.snapshot
    }

    fn owns(&self, org_id: i64) -> bool {
        self.snapshot
            .organization
            .as_ref()
            .is_some_and(|org| org.id == org_id)
    }

    fn org_records<T: Clone>(&self, org_id: i64, records: &[T]) -> Vec<T> {
        if self.owns(org_id) {
            records.to_vec()
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl SourceClient for SnapshotSource {
    async fn fetch_organization(&self, org_id: i64) -> SourceResult<Option<SourceOrg>> {
        Ok(self.snapshot.organization.clone().filter(|org| org.id == org_id))
    }

    async fn fetch_topups(&self, org_id: i64) -> SourceResult<Vec<SourceTopUp>> {
        Ok(self.org_records(org_id, &self.snapshot.topups))
    }

    async fn fetch_topup_usage(&self, topup_id: i64) -> SourceResult<Vec<SourceTopUpCredit>> {
        Ok(self
            .snapshot
            .topup_credits
            .iter()
            .filter(|credit| credit.topup_id == topup_id)
            .cloned()
            .collect())
    }

    async fn fetch_languages(&self, org_id: i64) -> SourceResult<Vec<SourceLanguage>> {
        Ok(self.org_records(org_id, &self.snapshot.languages))
    }

    async fn fetch_channels(&self, org_id: i64) -> SourceResult<Vec<SourceChannel>> {
        Ok(self.org_records(org_id, &self.snapshot.channels))
    }

    async fn fetch_channel_counts(&self, channel_id: i64) -> SourceResult<Vec<SourceChannelCount>> {
        Ok(self
            .snapshot
            .channel_counts
            .iter()
            .filter(|count| count.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn fetch_channel_sync_history(&self, channel_id: i64) -> SourceResult<Vec<SourceSyncEvent>> {
        Ok(self
            .snapshot
            .sync_events
            .iter()
            .filter(|event| event.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn fetch_contact_fields(&self, org_id: i64) -> SourceResult<Vec<SourceContactField>> {
        Ok(self.org_records(org_id, &self.snapshot.contact_fields))
    }

    async fn fetch_contacts(&self, org_id: i64) -> SourceResult<Vec<SourceContact>> {
        Ok(self.org_records(org_id, &self.snapshot.contacts))
    }

    async fn fetch_contact_groups(&self, org_id: i64) -> SourceResult<Vec<SourceContactGroup>> {
        Ok(self.org_records(org_id, &self.snapshot.contact_groups))
    }

    async fn fetch_group_members(&self, group_id: i64) -> SourceResult<Vec<SourceGroupMember>> {
        Ok(self
            .snapshot
            .group_members
            .iter()
            .filter(|member| member.contact_group_id == group_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "organization": {"id": 12, "name": "Nyaruka", "primary_language_id": 3},
        "topups": [{"id": 1, "price": 1000, "credits": 100, "expires_on": "2030-01-01T00:00:00Z"}],
        "topup_credits": [
            {"topup_id": 1, "used": 20},
            {"topup_id": 2, "used": 5}
        ],
        "group_members": [
            {"contact_group_id": 9, "contact_id": 100},
            {"contact_group_id": 8, "contact_id": 101}
        ]
    }"#;

    #[tokio::test]
    async fn test_org_level_records_only_for_exported_org() {
        let source = SnapshotSource::from_json(EXPORT).unwrap();

        assert!(source.fetch_organization(12).await.unwrap().is_some());
        assert!(source.fetch_organization(13).await.unwrap().is_none());
        assert_eq!(source.fetch_topups(12).await.unwrap().len(), 1);
        assert!(source.fetch_topups(13).await.unwrap().is_empty());
        assert!(source.fetch_languages(12).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_children_filtered_by_parent() {
        let source = SnapshotSource::from_json(EXPORT).unwrap();

        let credits = source.fetch_topup_usage(1).await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].used, 20);

        let members = source.fetch_group_members(9).await.unwrap();
        assert_eq!(members, vec![SourceGroupMember { contact_group_id: 9, contact_id: 100 }]);
    }

    #[test]
    fn test_malformed_export_is_parse_error() {
        let err = SnapshotSource::from_json("{\"topups\": 3}").err().unwrap();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
