//! Source system access
//!
//! The engine only reads from the source system. Every fetch is keyed by a
//! source-side identifier and may come back empty; only a missing
//! organization is treated as fatal, and that decision belongs to the
//! orchestrator.

mod http;
mod records;
mod snapshot;

pub use http::HttpSourceClient;
pub use records::*;
pub use snapshot::{SnapshotSource, SourceSnapshot};

use async_trait::async_trait;
use thiserror::Error;

/// Source system errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only accessor for one source system
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// `None` when the source has no such organization
    async fn fetch_organization(&self, org_id: i64) -> SourceResult<Option<SourceOrg>>;

    async fn fetch_topups(&self, org_id: i64) -> SourceResult<Vec<SourceTopUp>>;

    async fn fetch_topup_usage(&self, topup_id: i64) -> SourceResult<Vec<SourceTopUpCredit>>;

    async fn fetch_languages(&self, org_id: i64) -> SourceResult<Vec<SourceLanguage>>;

    async fn fetch_channels(&self, org_id: i64) -> SourceResult<Vec<SourceChannel>>;

    async fn fetch_channel_counts(&self, channel_id: i64) -> SourceResult<Vec<SourceChannelCount>>;

    async fn fetch_channel_sync_history(&self, channel_id: i64) -> SourceResult<Vec<SourceSyncEvent>>;

    async fn fetch_contact_fields(&self, org_id: i64) -> SourceResult<Vec<SourceContactField>>;

    async fn fetch_contacts(&self, org_id: i64) -> SourceResult<Vec<SourceContact>>;

    async fn fetch_contact_groups(&self, org_id: i64) -> SourceResult<Vec<SourceContactGroup>>;

    async fn fetch_group_members(&self, group_id: i64) -> SourceResult<Vec<SourceGroupMember>>;
}
