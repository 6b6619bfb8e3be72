//! Channels phase
//!
//! Existing channels are retired (fresh uuid, no secret, inactive) rather
//! than deleted, then every source channel is recreated with its daily
//! counts and, for Android channels, its device sync history.

use serde_json::{json, Value};

use orgmig_common::db::channels::{self, NewChannel, NewChannelCount, NewSyncEvent};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::ProgressLog;
use crate::source::SourceChannel;

/// Retired code for the web socket channel
const LEGACY_WEBCHAT_TYPE: &str = "WS";
const WEBCHAT_TYPE: &str = "WCH";
const FACEBOOK_TYPE: &str = "FB";
const ANDROID_TYPE: &str = "A";

/// Config key holding a channel secret
const CONFIG_SECRET: &str = "secret";

impl MigrationOrchestrator {
    pub(super) async fn phase_channels(
        &self,
        task: &MigrationTask,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let existing = channels::list_channels(&self.db, task.org_id).await?;
        for channel in &existing {
            channels::release(&self.db, channel.id).await?;
        }
        tracing::debug!(task_id = %task.task_id, released = existing.len(), "Released existing channels");

        let source_channels = self.source.fetch_channels(task.source_org_id).await?;

        for source_channel in &source_channels {
            log.record(
                "Channel",
                source_channel.id,
                source_channel.name.as_deref().unwrap_or_default(),
            );

            let new_channel = channel_from_source(source_channel, self.settings.default_tps)?;
            let channel =
                channels::create_channel(&self.db, task.org_id, &new_channel, &task.requested_by)
                    .await?;

            self.associations
                .record(task, EntityKind::Channel, source_channel.id, channel.id)
                .await?;

            for count in self.source.fetch_channel_counts(source_channel.id).await? {
                channels::create_channel_count(
                    &self.db,
                    channel.id,
                    &NewChannelCount {
                        count_type: count.count_type,
                        day: count.day.map(|day| day.to_string()),
                        count: count.count,
                        is_squashed: count.is_squashed,
                    },
                )
                .await?;
            }

            if channel.channel_type == ANDROID_TYPE {
                for event in self.source.fetch_channel_sync_history(source_channel.id).await? {
                    channels::create_sync_event(
                        &self.db,
                        channel.id,
                        &NewSyncEvent {
                            power_source: event.power_source,
                            power_status: event.power_status,
                            power_level: event.power_level,
                            network_type: event.network_type,
                            lifetime: event.lifetime,
                            pending_message_count: event.pending_message_count,
                            retry_message_count: event.retry_message_count,
                            incoming_command_count: event.incoming_command_count,
                            outgoing_command_count: event.outgoing_command_count,
                        },
                        &task.requested_by,
                    )
                    .await?;
                }
            }
        }

        Ok(source_channels.len())
    }
}

/// Current code for a possibly retired channel type code
pub(crate) fn current_channel_type(code: &str) -> &str {
    if code == LEGACY_WEBCHAT_TYPE {
        WEBCHAT_TYPE
    } else {
        code
    }
}

/// URN schemes a channel of this type serves
pub(crate) fn schemes_for(channel_type: &str) -> Vec<String> {
    let scheme = match channel_type {
        "FB" | "FBA" => "facebook",
        "TG" => "telegram",
        "TT" | "TWT" => "twitter",
        "VK" => "vk",
        "VP" => "viber",
        "LN" => "line",
        "WA" | "D3" => "whatsapp",
        "WCH" => "ext",
        "FCM" => "fcm",
        "JC" => "jiochat",
        "WC" => "wechat",
        _ => "tel",
    };
    vec![scheme.to_string()]
}

/// Destination fields for a source channel.
///
/// The type code is modernized, a Facebook secret is copied into the
/// config blob, an empty name falls back to the address, and the throughput
/// quota is always `default_tps`.
pub(crate) fn channel_from_source(source: &SourceChannel, default_tps: i64) -> MigrationResult<NewChannel> {
    let channel_type = current_channel_type(&source.channel_type).to_string();

    let mut config = match source.config.as_deref().map(str::trim) {
        None | Some("") => json!({}),
        Some(raw) => serde_json::from_str::<Value>(raw).map_err(orgmig_common::Error::from)?,
    };
    if !config.is_object() {
        config = json!({});
    }

    if channel_type == FACEBOOK_TYPE {
        if let Some(secret) = source.secret.as_deref().filter(|s| !s.is_empty()) {
            if let Some(map) = config.as_object_mut() {
                map.insert(CONFIG_SECRET.to_string(), Value::String(secret.to_string()));
            }
        }
    }

    let name = source
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| source.address.clone());

    Ok(NewChannel {
        uuid: source.uuid.clone(),
        schemes: schemes_for(&channel_type),
        channel_type,
        name,
        address: source.address.clone(),
        country: source.country.clone(),
        config,
        role: source.role.clone(),
        claim_code: source.claim_code.clone(),
        secret: source.secret.clone(),
        last_seen: source.last_seen.map(|seen| seen.to_rfc3339()),
        device: source.device.clone(),
        os: source.os.clone(),
        alert_email: source.alert_email.clone(),
        bod: source.bod.clone(),
        tps: Some(default_tps),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_channel(channel_type: &str) -> SourceChannel {
        SourceChannel {
            id: 10,
            uuid: "3a1c2f5e-0000-4000-8000-000000000010".to_string(),
            channel_type: channel_type.to_string(),
            name: Some("Main".to_string()),
            address: Some("+250788000001".to_string()),
            country: Some("RW".to_string()),
            config: Some(r#"{"auth_token": "abc"}"#.to_string()),
            role: "SR".to_string(),
            claim_code: None,
            secret: Some("fb-secret".to_string()),
            last_seen: None,
            device: None,
            os: None,
            alert_email: None,
            bod: None,
        }
    }

    #[test]
    fn test_legacy_type_always_rewritten() {
        let mut source = source_channel("WS");
        for config in [None, Some("{}"), Some(r#"{"x": 1}"#)] {
            source.config = config.map(str::to_string);
            source.secret = None;
            let channel = channel_from_source(&source, 10).unwrap();
            assert_eq!(channel.channel_type, "WCH");
            assert_eq!(channel.schemes, vec!["ext".to_string()]);
        }
        assert_eq!(current_channel_type("A"), "A");
    }

    #[test]
    fn test_facebook_secret_folded_into_config() {
        let channel = channel_from_source(&source_channel("FB"), 10).unwrap();
        assert_eq!(channel.config, json!({"auth_token": "abc", "secret": "fb-secret"}));
        assert_eq!(channel.secret.as_deref(), Some("fb-secret"));
        assert_eq!(channel.schemes, vec!["facebook".to_string()]);
    }

    #[test]
    fn test_other_types_keep_config_untouched() {
        let channel = channel_from_source(&source_channel("T"), 10).unwrap();
        assert_eq!(channel.config, json!({"auth_token": "abc"}));
    }

    #[test]
    fn test_tps_is_destination_default() {
        let channel = channel_from_source(&source_channel("A"), 25).unwrap();
        assert_eq!(channel.tps, Some(25));
        assert_eq!(channel.schemes, vec!["tel".to_string()]);
    }

    #[test]
    fn test_empty_name_falls_back_to_address() {
        let mut source = source_channel("A");
        for name in [None, Some("")] {
            source.name = name.map(str::to_string);
            assert_eq!(
                channel_from_source(&source, 10).unwrap().name.as_deref(),
                Some("+250788000001")
            );
        }

        // Whitespace is a name
        source.name = Some("  ".to_string());
        assert_eq!(channel_from_source(&source, 10).unwrap().name.as_deref(), Some("  "));
    }
}
