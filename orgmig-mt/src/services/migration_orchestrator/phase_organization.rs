//! Organization phase: copy scalar settings onto the destination org

use serde_json::{json, Value};

use orgmig_common::db::orgs::{self, OrgSettings};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::MigrationTask;
use crate::services::ProgressLog;
use crate::source::SourceOrg;

impl MigrationOrchestrator {
    pub(super) async fn phase_organization(
        &self,
        task: &MigrationTask,
        source_org: &SourceOrg,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let settings = organization_settings(source_org)?;
        orgs::update_settings(&self.db, task.org_id, &settings).await?;

        log.record("Organization", source_org.id, &source_org.name);
        Ok(1)
    }
}

/// Settings to write onto the destination org.
///
/// The config blob arrives JSON encoded; blank, absent or `null` becomes `{}`.
fn organization_settings(source_org: &SourceOrg) -> MigrationResult<OrgSettings> {
    let config = match source_org.config.as_deref().map(str::trim) {
        None | Some("") => json!({}),
        Some(raw) => match serde_json::from_str::<Value>(raw).map_err(orgmig_common::Error::from)? {
            Value::Null => json!({}),
            value => value,
        },
    };

    Ok(OrgSettings {
        plan: source_org.plan.clone(),
        plan_start: source_org.plan_start.map(|start| start.to_rfc3339()),
        stripe_customer: source_org.stripe_customer.clone(),
        language: source_org.language.clone(),
        timezone: source_org.timezone.clone(),
        date_format: source_org.date_format.clone(),
        config,
        is_anon: source_org.is_anon,
        surveyor_password: source_org.surveyor_password.clone(),
        parent_id: source_org.parent_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_org(config: Option<&str>) -> SourceOrg {
        SourceOrg {
            id: 3,
            name: "Nyaruka".to_string(),
            plan: "topups".to_string(),
            plan_start: None,
            stripe_customer: Some("cus_123".to_string()),
            language: Some("eng".to_string()),
            timezone: "Africa/Kigali".to_string(),
            date_format: "D".to_string(),
            config: config.map(str::to_string),
            is_anon: true,
            surveyor_password: None,
            parent_id: Some(1),
            primary_language_id: None,
        }
    }

    #[test]
    fn test_config_blob_is_decoded() {
        let settings = organization_settings(&source_org(Some(r#"{"SMTP_FROM_EMAIL": "a@b.c"}"#))).unwrap();
        assert_eq!(settings.config, json!({"SMTP_FROM_EMAIL": "a@b.c"}));
        assert_eq!(settings.timezone, "Africa/Kigali");
        assert!(settings.is_anon);
        assert_eq!(settings.parent_id, Some(1));
    }

    #[test]
    fn test_missing_config_becomes_empty_object() {
        for config in [None, Some(""), Some("null")] {
            assert_eq!(organization_settings(&source_org(config)).unwrap().config, json!({}));
        }
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(organization_settings(&source_org(Some("{not json"))).is_err());
    }
}
